use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::{
    DimensionMismatchError, InvalidMutationRateError, LayerShape, NetworkShape,
    ParameterMismatchError,
};

/// Initial weights and biases are drawn uniformly from this range.
pub const INITIAL_PARAM_RANGE: std::ops::Range<f64> = -5.0..5.0;

/// Weights and biases of one computational layer.
///
/// `weights` is a row-major `[outputs × inputs]` matrix: row `r` holds the incoming
/// weights of output unit `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl LayerParams {
    #[must_use]
    pub fn new(weights: Vec<f64>, biases: Vec<f64>) -> Self {
        Self { weights, biases }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    fn random<R>(layer: &LayerShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut sample = || rng.random_range(INITIAL_PARAM_RANGE);
        let weights = (0..layer.weight_count()).map(|_| sample()).collect();
        let biases = (0..layer.outputs).map(|_| sample()).collect();
        Self { weights, biases }
    }

    fn perturbed<R>(&self, noise: Normal<f64>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut perturb = |v: &f64| *v + rng.sample(noise);
        Self {
            weights: self.weights.iter().map(&mut perturb).collect(),
            biases: self.biases.iter().map(&mut perturb).collect(),
        }
    }

    /// Computes `W·x + b` into `output`.
    fn affine(&self, input: &[f64], output: &mut Vec<f64>) {
        output.clear();
        output.extend(
            self.weights
                .chunks_exact(input.len())
                .zip(&self.biases)
                .map(|(row, bias)| {
                    row.iter()
                        .zip(input)
                        .map(|(w, x)| w * x)
                        .sum::<f64>()
                        + bias
                }),
        );
    }
}

/// Parameters of every computational layer of a network, in layer order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkParams {
    layers: Vec<LayerParams>,
}

impl NetworkParams {
    #[must_use]
    pub fn new(layers: Vec<LayerParams>) -> Self {
        Self { layers }
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerParams] {
        &self.layers
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.layers
            .iter()
            .flat_map(|l| l.weights.iter().chain(&l.biases).copied())
    }

    fn check(&self, shape: &NetworkShape) -> Result<(), ParameterMismatchError> {
        if self.layers.len() != shape.layers().len() {
            return Err(ParameterMismatchError::LayerCount {
                expected: shape.layers().len(),
                actual: self.layers.len(),
            });
        }
        for (layer, (params, dims)) in self.layers.iter().zip(shape.layers()).enumerate() {
            if params.weights.len() != dims.weight_count() || params.biases.len() != dims.outputs {
                return Err(ParameterMismatchError::LayerSize {
                    layer,
                    expected_weights: dims.weight_count(),
                    actual_weights: params.weights.len(),
                    expected_biases: dims.outputs,
                    actual_biases: params.biases.len(),
                });
            }
        }
        Ok(())
    }
}

/// A feed-forward network: a shape and parameters that always agree with it.
///
/// The parameters are never modified in place. Reproduction goes through
/// [`Network::mutate`], which builds a new parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr", into = "NetworkRepr")]
pub struct Network {
    shape: NetworkShape,
    params: NetworkParams,
}

#[derive(Serialize, Deserialize)]
struct NetworkRepr {
    shape: NetworkShape,
    params: NetworkParams,
}

impl TryFrom<NetworkRepr> for Network {
    type Error = ParameterMismatchError;

    fn try_from(repr: NetworkRepr) -> Result<Self, Self::Error> {
        Self::from_params(repr.shape, repr.params)
    }
}

impl From<Network> for NetworkRepr {
    fn from(network: Network) -> Self {
        Self {
            shape: network.shape,
            params: network.params,
        }
    }
}

impl Network {
    /// Creates a network whose weights and biases are drawn independently from
    /// [`INITIAL_PARAM_RANGE`].
    pub fn random<R>(shape: NetworkShape, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let layers = shape
            .layers()
            .iter()
            .map(|layer| LayerParams::random(layer, rng))
            .collect();
        Self {
            shape,
            params: NetworkParams { layers },
        }
    }

    /// Pairs a shape with previously produced parameters.
    pub fn from_params(
        shape: NetworkShape,
        params: NetworkParams,
    ) -> Result<Self, ParameterMismatchError> {
        params.check(&shape)?;
        Ok(Self { shape, params })
    }

    #[must_use]
    pub fn shape(&self) -> &NetworkShape {
        &self.shape
    }

    #[must_use]
    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Runs the forward pass and returns the activated output of the last layer.
    pub fn outputs(&self, input: &[f64]) -> Result<Vec<f64>, DimensionMismatchError> {
        if input.len() != self.shape.input_width() {
            return Err(DimensionMismatchError {
                expected: self.shape.input_width(),
                actual: input.len(),
            });
        }

        let mut current = input.to_vec();
        let mut next = Vec::new();
        for (params, layer) in self.params.layers.iter().zip(self.shape.layers()) {
            params.affine(&current, &mut next);
            layer.activation.apply_in_place(&mut next);
            std::mem::swap(&mut current, &mut next);
        }
        Ok(current)
    }

    /// Returns the index of the largest output, the lowest index on ties.
    ///
    /// The result is always in `0..shape.output_width()`.
    pub fn evaluate(&self, input: &[f64]) -> Result<usize, DimensionMismatchError> {
        let outputs = self.outputs(input)?;
        Ok(argmax(&outputs))
    }

    /// Returns new parameters where every weight and bias is shifted by independent
    /// noise drawn from `N(0, rate²)`.
    ///
    /// With `rate == 0` the result equals the current parameters.
    pub fn mutate<R>(
        &self,
        rate: f64,
        rng: &mut R,
    ) -> Result<NetworkParams, InvalidMutationRateError>
    where
        R: Rng + ?Sized,
    {
        if !rate.is_finite() || rate < 0.0 {
            return Err(InvalidMutationRateError { rate });
        }
        let noise = Normal::new(0.0, rate).map_err(|_| InvalidMutationRateError { rate })?;
        let layers = self
            .params
            .layers
            .iter()
            .map(|layer| layer.perturbed(noise, rng))
            .collect();
        Ok(NetworkParams { layers })
    }

    /// Builds a sibling network from [`Network::mutate`]'s output.
    pub fn mutated<R>(&self, rate: f64, rng: &mut R) -> Result<Self, InvalidMutationRateError>
    where
        R: Rng + ?Sized,
    {
        let params = self.mutate(rate, rng)?;
        Ok(Self {
            shape: self.shape.clone(),
            params,
        })
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{ActivationKind, LayerSpec};

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(0x5eed)
    }

    fn shape(s: &str) -> NetworkShape {
        s.parse().unwrap()
    }

    #[test]
    fn test_random_parameters_fit_shape_and_range() {
        let network = Network::random(shape("4,8:relu,2:sign"), &mut rng());
        let layers = network.params().layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].weights().len(), 32);
        assert_eq!(layers[0].biases().len(), 8);
        assert_eq!(layers[1].weights().len(), 16);
        assert_eq!(layers[1].biases().len(), 2);
        assert!(
            network
                .params()
                .values()
                .all(|v| INITIAL_PARAM_RANGE.contains(&v))
        );
    }

    #[test]
    fn test_forward_pass_by_hand() {
        // 2 inputs -> 2 relu -> 3 relu
        let shape = NetworkShape::new([
            LayerSpec::input(2),
            LayerSpec::layer(2, ActivationKind::Relu),
            LayerSpec::layer(3, ActivationKind::Relu),
        ])
        .unwrap();
        let params = NetworkParams::new(vec![
            LayerParams::new(vec![1.0, 2.0, -1.0, -1.0], vec![0.5, 0.0]),
            LayerParams::new(vec![1.0, 0.0, 0.0, 1.0, 2.0, 0.0], vec![0.0, 0.0, -1.0]),
        ]);
        let network = Network::from_params(shape, params).unwrap();

        // hidden = relu([1 + 4 + 0.5, -1 - 2]) = [5.5, 0]
        // output = relu([5.5, 0, 11 - 1]) = [5.5, 0, 10]
        assert_eq!(network.outputs(&[1.0, 2.0]).unwrap(), vec![5.5, 0.0, 10.0]);
        assert_eq!(network.evaluate(&[1.0, 2.0]).unwrap(), 2);
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[-1.0, 1.0, 1.0]), 1);
        assert_eq!(argmax(&[3.0]), 0);
    }

    #[test]
    fn test_all_zero_outputs_choose_first_action() {
        // unit activation with all-negative pre-activations yields [0, 0, 0]
        let shape = shape("1,3:unit");
        let params = NetworkParams::new(vec![LayerParams::new(
            vec![0.0, 0.0, 0.0],
            vec![-1.0, -2.0, -3.0],
        )]);
        let network = Network::from_params(shape, params).unwrap();
        assert_eq!(network.outputs(&[7.0]).unwrap(), vec![0.0, 0.0, 0.0]);
        assert_eq!(network.evaluate(&[7.0]).unwrap(), 0);
    }

    #[test]
    fn test_evaluate_stays_in_range() {
        let mut rng = rng();
        for s in ["4,8:relu,2:sign", "3,5:unit", "2,4:sign,4:relu,6:relu"] {
            let network = Network::random(shape(s), &mut rng);
            let width = network.shape().input_width();
            for _ in 0..50 {
                let input = (0..width)
                    .map(|_| rng.random_range(-3.0..3.0))
                    .collect::<Vec<_>>();
                let action = network.evaluate(&input).unwrap();
                assert!(action < network.shape().output_width());
            }
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let network = Network::random(shape("4,8:relu,2:sign"), &mut rng());
        let err = network.evaluate(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            DimensionMismatchError {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_mutate_with_zero_rate_is_identity() {
        let network = Network::random(shape("4,8:relu,2:sign"), &mut rng());
        let params = network.mutate(0.0, &mut rng()).unwrap();
        assert_eq!(&params, network.params());
    }

    #[test]
    fn test_mutate_does_not_touch_parent() {
        let network = Network::random(shape("4,8:relu,2:sign"), &mut rng());
        let before = network.clone();
        let params = network.mutate(0.5, &mut rng()).unwrap();
        assert_eq!(network, before);
        assert_ne!(&params, network.params());
        assert_eq!(params.values().count(), network.shape().parameter_count());
    }

    #[test]
    fn test_mutate_rejects_bad_rate() {
        let network = Network::random(shape("4,2:relu"), &mut rng());
        assert!(network.mutate(-0.1, &mut rng()).is_err());
        assert!(network.mutate(f64::NAN, &mut rng()).is_err());
    }

    #[test]
    fn test_from_params_checks_sizes() {
        let shape = shape("2,1:relu");
        let err = Network::from_params(shape.clone(), NetworkParams::default()).unwrap_err();
        assert_eq!(
            err,
            ParameterMismatchError::LayerCount {
                expected: 1,
                actual: 0
            }
        );

        let params = NetworkParams::new(vec![LayerParams::new(vec![1.0], vec![0.0])]);
        let err = Network::from_params(shape, params).unwrap_err();
        assert_eq!(
            err,
            ParameterMismatchError::LayerSize {
                layer: 0,
                expected_weights: 2,
                actual_weights: 1,
                expected_biases: 1,
                actual_biases: 1,
            }
        );
    }

    #[test]
    fn test_serde_roundtrip_keeps_behavior() {
        let network = Network::random(shape("4,8:relu,2:sign"), &mut rng());
        let json = serde_json::to_string(&network).unwrap();
        let restored: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, network);
    }

    #[test]
    fn test_deserialize_rejects_mismatched_params() {
        let json = r#"{"shape":[{"width":2},{"width":1,"activation":"relu"}],
                       "params":[{"weights":[1.0],"biases":[0.0]}]}"#;
        assert!(serde_json::from_str::<Network>(json).is_err());
    }
}
