use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ActivationKind, InvalidShapeError};

/// One level of a network shape as written by the user.
///
/// The input level has no activation; every following level must have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub width: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationKind>,
}

impl LayerSpec {
    #[must_use]
    pub const fn input(width: usize) -> Self {
        Self {
            width,
            activation: None,
        }
    }

    #[must_use]
    pub const fn layer(width: usize, activation: ActivationKind) -> Self {
        Self {
            width,
            activation: Some(activation),
        }
    }
}

/// A computational layer of a validated shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerShape {
    /// Number of values this layer consumes (the width of the previous level).
    pub inputs: usize,
    /// Number of values this layer produces.
    pub outputs: usize,
    pub activation: ActivationKind,
}

impl LayerShape {
    #[must_use]
    pub const fn weight_count(&self) -> usize {
        self.inputs * self.outputs
    }
}

/// Validated network topology.
///
/// A shape always has an input level followed by at least one computational layer,
/// and every level has a positive width. Shapes can be parsed from a compact string
/// where the first entry is the bare input width and every following entry is
/// `width:activation`:
///
/// ```
/// use evonet_network::{ActivationKind, NetworkShape};
///
/// let shape: NetworkShape = "4,8:relu,2:sign".parse().unwrap();
/// assert_eq!(shape.input_width(), 4);
/// assert_eq!(shape.output_width(), 2);
/// assert_eq!(shape.layers()[0].activation, ActivationKind::Relu);
/// assert_eq!(shape.to_string(), "4,8:relu,2:sign");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LayerSpec>", into = "Vec<LayerSpec>")]
pub struct NetworkShape {
    input_width: usize,
    layers: Vec<LayerShape>,
}

impl NetworkShape {
    pub fn new<I>(levels: I) -> Result<Self, InvalidShapeError>
    where
        I: IntoIterator<Item = LayerSpec>,
    {
        let levels = levels.into_iter().collect::<Vec<_>>();
        if levels.len() < 2 {
            return Err(InvalidShapeError::TooFewLevels {
                levels: levels.len(),
            });
        }
        if let Some(level) = levels.iter().position(|l| l.width == 0) {
            return Err(InvalidShapeError::ZeroWidth { level });
        }

        let input = levels[0];
        if input.activation.is_some() {
            return Err(InvalidShapeError::UnexpectedActivation);
        }

        let mut layers = Vec::with_capacity(levels.len() - 1);
        let mut inputs = input.width;
        for (level, spec) in levels.iter().enumerate().skip(1) {
            let activation = spec
                .activation
                .ok_or(InvalidShapeError::MissingActivation { level })?;
            layers.push(LayerShape {
                inputs,
                outputs: spec.width,
                activation,
            });
            inputs = spec.width;
        }

        Ok(Self {
            input_width: input.width,
            layers,
        })
    }

    #[must_use]
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Width of the last layer, which is also the number of distinct actions.
    #[must_use]
    pub fn output_width(&self) -> usize {
        // `new` guarantees at least one layer
        self.layers.last().map_or(self.input_width, |l| l.outputs)
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerShape] {
        &self.layers
    }

    /// Total number of weights and biases a network of this shape carries.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weight_count() + l.outputs)
            .sum()
    }

    pub fn levels(&self) -> impl Iterator<Item = LayerSpec> + '_ {
        let input = LayerSpec::input(self.input_width);
        let layers = self
            .layers
            .iter()
            .map(|l| LayerSpec::layer(l.outputs, l.activation));
        std::iter::once(input).chain(layers)
    }
}

impl TryFrom<Vec<LayerSpec>> for NetworkShape {
    type Error = InvalidShapeError;

    fn try_from(levels: Vec<LayerSpec>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<NetworkShape> for Vec<LayerSpec> {
    fn from(shape: NetworkShape) -> Self {
        shape.levels().collect()
    }
}

impl FromStr for NetworkShape {
    type Err = InvalidShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let levels = s
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(level, item)| parse_level(level, item))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(levels)
    }
}

fn parse_level(level: usize, item: &str) -> Result<LayerSpec, InvalidShapeError> {
    let (width, activation) = match item.split_once(':') {
        Some((width, activation)) => (width.trim(), Some(activation.trim())),
        None => (item, None),
    };
    let width = width
        .parse::<usize>()
        .map_err(|_| InvalidShapeError::InvalidWidth {
            level,
            text: width.to_owned(),
        })?;
    let activation = activation
        .map(|name| {
            name.parse::<ActivationKind>()
                .map_err(|_| InvalidShapeError::UnknownActivation {
                    name: name.to_owned(),
                })
        })
        .transpose()?;
    Ok(LayerSpec { width, activation })
}

impl fmt::Display for NetworkShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.input_width)?;
        for layer in &self.layers {
            write!(f, ",{}:{}", layer.outputs, layer.activation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_pole_levels() -> Vec<LayerSpec> {
        vec![
            LayerSpec::input(4),
            LayerSpec::layer(8, ActivationKind::Relu),
            LayerSpec::layer(2, ActivationKind::Sign),
        ]
    }

    #[test]
    fn test_layers_chain_widths() {
        let shape = NetworkShape::new(cart_pole_levels()).unwrap();
        let layers = shape.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!((layers[0].inputs, layers[0].outputs), (4, 8));
        assert_eq!((layers[1].inputs, layers[1].outputs), (8, 2));
        assert_eq!(shape.parameter_count(), 4 * 8 + 8 + 8 * 2 + 2);
    }

    #[test]
    fn test_rejects_single_level() {
        let err = NetworkShape::new([LayerSpec::input(4)]).unwrap_err();
        assert_eq!(err, InvalidShapeError::TooFewLevels { levels: 1 });
    }

    #[test]
    fn test_rejects_zero_width() {
        let mut levels = cart_pole_levels();
        levels[1].width = 0;
        let err = NetworkShape::new(levels).unwrap_err();
        assert_eq!(err, InvalidShapeError::ZeroWidth { level: 1 });
    }

    #[test]
    fn test_rejects_missing_activation() {
        let mut levels = cart_pole_levels();
        levels[2].activation = None;
        let err = NetworkShape::new(levels).unwrap_err();
        assert_eq!(err, InvalidShapeError::MissingActivation { level: 2 });
    }

    #[test]
    fn test_rejects_activation_on_input() {
        let mut levels = cart_pole_levels();
        levels[0].activation = Some(ActivationKind::Unit);
        let err = NetworkShape::new(levels).unwrap_err();
        assert_eq!(err, InvalidShapeError::UnexpectedActivation);
    }

    #[test]
    fn test_parse() {
        let shape: NetworkShape = " 4, 8:relu ,2:SIGN".parse().unwrap();
        assert_eq!(shape, NetworkShape::new(cart_pole_levels()).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "4,8:tanh".parse::<NetworkShape>().unwrap_err(),
            InvalidShapeError::UnknownActivation {
                name: "tanh".to_owned()
            }
        );
        assert_eq!(
            "4,-8:relu".parse::<NetworkShape>().unwrap_err(),
            InvalidShapeError::InvalidWidth {
                level: 1,
                text: "-8".to_owned()
            }
        );
        assert_eq!(
            "4,0:relu".parse::<NetworkShape>().unwrap_err(),
            InvalidShapeError::ZeroWidth { level: 1 }
        );
        assert_eq!(
            "4".parse::<NetworkShape>().unwrap_err(),
            InvalidShapeError::TooFewLevels { levels: 1 }
        );
    }

    #[test]
    fn test_serde_format() {
        let shape = NetworkShape::new(cart_pole_levels()).unwrap();
        let json = serde_json::to_string(&shape).unwrap();
        assert_eq!(
            json,
            r#"[{"width":4},{"width":8,"activation":"relu"},{"width":2,"activation":"sign"}]"#
        );
        let parsed: NetworkShape = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, shape);
    }

    #[test]
    fn test_deserialize_validates() {
        let result = serde_json::from_str::<NetworkShape>(r#"[{"width":4}]"#);
        assert!(result.is_err());
    }
}
