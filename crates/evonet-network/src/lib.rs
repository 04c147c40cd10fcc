//! Fixed-topology feed-forward networks evolved by the training crate.
//!
//! A network is described by a [`NetworkShape`]: an input width followed by one or
//! more computational layers, each with a width and an [`ActivationKind`]. The
//! parameters of every layer (a weight matrix and a bias vector) live in
//! [`NetworkParams`], and a [`Network`] pairs the two.
//!
//! Networks are never trained by gradients. They only change through
//! [`Network::mutate`], which returns a fresh set of parameters perturbed by
//! Gaussian noise and leaves the original untouched.
//!
//! # Example
//!
//! ```
//! use evonet_network::{Network, NetworkShape};
//! use rand::SeedableRng as _;
//!
//! let shape: NetworkShape = "4,8:relu,2:sign".parse().unwrap();
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(42);
//! let network = Network::random(shape, &mut rng);
//!
//! let action = network.evaluate(&[0.0, 0.1, -0.02, 0.3]).unwrap();
//! assert!(action < 2);
//! ```

pub use self::{activation::*, network::*, shape::*};

mod activation;
mod network;
mod shape;

/// The input vector handed to a network does not match its input width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("input has {actual} values but the network expects {expected}")]
pub struct DimensionMismatchError {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidShapeError {
    #[display("network shape needs an input level and at least one layer, got {levels} level(s)")]
    TooFewLevels { levels: usize },
    #[display("level {level} has zero width")]
    ZeroWidth { level: usize },
    #[display("level {level} has an invalid width: {text:?}")]
    InvalidWidth { level: usize, text: String },
    #[display("unknown activation kind: {name:?}")]
    UnknownActivation { name: String },
    #[display("layer {level} has no activation kind")]
    MissingActivation { level: usize },
    #[display("the input level cannot carry an activation kind")]
    UnexpectedActivation,
}

/// Persisted parameters do not fit the network shape they are paired with.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParameterMismatchError {
    #[display("expected parameters for {expected} layer(s), got {actual}")]
    LayerCount { expected: usize, actual: usize },
    #[display(
        "layer {layer}: expected {expected_weights} weights and {expected_biases} biases, \
         got {actual_weights} and {actual_biases}"
    )]
    LayerSize {
        layer: usize,
        expected_weights: usize,
        actual_weights: usize,
        expected_biases: usize,
        actual_biases: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("mutation rate must be finite and non-negative, got {rate}")]
pub struct InvalidMutationRateError {
    pub rate: f64,
}
