use serde::{Deserialize, Serialize};

/// Element-wise activation applied to the output of a layer.
///
/// All three kinds are step-like at zero; nothing here is ever differentiated.
///
/// Parsing is case-insensitive:
///
/// ```
/// use evonet_network::ActivationKind;
///
/// assert_eq!("relu".parse::<ActivationKind>().unwrap(), ActivationKind::Relu);
/// assert_eq!("Sign".parse::<ActivationKind>().unwrap(), ActivationKind::Sign);
/// assert!("tanh".parse::<ActivationKind>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    derive_more::FromStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    /// `1` for positive inputs, `0` otherwise.
    #[display("unit")]
    Unit,
    /// `1` for positive inputs, `-1` otherwise.
    #[display("sign")]
    Sign,
    /// The input itself when positive, `0` otherwise.
    #[display("relu")]
    Relu,
}

impl ActivationKind {
    pub const ALL: [Self; 3] = [Self::Unit, Self::Sign, Self::Relu];

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        let positive = x > 0.0;
        match self {
            Self::Unit => {
                if positive {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Sign => {
                if positive {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Relu => {
                if positive {
                    x
                } else {
                    0.0
                }
            }
        }
    }

    pub fn apply_in_place(self, values: &mut [f64]) {
        for v in values {
            *v = self.apply(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu() {
        assert_eq!(ActivationKind::Relu.apply(-1.0), 0.0);
        assert_eq!(ActivationKind::Relu.apply(0.0), 0.0);
        assert_eq!(ActivationKind::Relu.apply(2.0), 2.0);
    }

    #[test]
    fn test_unit() {
        assert_eq!(ActivationKind::Unit.apply(-1.0), 0.0);
        assert_eq!(ActivationKind::Unit.apply(0.0), 0.0);
        assert_eq!(ActivationKind::Unit.apply(1.0), 1.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(ActivationKind::Sign.apply(-0.5), -1.0);
        assert_eq!(ActivationKind::Sign.apply(0.0), -1.0);
        assert_eq!(ActivationKind::Sign.apply(0.5), 1.0);
    }

    #[test]
    fn test_apply_in_place() {
        let mut values = [-2.0, 0.0, 3.5];
        ActivationKind::Relu.apply_in_place(&mut values);
        assert_eq!(values, [0.0, 0.0, 3.5]);
    }

    #[test]
    fn test_display_parses_back() {
        for kind in ActivationKind::ALL {
            assert_eq!(kind.to_string().parse::<ActivationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ActivationKind::Relu).unwrap();
        assert_eq!(json, "\"relu\"");
        let kind: ActivationKind = serde_json::from_str("\"unit\"").unwrap();
        assert_eq!(kind, ActivationKind::Unit);
    }
}
