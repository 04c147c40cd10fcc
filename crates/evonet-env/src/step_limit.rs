use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Maximum number of steps an episode may take before it is cut off.
///
/// On the command line and in serialized form the limit is an integer, where `-1`
/// means "run until the environment reports done":
///
/// ```
/// use evonet_env::StepLimit;
///
/// assert_eq!("5000".parse::<StepLimit>().unwrap(), StepLimit::Limited(5000));
/// assert_eq!("-1".parse::<StepLimit>().unwrap(), StepLimit::Unbounded);
/// assert!("0".parse::<StepLimit>().is_err());
/// assert_eq!(StepLimit::Unbounded.to_string(), "-1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum StepLimit {
    Limited(usize),
    Unbounded,
}

pub const DEFAULT_STEP_LIMIT: StepLimit = StepLimit::Limited(5000);

impl Default for StepLimit {
    fn default() -> Self {
        DEFAULT_STEP_LIMIT
    }
}

impl StepLimit {
    /// Returns whether another step may be taken after `steps_taken` steps.
    #[must_use]
    pub fn allows(self, steps_taken: usize) -> bool {
        match self {
            Self::Limited(limit) => steps_taken < limit,
            Self::Unbounded => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid step limit {text:?}: expected a positive integer or -1")]
pub struct InvalidStepLimitError {
    pub text: String,
}

impl TryFrom<i64> for StepLimit {
    type Error = InvalidStepLimitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unbounded),
            1.. => usize::try_from(value)
                .map(Self::Limited)
                .map_err(|_| InvalidStepLimitError {
                    text: value.to_string(),
                }),
            _ => Err(InvalidStepLimitError {
                text: value.to_string(),
            }),
        }
    }
}

impl From<StepLimit> for i64 {
    fn from(limit: StepLimit) -> Self {
        match limit {
            StepLimit::Limited(n) => i64::try_from(n).unwrap_or(i64::MAX),
            StepLimit::Unbounded => -1,
        }
    }
}

impl FromStr for StepLimit {
    type Err = InvalidStepLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i64>().map_err(|_| InvalidStepLimitError {
            text: s.to_owned(),
        })?;
        Self::try_from(value).map_err(|_| InvalidStepLimitError { text: s.to_owned() })
    }
}

impl fmt::Display for StepLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}
