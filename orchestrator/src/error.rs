use std::fmt;

use loss_aug::LossErr;

/// All errors that can occur while orchestrating losses.
#[derive(Debug)]
pub enum OrchestratorError {
    /// The weight name's prefix has no registered loss variant.
    UnregisteredVariant { weight_name: String, prefix: String },
    /// The weight name has no `<kind>_` prefix.
    InvalidWeightName(String),
    /// A weight is neither a disabled sentinel nor a number.
    MalformedWeight { key: String, value: String },
    /// Invalid configuration, caught before any loss is built.
    InvalidConfig(String),
    /// Building or binding a loss term failed.
    Loss(LossErr),
    /// An underlying I/O error not covered by the above variants.
    Io(std::io::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnregisteredVariant {
                weight_name,
                prefix,
            } => write!(
                f,
                "no loss variant registered for {prefix:?} (from {weight_name:?})"
            ),
            Self::InvalidWeightName(name) => {
                write!(f, "invalid weight name {name:?}: expected <kind>_<rest>")
            }
            Self::MalformedWeight { key, value } => {
                write!(f, "malformed weight for {key}: {value:?} is not a finite number")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Loss(e) => write!(f, "loss error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Loss(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LossErr> for OrchestratorError {
    fn from(e: LossErr) -> Self {
        Self::Loss(e)
    }
}

impl From<std::io::Error> for OrchestratorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
