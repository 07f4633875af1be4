use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire loss augmentation module.
pub type Result<T> = std::result::Result<T, LossErr>;

/// The loss augmentation module's error type.
#[derive(Debug)]
pub enum LossErr {
    MalformedWeight {
        value: String,
    },
    MalformedPrompt {
        prompt: String,
        reason: &'static str,
    },
    MissingModel(&'static str),
    Unbound {
        name: String,
    },
    SizeMismatch {
        what: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },
    InvalidImage {
        what: &'static str,
        dim: (usize, usize, usize),
    },
}

impl Display for LossErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LossErr::MalformedWeight { value } => {
                format!("The weight {value:?} is neither a disabled sentinel nor a finite number")
            }
            LossErr::MalformedPrompt { prompt, reason } => {
                format!("Failed to parse prompt {prompt:?}: {reason}")
            }
            LossErr::MissingModel(model) => {
                format!("The model session has no {model} model loaded")
            }
            LossErr::Unbound { name } => {
                format!("Tried to enable the loss term {name:?} before binding a target to it")
            }
            LossErr::SizeMismatch {
                what,
                got,
                expected,
            } => format!(
                "There's a size mismatch for {what}, got {}x{} and expected {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            LossErr::InvalidImage { what, dim: (h, w, c) } => format!(
                "The {what} must be a non empty RGB image, got {h}x{w} with {c} channel(s)"
            ),
        };

        write!(f, "{s}")
    }
}

impl Error for LossErr {}
