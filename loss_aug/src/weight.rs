use std::fmt::{self, Display};

use crate::error::{LossErr, Result};

/// A weight as it was written in the run configuration.
///
/// The raw text is kept because it is embedded verbatim in loss term names. The texts `""` and
/// `"0"` are the disabled sentinels, a weight that was written as a number never is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightSpec {
    raw: String,
    numeric: bool,
}

/// A resolved weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weight {
    Disabled,
    Numeric(f32),
}

impl WeightSpec {
    /// Creates a new `WeightSpec` from its raw text.
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self {
            raw: raw.into(),
            numeric: false,
        }
    }

    /// Creates a `WeightSpec` for a weight that was written as a number, `raw` being its text.
    ///
    /// Such a weight is never a disabled sentinel, a numeric zero resolves to zero.
    pub fn numeric<S: Into<String>>(raw: S) -> Self {
        Self {
            raw: raw.into(),
            numeric: true,
        }
    }

    /// The disabled `"0"` weight.
    pub fn zero() -> Self {
        Self::new("0")
    }

    /// Returns the raw text of this weight.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if this weight was written as a number rather than as text.
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// Returns `true` if this weight is unset, that is, the empty string.
    pub fn is_unset(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns `true` if this weight is one of the disabled sentinels.
    pub fn is_disabled(&self) -> bool {
        !self.numeric && matches!(self.raw.as_str(), "" | "0")
    }

    /// Resolves the raw text into a `Weight`.
    ///
    /// # Errors
    /// `LossErr::MalformedWeight` if the text is neither a sentinel nor a finite float.
    pub fn resolve(&self) -> Result<Weight> {
        if self.is_disabled() {
            return Ok(Weight::Disabled);
        }

        match self.raw.trim().parse::<f32>() {
            Ok(w) if w.is_finite() => Ok(Weight::Numeric(w)),
            _ => Err(LossErr::MalformedWeight {
                value: self.raw.clone(),
            }),
        }
    }
}

impl Weight {
    /// The numeric value of this weight, zero when disabled.
    pub fn value(self) -> f32 {
        match self {
            Weight::Disabled => 0.0,
            Weight::Numeric(w) => w,
        }
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, Weight::Disabled)
    }
}

impl Display for WeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for WeightSpec {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WeightSpec {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve_to_disabled() {
        assert_eq!(WeightSpec::new("").resolve().unwrap(), Weight::Disabled);
        assert_eq!(WeightSpec::zero().resolve().unwrap(), Weight::Disabled);
    }

    #[test]
    fn only_the_exact_zero_text_is_a_sentinel() {
        let weight = WeightSpec::new("0.0");
        assert!(!weight.is_disabled());
        assert_eq!(weight.resolve().unwrap(), Weight::Numeric(0.0));
    }

    #[test]
    fn numeric_zero_is_not_a_sentinel() {
        let weight = WeightSpec::numeric("0");
        assert!(!weight.is_disabled());
        assert_eq!(weight.as_str(), "0");
        assert_eq!(weight.resolve().unwrap(), Weight::Numeric(0.0));
    }

    #[test]
    fn numbers_resolve_to_numeric() {
        assert_eq!(WeightSpec::new("1.5").resolve().unwrap(), Weight::Numeric(1.5));
        assert_eq!(WeightSpec::new(" -2 ").resolve().unwrap(), Weight::Numeric(-2.0));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = WeightSpec::new("heavy").resolve().unwrap_err();
        assert!(matches!(err, LossErr::MalformedWeight { value } if value == "heavy"));
    }

    #[test]
    fn non_finite_weights_are_malformed() {
        for raw in ["NaN", "inf", "-inf", "1e39"] {
            let err = WeightSpec::new(raw).resolve().unwrap_err();
            assert!(matches!(err, LossErr::MalformedWeight { .. }), "{raw}");
        }
    }
}
