use std::{fs, path::Path};

use loss_aug::{Weight, WeightSpec};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

pub const DIRECT_INIT_WEIGHT: &str = "direct_init_weight";
pub const SEMANTIC_INIT_WEIGHT: &str = "semantic_init_weight";
pub const DIRECT_STABILIZATION_WEIGHT: &str = "direct_stabilization_weight";
pub const DEPTH_STABILIZATION_WEIGHT: &str = "depth_stabilization_weight";
pub const EDGE_STABILIZATION_WEIGHT: &str = "edge_stabilization_weight";
pub const FLOW_STABILIZATION_WEIGHT: &str = "flow_stabilization_weight";

/// Offsets past `-2^62` don't fit in a frame offset.
pub const MAX_FLOW_LONG_TERM_SAMPLES: usize = 62;

/// Every weight key, in the order they are validated.
pub const WEIGHT_KEYS: [&str; 6] = [
    DIRECT_INIT_WEIGHT,
    SEMANTIC_INIT_WEIGHT,
    DIRECT_STABILIZATION_WEIGHT,
    DEPTH_STABILIZATION_WEIGHT,
    EDGE_STABILIZATION_WEIGHT,
    FLOW_STABILIZATION_WEIGHT,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationMode {
    #[default]
    #[serde(rename = "off", alias = "none")]
    Off,
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
    #[serde(rename = "Video Source")]
    VideoSource,
}

/// The parameters of a single run that decide which losses take part in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParameters {
    pub init_image: String,
    pub restore: bool,
    #[serde(with = "weight_spec")]
    pub direct_init_weight: WeightSpec,
    #[serde(with = "weight_spec")]
    pub semantic_init_weight: WeightSpec,
    #[serde(with = "weight_spec")]
    pub direct_stabilization_weight: WeightSpec,
    #[serde(with = "weight_spec")]
    pub depth_stabilization_weight: WeightSpec,
    #[serde(with = "weight_spec")]
    pub edge_stabilization_weight: WeightSpec,
    #[serde(with = "weight_spec")]
    pub flow_stabilization_weight: WeightSpec,
    pub smoothing_weight: f32,
    pub animation_mode: AnimationMode,
    pub flow_long_term_samples: usize,
    pub width: usize,
    pub height: usize,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            init_image: String::new(),
            restore: false,
            direct_init_weight: WeightSpec::default(),
            semantic_init_weight: WeightSpec::default(),
            direct_stabilization_weight: WeightSpec::default(),
            depth_stabilization_weight: WeightSpec::default(),
            edge_stabilization_weight: WeightSpec::default(),
            flow_stabilization_weight: WeightSpec::default(),
            smoothing_weight: 0.0,
            animation_mode: AnimationMode::Off,
            flow_long_term_samples: 0,
            width: 180,
            height: 112,
        }
    }
}

impl RunParameters {
    /// Parses the parameters from a JSON document, missing fields take their defaults.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidConfig` if the document is not valid JSON or a field has the
    /// wrong type.
    pub fn from_json(json: &str) -> Result<Self, OrchestratorError> {
        serde_json::from_str(json)
            .map_err(|e| OrchestratorError::InvalidConfig(format!("invalid JSON: {e}")))
    }

    /// Reads and parses the parameters from a JSON file.
    ///
    /// # Errors
    /// `OrchestratorError::Io` if the file can't be read, otherwise as `from_json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OrchestratorError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Looks up a weight by its key.
    pub fn weight(&self, key: &str) -> Option<&WeightSpec> {
        let weight = match key {
            DIRECT_INIT_WEIGHT => &self.direct_init_weight,
            SEMANTIC_INIT_WEIGHT => &self.semantic_init_weight,
            DIRECT_STABILIZATION_WEIGHT => &self.direct_stabilization_weight,
            DEPTH_STABILIZATION_WEIGHT => &self.depth_stabilization_weight,
            EDGE_STABILIZATION_WEIGHT => &self.edge_stabilization_weight,
            FLOW_STABILIZATION_WEIGHT => &self.flow_stabilization_weight,
            _ => return None,
        };

        Some(weight)
    }

    /// Looks up a weight that must exist.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidConfig` if there's no weight named `key`.
    pub(crate) fn required_weight(&self, key: &str) -> Result<&WeightSpec, OrchestratorError> {
        self.weight(key)
            .ok_or_else(|| OrchestratorError::InvalidConfig(format!("unknown weight key {key}")))
    }

    /// Checks every weight up front so a bad configuration fails before anything is touched.
    ///
    /// # Errors
    /// `OrchestratorError::MalformedWeight` naming the first offending key, or
    /// `OrchestratorError::InvalidConfig` for too many long term samples or a non finite
    /// smoothing weight.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        for key in WEIGHT_KEYS {
            resolve_weight(key, self.required_weight(key)?)?;
        }

        self.check_flow_long_term_samples()?;

        if !self.smoothing_weight.is_finite() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "smoothing_weight must be finite, got {}",
                self.smoothing_weight
            )));
        }

        Ok(())
    }

    /// # Errors
    /// `OrchestratorError::InvalidConfig` if there are more than `MAX_FLOW_LONG_TERM_SAMPLES`
    /// long term samples.
    pub(crate) fn check_flow_long_term_samples(&self) -> Result<(), OrchestratorError> {
        if self.flow_long_term_samples > MAX_FLOW_LONG_TERM_SAMPLES {
            return Err(OrchestratorError::InvalidConfig(format!(
                "flow_long_term_samples must be at most {MAX_FLOW_LONG_TERM_SAMPLES}, got {}",
                self.flow_long_term_samples
            )));
        }

        Ok(())
    }
}

/// Resolves `weight`, attributing failures to `key`.
pub(crate) fn resolve_weight(key: &str, weight: &WeightSpec) -> Result<Weight, OrchestratorError> {
    weight
        .resolve()
        .map_err(|_| OrchestratorError::MalformedWeight {
            key: key.to_string(),
            value: weight.to_string(),
        })
}

/// Weights are written either as text or as plain JSON numbers, only text can be a disabled
/// sentinel.
mod weight_spec {
    use loss_aug::WeightSpec;
    use serde::{Deserialize, Deserializer, Serializer, ser::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn serialize<S: Serializer>(weight: &WeightSpec, serializer: S) -> Result<S::Ok, S::Error> {
        if !weight.is_numeric() {
            return serializer.serialize_str(weight.as_str());
        }

        let value: f64 = weight
            .as_str()
            .parse()
            .map_err(|_| S::Error::custom(format!("numeric weight {weight:?} is not a number")))?;
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<WeightSpec, D::Error> {
        let weight = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => WeightSpec::new(text),
            Raw::Int(n) => WeightSpec::numeric(n.to_string()),
            Raw::Float(x) => WeightSpec::numeric(x.to_string()),
        };

        Ok(weight)
    }
}
