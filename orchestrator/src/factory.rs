use std::collections::HashMap;

use log::debug;
use loss_aug::{Image, LossKind, LossTerm, ModelSession, RgbImage, WeightSpec};

use crate::{configs::resolve_weight, error::OrchestratorError};

/// The prefix that selects the image's own preferred reconstruction loss.
const DIRECT: &str = "direct";

/// Maps weight name prefixes to loss variants.
#[derive(Debug, Clone)]
pub struct LossRegistry {
    variants: HashMap<String, LossKind>,
}

impl Default for LossRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("edge", LossKind::Edge);
        registry.register("depth", LossKind::Depth);
        registry
    }
}

impl LossRegistry {
    /// Creates a registry with no variants, not even the default ones.
    pub fn empty() -> Self {
        Self {
            variants: HashMap::new(),
        }
    }

    /// Registers `kind` under `prefix`, replacing any previous registration.
    pub fn register<S: Into<String>>(&mut self, prefix: S, kind: LossKind) {
        self.variants.insert(prefix.into(), kind);
    }

    pub fn lookup(&self, prefix: &str) -> Option<LossKind> {
        self.variants.get(prefix).copied()
    }
}

/// Builds `LossTerm`s out of weight names.
#[derive(Clone, Default)]
pub struct LossFactory {
    registry: LossRegistry,
    session: ModelSession,
}

impl LossFactory {
    /// Creates a factory with the default registry.
    ///
    /// # Arguments
    /// * `session` - The models handed to the variants that need one.
    pub fn new(session: ModelSession) -> Self {
        Self::with_registry(session, LossRegistry::default())
    }

    pub fn with_registry(session: ModelSession, registry: LossRegistry) -> Self {
        Self { registry, session }
    }

    pub fn session(&self) -> &ModelSession {
        &self.session
    }

    pub fn registry(&self) -> &LossRegistry {
        &self.registry
    }

    /// Resolves the loss variant selected by a `<kind>_<rest>` weight name.
    ///
    /// # Returns
    /// The `<kind>` prefix and its variant.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidWeightName` if there's no `_` in the name and
    /// `OrchestratorError::UnregisteredVariant` if the prefix is unknown.
    pub fn resolve_kind<'n, I>(
        &self,
        weight_name: &'n str,
        image: &I,
    ) -> Result<(&'n str, LossKind), OrchestratorError>
    where
        I: Image + ?Sized,
    {
        let (prefix, _) = weight_name
            .split_once('_')
            .ok_or_else(|| OrchestratorError::InvalidWeightName(weight_name.to_string()))?;

        if prefix == DIRECT {
            return Ok((prefix, image.preferred_loss()));
        }

        let kind =
            self.registry
                .lookup(prefix)
                .ok_or_else(|| OrchestratorError::UnregisteredVariant {
                    weight_name: weight_name.to_string(),
                    prefix: prefix.to_string(),
                })?;

        Ok((prefix, kind))
    }

    /// Builds the term a weight name describes.
    ///
    /// The term is named `"<kind> <context_name>:<weight>"` and is enabled only if there's a
    /// target and the weight isn't a disabled sentinel.
    ///
    /// # Arguments
    /// * `weight_name` - A `<kind>_<rest>` name, `<kind>` selects the variant.
    /// * `weight` - The weight as configured.
    /// * `context_name` - What the term is for, shows up in its name.
    /// * `image` - The image being optimized, gives the shape and the preferred loss.
    /// * `target` - The image to compare against, if already known.
    ///
    /// # Errors
    /// See `resolve_kind`, plus `OrchestratorError::MalformedWeight` for an unparseable
    /// weight and `OrchestratorError::Loss` if the variant can't be instantiated.
    pub fn build_loss<I>(
        &self,
        weight_name: &str,
        weight: &WeightSpec,
        context_name: &str,
        image: &I,
        target: Option<&RgbImage>,
    ) -> Result<LossTerm, OrchestratorError>
    where
        I: Image + ?Sized,
    {
        let (prefix, kind) = self.resolve_kind(weight_name, image)?;
        let resolved = resolve_weight(weight_name, weight)?;

        let name = format!("{prefix} {context_name}:{weight}");
        let mut term = kind.target_image(
            name,
            resolved.value(),
            image.image_shape(),
            target,
            &self.session,
        )?;
        term.set_enabled(target.is_some() && !resolved.is_disabled())?;

        debug!(
            "built {:?} term {:?} (enabled: {})",
            kind,
            term.name(),
            term.is_enabled()
        );
        Ok(term)
    }
}

#[cfg(test)]
mod tests {
    use loss_aug::{CHANNELS, PixelImage, TermState};
    use ndarray::Array3;

    use super::*;

    fn target() -> RgbImage {
        Array3::from_elem((4, 4, CHANNELS), 0.5)
    }

    #[test]
    fn direct_uses_the_preferred_loss() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let term = factory
            .build_loss(
                "direct_init_weight",
                &WeightSpec::new("1"),
                "init image (a.png)",
                &image,
                Some(&target()),
            )
            .unwrap();

        assert_eq!(term.kind(), LossKind::Mse);
        assert_eq!(term.name(), "direct init image (a.png):1");
        assert_eq!(term.weight(), 1.0);
        assert!(term.is_enabled());
    }

    #[test]
    fn other_prefixes_use_the_registry() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let term = factory
            .build_loss(
                "edge_stabilization_weight",
                &WeightSpec::new("0.3"),
                "stabilization",
                &image,
                Some(&target()),
            )
            .unwrap();

        assert_eq!(term.kind(), LossKind::Edge);
        assert_eq!(term.name(), "edge stabilization:0.3");
    }

    #[test]
    fn unknown_prefix_fails() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let err = factory
            .build_loss(
                "hue_stabilization_weight",
                &WeightSpec::new("1"),
                "stabilization",
                &image,
                None,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::UnregisteredVariant { ref prefix, .. } if prefix == "hue"
        ));
        assert!(err.to_string().contains("hue_stabilization_weight"));
    }

    #[test]
    fn name_without_prefix_is_invalid() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let err = factory
            .build_loss("direct", &WeightSpec::new("1"), "x", &image, None)
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::InvalidWeightName(_)));
    }

    #[test]
    fn missing_target_builds_disabled_term() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let term = factory
            .build_loss(
                "direct_stabilization_weight",
                &WeightSpec::new("1"),
                "stabilization",
                &image,
                None,
            )
            .unwrap();

        assert!(!term.is_enabled());
        assert_eq!(term.state(), TermState::Configured);
    }

    #[test]
    fn sentinel_weight_builds_disabled_term() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let term = factory
            .build_loss(
                "direct_init_weight",
                &WeightSpec::zero(),
                "init image (a.png)",
                &image,
                Some(&target()),
            )
            .unwrap();

        assert_eq!(term.name(), "direct init image (a.png):0");
        assert!(!term.is_enabled());
    }

    #[test]
    fn identical_calls_build_independent_terms() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let build = || {
            factory
                .build_loss(
                    "direct_stabilization_weight",
                    &WeightSpec::new("2"),
                    "stabilization",
                    &image,
                    Some(&target()),
                )
                .unwrap()
        };

        let mut first = build();
        let second = build();

        assert_eq!(first.name(), second.name());
        assert_eq!(first.weight(), second.weight());
        assert_eq!(first.is_enabled(), second.is_enabled());

        first.set_enabled(false).unwrap();
        assert!(second.is_enabled());
    }

    #[test]
    fn registry_accepts_new_variants() {
        let mut registry = LossRegistry::default();
        registry.register("smooth", LossKind::Smoothing);
        let factory = LossFactory::with_registry(ModelSession::new(), registry);
        let image = PixelImage::new(4, 4);

        let term = factory
            .build_loss("smooth_weight", &WeightSpec::new("1"), "extra", &image, None)
            .unwrap();

        assert_eq!(term.kind(), LossKind::Smoothing);
    }
}
