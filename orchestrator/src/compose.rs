use log::{debug, info};
use loss_aug::{Image, LossKind, ModelSession, RgbImage};

use crate::{
    configs::RunParameters,
    error::OrchestratorError,
    factory::LossFactory,
    init_image::{INIT_AUGS, configure_init_image},
    optical_flow::{OpticalFlowTerms, configure_optical_flow},
    plan::{LossAugs, LossPlan},
    stabilization::{STABILIZATION_AUGS, configure_stabilization},
};

/// Assembles every loss term a run needs.
#[derive(Clone, Default)]
pub struct LossOrchestrator {
    factory: LossFactory,
}

impl LossOrchestrator {
    /// Creates an orchestrator with the default loss variants.
    ///
    /// # Arguments
    /// * `session` - The models the terms get computed with.
    pub fn new(session: ModelSession) -> Self {
        Self::with_factory(LossFactory::new(session))
    }

    pub fn with_factory(factory: LossFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &LossFactory {
        &self.factory
    }

    /// Configures the losses of a run, in init image, stabilization, optical flow order.
    ///
    /// Every weight is validated and every model the terms need is looked up before anything
    /// else, so on a bad configuration `image` is left untouched. Afterwards, `image` only
    /// changes if the init image gets encoded.
    ///
    /// # Arguments
    /// * `params` - The run parameters.
    /// * `init_image` - The decoded init image, if the run has one.
    /// * `image` - The image being optimized.
    ///
    /// # Errors
    /// `OrchestratorError::MalformedWeight` or `OrchestratorError::InvalidConfig` for a bad
    /// configuration, `OrchestratorError::Loss` if the session lacks a model a term needs, or
    /// whatever building a term fails with.
    pub fn configure<I>(
        &self,
        params: &RunParameters,
        init_image: Option<&RgbImage>,
        image: &mut I,
    ) -> Result<LossPlan, OrchestratorError>
    where
        I: Image + ?Sized,
    {
        params.validate()?;
        self.check_models(params, init_image, &*image)?;

        let mut augs = LossAugs::new();

        info!("configuring init image losses");
        let (init_augs, semantic_init) = configure_init_image(
            &self.factory,
            init_image,
            params.restore,
            image,
            params,
            &mut augs,
        )?;

        info!("configuring stabilization losses");
        let stabilization_augs =
            configure_stabilization(&self.factory, &*image, init_image, params, &mut augs)?;

        info!("configuring optical flow losses ({:?})", params.animation_mode);
        let OpticalFlowTerms { flows, smoothing } =
            configure_optical_flow(&self.factory, &*image, params, &mut augs)?;

        info!(
            "configured {} term(s): {} init, {} stabilization, {} optical flow",
            augs.len(),
            init_augs.len(),
            stabilization_augs.len(),
            flows.len()
        );

        Ok(LossPlan {
            augs,
            init_augs,
            stabilization_augs,
            optical_flows: flows,
            smoothing,
            semantic_init,
        })
    }

    /// Looks up the models of every term `configure` is going to build.
    fn check_models<I>(
        &self,
        params: &RunParameters,
        init_image: Option<&RgbImage>,
        image: &I,
    ) -> Result<(), OrchestratorError>
    where
        I: Image + ?Sized,
    {
        let init_keys: &[&str] = if init_image.is_some() { &INIT_AUGS } else { &[] };
        let session = self.factory.session();

        for &key in init_keys.iter().chain(&STABILIZATION_AUGS) {
            if params.required_weight(key)?.is_disabled() {
                continue;
            }

            match self.factory.resolve_kind(key, image)? {
                (_, LossKind::Depth) => {
                    session.depth_model()?;
                }
                (_, LossKind::Semantic) => {
                    session.embedder()?;
                }
                _ => {}
            }
        }

        if init_image.is_some() && !params.semantic_init_weight.is_disabled() {
            session.embedder()?;
        }

        debug!("every model the run needs is loaded");
        Ok(())
    }
}
