use log::{debug, info};
use loss_aug::{Image, LossKind, LossTerm, WeightSpec};

use crate::{
    configs::{AnimationMode, FLOW_STABILIZATION_WEIGHT, RunParameters, resolve_weight},
    error::OrchestratorError,
    factory::LossFactory,
    plan::{LossAugs, TermId, flow_offset},
};

/// The terms `configure_optical_flow` appended.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpticalFlowTerms {
    /// The `i`-th one looks back `2^i` frames.
    pub flows: Vec<TermId>,
    pub smoothing: Option<TermId>,
}

/// Sets up the losses that tie a frame to the frames rendered before it.
///
/// Flow terms are built without a target and disabled, the animation driver binds them once
/// the frame they look back to exists. A non zero `smoothing_weight` adds a total variation
/// term on top, regardless of the animation mode.
///
/// # Errors
/// `OrchestratorError::MalformedWeight` if the flow weight doesn't parse and
/// `OrchestratorError::InvalidConfig` for more than `MAX_FLOW_LONG_TERM_SAMPLES` long term
/// samples.
pub fn configure_optical_flow<I>(
    factory: &LossFactory,
    image: &I,
    params: &RunParameters,
    augs: &mut LossAugs,
) -> Result<OpticalFlowTerms, OrchestratorError>
where
    I: Image + ?Sized,
{
    params.check_flow_long_term_samples()?;

    let flows = match params.animation_mode {
        AnimationMode::VideoSource => {
            let weight = if params.flow_stabilization_weight.is_unset() {
                WeightSpec::zero()
            } else {
                params.flow_stabilization_weight.clone()
            };

            let samples = params.flow_long_term_samples + 1;
            let mut flows = Vec::with_capacity(samples);
            for i in 0..samples {
                let offset = flow_offset(i).ok_or_else(|| {
                    OrchestratorError::InvalidConfig(format!("no frame offset for flow term {i}"))
                })?;
                let name = format!("optical flow stabilization (frame {offset}):{weight}");
                let term = flow_term(factory, image, LossKind::OpticalFlow, name, &weight)?;
                flows.push(augs.push(term));
            }

            info!("configured {} video source flow term(s)", flows.len());
            flows
        }
        AnimationMode::ThreeD if !params.flow_stabilization_weight.is_disabled() => {
            let weight = &params.flow_stabilization_weight;
            let name = format!("optical flow stabilization:{weight}");
            let term = flow_term(factory, image, LossKind::TargetFlow, name, weight)?;
            vec![augs.push(term)]
        }
        AnimationMode::ThreeD => {
            debug!("{FLOW_STABILIZATION_WEIGHT} is disabled, no 3D flow term");
            Vec::new()
        }
        AnimationMode::TwoD => Vec::new(),
        AnimationMode::Off => Vec::new(),
    };

    let smoothing = if params.smoothing_weight != 0.0 {
        let name = format!("direct target loss (TV):{}", params.smoothing_weight);
        let term = LossKind::Smoothing.target_image(
            name,
            params.smoothing_weight,
            image.image_shape(),
            None,
            factory.session(),
        )?;
        debug!("built smoothing term {:?}", term.name());
        Some(augs.push(term))
    } else {
        None
    };

    Ok(OpticalFlowTerms { flows, smoothing })
}

/// A disabled flow term waiting for its warped frame.
fn flow_term<I>(
    factory: &LossFactory,
    image: &I,
    kind: LossKind,
    name: String,
    weight: &WeightSpec,
) -> Result<LossTerm, OrchestratorError>
where
    I: Image + ?Sized,
{
    let resolved = resolve_weight(FLOW_STABILIZATION_WEIGHT, weight)?;
    let term = kind.target_image(
        name,
        resolved.value(),
        image.image_shape(),
        None,
        factory.session(),
    )?;

    debug!("built {:?} term {:?}", kind, term.name());
    Ok(term)
}
