pub mod configs;
pub mod error;
pub mod factory;
pub mod plan;

mod compose;
mod init_image;
mod optical_flow;
mod stabilization;

use loss_aug::{Image, ModelSession, RgbImage};

pub use compose::LossOrchestrator;
pub use configs::{AnimationMode, RunParameters};
pub use error::OrchestratorError;
pub use factory::{LossFactory, LossRegistry};
pub use init_image::configure_init_image;
pub use optical_flow::{OpticalFlowTerms, configure_optical_flow};
pub use plan::{LossAugs, LossPlan, LossReport, TermId, flow_offset};
pub use stabilization::configure_stabilization;

/// Configures the losses of a run with the default loss variants.
///
/// # Errors
/// Returns an `OrchestratorError` if the parameters are invalid or a term can't be built.
pub fn configure<I: Image + ?Sized>(
    session: ModelSession,
    params: &RunParameters,
    init_image: Option<&RgbImage>,
    image: &mut I,
) -> Result<LossPlan, OrchestratorError> {
    log::info!("configuring losses for a {}x{} run", params.width, params.height);
    LossOrchestrator::new(session).configure(params, init_image, image)
}
