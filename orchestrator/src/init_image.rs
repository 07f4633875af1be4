use log::{debug, info, warn};
use loss_aug::{Image, LossTerm, RgbImage, parse_prompt};

use crate::{
    configs::{DIRECT_INIT_WEIGHT, RunParameters, SEMANTIC_INIT_WEIGHT},
    error::OrchestratorError,
    factory::LossFactory,
    plan::{LossAugs, TermId},
};

pub(crate) const INIT_AUGS: [&str; 1] = [DIRECT_INIT_WEIGHT];

/// Sets up the losses that keep the output close to the init image.
///
/// Unless resuming, the init image is encoded into `image` before any term is built, so the
/// terms see the post encode state.
///
/// # Arguments
/// * `factory` - Builds the terms.
/// * `init_image` - The init image, nothing happens without one.
/// * `restore` - Whether the run resumes, in which case `image` is left untouched.
/// * `image` - The image being optimized.
/// * `params` - The run parameters.
/// * `augs` - The run's terms, the direct init term gets appended here.
///
/// # Returns
/// The positions of the appended terms and the semantic init term, if any.
pub fn configure_init_image<I>(
    factory: &LossFactory,
    init_image: Option<&RgbImage>,
    restore: bool,
    image: &mut I,
    params: &RunParameters,
    augs: &mut LossAugs,
) -> Result<(Vec<TermId>, Option<LossTerm>), OrchestratorError>
where
    I: Image + ?Sized,
{
    let Some(init_image) = init_image else {
        debug!("no init image, skipping init losses");
        return Ok((Vec::new(), None));
    };

    if !restore {
        info!("encoding init image {:?}", params.init_image);
        image.encode_image(init_image)?;
        let (height, width, _) = image.decode_image().dim();
        info!("encoded init image, decodes to {width}x{height}");
    }

    let context = format!("init image ({})", params.init_image);
    let mut init_augs = Vec::new();

    for key in INIT_AUGS {
        let weight = params.required_weight(key)?;
        if weight.is_disabled() {
            continue;
        }

        let term = factory.build_loss(key, weight, &context, &*image, Some(init_image))?;
        init_augs.push(augs.push(term));
    }

    let semantic_init = if params.semantic_init_weight.is_disabled() {
        None
    } else {
        let prompt = format!(
            "init image [{}]:{}",
            params.init_image, params.semantic_init_weight
        );
        let term = parse_prompt(factory.session(), &prompt, init_image).map_err(|e| {
            warn!("failed to parse {SEMANTIC_INIT_WEIGHT} prompt {prompt:?}");
            OrchestratorError::from(e)
        })?;
        Some(term)
    };

    Ok((init_augs, semantic_init))
}
