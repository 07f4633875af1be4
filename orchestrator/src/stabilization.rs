use log::debug;
use loss_aug::{Image, RgbImage};

use crate::{
    configs::{
        DEPTH_STABILIZATION_WEIGHT, DIRECT_STABILIZATION_WEIGHT, EDGE_STABILIZATION_WEIGHT,
        RunParameters,
    },
    error::OrchestratorError,
    factory::LossFactory,
    plan::{LossAugs, TermId},
};

pub(crate) const STABILIZATION_AUGS: [&str; 3] = [
    DIRECT_STABILIZATION_WEIGHT,
    DEPTH_STABILIZATION_WEIGHT,
    EDGE_STABILIZATION_WEIGHT,
];

/// Sets up the losses that keep consecutive frames from drifting apart.
///
/// Every stabilization term compares against the init image. Without one the terms are still
/// built, but stay disabled until a target gets bound.
///
/// # Returns
/// The positions of the appended terms, in direct, depth, edge order.
pub fn configure_stabilization<I>(
    factory: &LossFactory,
    image: &I,
    init_image: Option<&RgbImage>,
    params: &RunParameters,
    augs: &mut LossAugs,
) -> Result<Vec<TermId>, OrchestratorError>
where
    I: Image + ?Sized,
{
    let mut stabilization_augs = Vec::new();

    for key in STABILIZATION_AUGS {
        let weight = params.required_weight(key)?;
        if weight.is_disabled() {
            debug!("{key} is disabled, skipping");
            continue;
        }

        let term = factory.build_loss(key, weight, "stabilization", image, init_image)?;
        stabilization_augs.push(augs.push(term));
    }

    Ok(stabilization_augs)
}

#[cfg(test)]
mod tests {
    use loss_aug::{CHANNELS, DepthModel, LossKind, ModelSession, PixelImage, WeightSpec};
    use ndarray::{Array2, Array3, ArrayView3};

    use super::*;

    struct Flat;

    impl DepthModel for Flat {
        fn estimate(&self, image: ArrayView3<f32>) -> Array2<f32> {
            let (h, w, _) = image.dim();
            Array2::ones((h, w))
        }
    }

    fn params(direct: &str, depth: &str, edge: &str) -> RunParameters {
        RunParameters {
            direct_stabilization_weight: WeightSpec::new(direct),
            depth_stabilization_weight: WeightSpec::new(depth),
            edge_stabilization_weight: WeightSpec::new(edge),
            ..Default::default()
        }
    }

    #[test]
    fn terms_are_built_in_order() {
        let factory = LossFactory::new(ModelSession::new().with_depth_model(Flat));
        let image = PixelImage::new(4, 4);
        let init: RgbImage = Array3::from_elem((4, 4, CHANNELS), 0.2);
        let mut augs = LossAugs::new();

        let ids = configure_stabilization(
            &factory,
            &image,
            Some(&init),
            &params("1", "0.5", "2"),
            &mut augs,
        )
        .unwrap();

        let kinds: Vec<LossKind> = ids.iter().map(|&id| augs.get(id).unwrap().kind()).collect();
        assert_eq!(kinds, vec![LossKind::Mse, LossKind::Depth, LossKind::Edge]);

        let names: Vec<&str> = augs.iter().map(|term| term.name()).collect();
        assert_eq!(
            names,
            vec![
                "direct stabilization:1",
                "depth stabilization:0.5",
                "edge stabilization:2"
            ]
        );
        assert!(augs.iter().all(|term| term.is_enabled()));
    }

    #[test]
    fn disabled_weights_are_skipped() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let mut augs = LossAugs::new();

        let ids =
            configure_stabilization(&factory, &image, None, &params("", "0", "0.3"), &mut augs)
                .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(augs.get(ids[0]).unwrap().kind(), LossKind::Edge);
    }

    #[test]
    fn terms_without_init_image_stay_disabled() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let mut augs = LossAugs::new();

        configure_stabilization(&factory, &image, None, &params("1", "", "1"), &mut augs).unwrap();

        assert_eq!(augs.len(), 2);
        assert!(augs.iter().all(|term| !term.is_enabled()));
    }

    #[test]
    fn depth_without_model_fails() {
        let factory = LossFactory::default();
        let image = PixelImage::new(4, 4);
        let mut augs = LossAugs::new();

        let err = configure_stabilization(&factory, &image, None, &params("", "1", ""), &mut augs)
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Loss(_)));
    }
}
