use loss_aug::{CHANNELS, PixelImage, RgbImage, TermState, WeightSpec};
use ndarray::Array3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use orchestrator::{AnimationMode, LossOrchestrator, LossPlan, RunParameters};

fn random_image(seed: u64, width: usize, height: usize) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    Array3::from_shape_fn((height, width, CHANNELS), |_| rng.random::<f32>())
}

fn video_plan(samples: usize) -> LossPlan {
    let params = RunParameters {
        animation_mode: AnimationMode::VideoSource,
        flow_stabilization_weight: WeightSpec::new("1"),
        flow_long_term_samples: samples,
        ..Default::default()
    };

    let mut image = PixelImage::new(6, 6);
    LossOrchestrator::default()
        .configure(&params, None, &mut image)
        .unwrap()
}

fn enabled_flows(plan: &LossPlan) -> Vec<bool> {
    (0..plan.optical_flows().len())
        .map(|i| plan.optical_flow(i).unwrap().is_enabled())
        .collect()
}

#[test]
fn first_frame_binds_nothing() {
    let mut plan = video_plan(2);

    let bound = plan
        .update_optical_flows(0, |_| Some(random_image(0, 6, 6)))
        .unwrap();

    assert_eq!(bound, 0);
    assert_eq!(enabled_flows(&plan), vec![false, false, false]);
}

#[test]
fn flows_bind_once_their_frame_exists() {
    let mut plan = video_plan(2);
    let mut offsets = Vec::new();

    let bound = plan
        .update_optical_flows(2, |offset| {
            offsets.push(offset);
            Some(random_image(offset.unsigned_abs(), 6, 6))
        })
        .unwrap();

    assert_eq!(bound, 2);
    assert_eq!(offsets, vec![-1, -2]);
    assert_eq!(enabled_flows(&plan), vec![true, true, false]);
    assert_eq!(plan.optical_flow(2).unwrap().state(), TermState::Configured);

    let bound = plan
        .update_optical_flows(4, |offset| Some(random_image(offset.unsigned_abs(), 6, 6)))
        .unwrap();

    assert_eq!(bound, 3);
    assert_eq!(enabled_flows(&plan), vec![true, true, true]);
}

#[test]
fn missing_warped_frames_are_left_alone() {
    let mut plan = video_plan(1);

    let bound = plan
        .update_optical_flows(3, |offset| {
            (offset == -2).then(|| random_image(9, 6, 6))
        })
        .unwrap();

    assert_eq!(bound, 1);
    assert_eq!(enabled_flows(&plan), vec![false, true]);
}

#[test]
fn bound_flows_pull_towards_the_warped_frame() {
    let mut plan = video_plan(0);
    let warped = random_image(21, 6, 6);

    plan.update_optical_flows(1, |_| Some(warped.clone()))
        .unwrap();

    assert_eq!(plan.total(warped.view()).unwrap(), 0.0);

    let other = random_image(22, 6, 6);
    assert!(plan.total(other.view()).unwrap() > 0.0);
}

#[test]
fn flows_can_be_toggled_directly() {
    let mut plan = video_plan(1);
    let warped = random_image(4, 3, 3);

    let term = plan.optical_flow_mut(0).unwrap();
    assert!(term.set_enabled(true).is_err());

    term.bind(&warped).unwrap();
    assert!(term.is_enabled());
    assert_eq!(term.state(), TermState::Bound);

    term.set_enabled(false).unwrap();
    assert!(!plan.optical_flow(0).unwrap().is_enabled());
}
