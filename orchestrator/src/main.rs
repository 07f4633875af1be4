use std::env;

use anyhow::{Context, Result};
use log::{info, warn};
use loss_aug::{ModelSession, PixelImage};
use orchestrator::{LossOrchestrator, RunParameters};

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .context("usage: orchestrator <params.json>")?;

    let params = RunParameters::load(&path).with_context(|| format!("loading {path}"))?;
    info!("loaded run parameters from {path}");

    if !params.init_image.is_empty() {
        warn!(
            "init image {:?} is not decoded in a dry run, skipping init losses",
            params.init_image
        );
    }

    let mut image = PixelImage::new(params.width, params.height);
    let orchestrator = LossOrchestrator::new(ModelSession::new());
    let plan = orchestrator.configure(&params, None, &mut image)?;

    for (i, term) in plan.augs().iter().enumerate() {
        println!(
            "{i:>3} {:<12} {:<8} {}",
            format!("{:?}", term.kind()),
            if term.is_enabled() { "enabled" } else { "disabled" },
            term.name()
        );
    }
    println!(
        "{} optical flow term(s), smoothing: {}",
        plan.optical_flows().len(),
        plan.smoothing().is_some()
    );

    Ok(())
}
