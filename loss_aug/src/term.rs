use std::fmt;

use log::debug;
use ndarray::ArrayView3;

use crate::{
    error::{LossErr, Result},
    image::{ImageShape, RgbImage, check_rgb, resize_nearest},
    loss::{Loss, LossKind},
};

/// Where a term is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermState {
    /// The shape is known but there's nothing to compare against yet.
    Configured,
    /// A target was set, the term can be enabled.
    Bound,
}

/// A named, weighted loss.
///
/// Terms are created once per run and are only ever mutated through their target and enabled
/// state. A disabled term still gets evaluated, it just contributes nothing.
pub struct LossTerm {
    name: String,
    kind: LossKind,
    weight: f32,
    shape: ImageShape,
    enabled: bool,
    loss: Box<dyn Loss>,
}

impl LossTerm {
    /// Creates a new `LossTerm`, enabled if `loss` is already bound.
    ///
    /// # Arguments
    /// * `name` - Human readable name, usually embedding the weight.
    /// * `kind` - The variant of `loss`.
    /// * `weight` - The factor the loss gets multiplied by.
    /// * `shape` - The `(width, height)` targets get resized to.
    /// * `loss` - The objective itself.
    pub fn new<S: Into<String>>(
        name: S,
        kind: LossKind,
        weight: f32,
        shape: ImageShape,
        loss: Box<dyn Loss>,
    ) -> Self {
        let enabled = loss.is_bound();

        Self {
            name: name.into(),
            kind,
            weight,
            shape,
            enabled,
            loss,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LossKind {
        self.kind
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> TermState {
        if self.loss.is_bound() {
            TermState::Bound
        } else {
            TermState::Configured
        }
    }

    /// Enables or disables the term.
    ///
    /// # Errors
    /// `LossErr::Unbound` when enabling a term that has no target yet.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled && self.state() == TermState::Configured {
            return Err(LossErr::Unbound {
                name: self.name.clone(),
            });
        }

        self.enabled = enabled;
        Ok(())
    }

    /// Replaces the target without touching the enabled state.
    ///
    /// `target` is resized to the term's shape if it doesn't match.
    ///
    /// # Errors
    /// `LossErr::InvalidImage` if `target` is empty or not RGB, the old target is kept.
    pub fn set_target(&mut self, target: &RgbImage) -> Result<()> {
        check_rgb("target", target.view())?;
        let resized = resize_nearest(target.view(), self.shape);
        self.loss.set_target(resized.view())
    }

    /// Sets the target and enables the term.
    pub fn bind(&mut self, target: &RgbImage) -> Result<()> {
        self.set_target(target)?;
        debug!(term = self.name.as_str(); "bound target");
        self.set_enabled(true)
    }

    /// The weighted loss of `input`, zero while disabled.
    pub fn evaluate(&self, input: ArrayView3<f32>) -> Result<f32> {
        if !self.enabled {
            return Ok(0.0);
        }

        check_rgb("input", input)?;
        Ok(self.weight * self.loss.loss(input)?)
    }
}

impl fmt::Debug for LossTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LossTerm")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("weight", &self.weight)
            .field("shape", &self.shape)
            .field("enabled", &self.enabled)
            .field("state", &self.state())
            .finish()
    }
}
