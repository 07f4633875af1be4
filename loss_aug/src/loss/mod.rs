mod depth;
mod edge;
mod flow;
mod mse;
mod smoothing;

use ndarray::{ArrayView2, ArrayView3};

pub use depth::Depth;
pub use edge::Edge;
pub use flow::Flow;
pub use mse::Mse;
pub use smoothing::Smoothing;

use crate::{
    LossTerm,
    error::{LossErr, Result},
    image::{ImageShape, RgbImage},
    prompt::Prompt,
    session::ModelSession,
};

/// A differentiable objective the optimizer minimizes.
pub trait Loss: Send {
    /// Stores whatever the loss compares against, derived from `target`.
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()>;

    /// Whether the loss has everything it needs to be evaluated.
    fn is_bound(&self) -> bool;

    /// The unweighted loss of `input`.
    fn loss(&self, input: ArrayView3<f32>) -> Result<f32>;
}

/// Every loss variant a `LossTerm` can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LossKind {
    Mse,
    Edge,
    Depth,
    OpticalFlow,
    TargetFlow,
    Smoothing,
    Semantic,
}

impl LossKind {
    /// Builds a term of this kind comparing against `target`.
    ///
    /// The term is enabled only when a target is given, otherwise it stays configured until
    /// someone binds one.
    ///
    /// # Arguments
    /// * `name` - The display name of the term.
    /// * `weight` - The factor the loss gets multiplied by.
    /// * `shape` - The `(width, height)` of the image being optimized.
    /// * `target` - The image to compare against, resized to `shape` if needed.
    /// * `session` - The models variants like `Depth` are computed with.
    pub fn target_image<S: Into<String>>(
        self,
        name: S,
        weight: f32,
        shape: ImageShape,
        target: Option<&RgbImage>,
        session: &ModelSession,
    ) -> Result<LossTerm> {
        let loss = self.instantiate(session)?;
        let mut term = LossTerm::new(name, self, weight, shape, loss);

        if let Some(target) = target {
            term.bind(target)?;
        }

        Ok(term)
    }

    fn instantiate(self, session: &ModelSession) -> Result<Box<dyn Loss>> {
        let loss: Box<dyn Loss> = match self {
            LossKind::Mse => Box::new(Mse::new()),
            LossKind::Edge => Box::new(Edge::new()),
            LossKind::Depth => Box::new(Depth::new(session.depth_model()?)),
            LossKind::OpticalFlow | LossKind::TargetFlow => Box::new(Flow::new()),
            LossKind::Smoothing => Box::new(Smoothing::new()),
            LossKind::Semantic => Box::new(Prompt::new(session.embedder()?, f32::NEG_INFINITY)),
        };

        Ok(loss)
    }
}

pub(crate) fn mean_squared_error<'a, A, B>(a: A, b: B) -> f32
where
    A: IntoIterator<Item = &'a f32>,
    B: IntoIterator<Item = &'a f32>,
{
    let (sum, n) = a
        .into_iter()
        .zip(b)
        .fold((0.0, 0usize), |(sum, n), (x, y)| (sum + (x - y).powi(2), n + 1));

    if n == 0 { 0.0 } else { sum / n as f32 }
}

pub(crate) fn check_dims(
    what: &'static str,
    got: ArrayView2<f32>,
    expected: ArrayView2<f32>,
) -> Result<()> {
    let (gh, gw) = got.dim();
    let (eh, ew) = expected.dim();

    if (gh, gw) != (eh, ew) {
        return Err(LossErr::SizeMismatch {
            what,
            got: (gw, gh),
            expected: (ew, eh),
        });
    }

    Ok(())
}

pub(crate) fn check_image_dims(
    what: &'static str,
    got: ArrayView3<f32>,
    expected: ArrayView3<f32>,
) -> Result<()> {
    let got_shape = crate::image::shape_of(got);
    let expected_shape = crate::image::shape_of(expected);

    if got_shape != expected_shape {
        return Err(LossErr::SizeMismatch {
            what,
            got: got_shape,
            expected: expected_shape,
        });
    }

    Ok(())
}
