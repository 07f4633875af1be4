use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView3};

use crate::error::{LossErr, Result};

/// Monocular depth estimation.
pub trait DepthModel: Send + Sync {
    /// Returns a `(height, width)` depth map for `image`.
    fn estimate(&self, image: ArrayView3<f32>) -> Array2<f32>;
}

/// Maps images into a semantic embedding space.
pub trait Embedder: Send + Sync {
    fn embed_image(&self, image: ArrayView3<f32>) -> Array1<f32>;
}

/// The perceptual models available to a run.
///
/// Owned by the caller and handed to whatever needs a model, nothing is cached process wide.
#[derive(Clone, Default)]
pub struct ModelSession {
    depth: Option<Arc<dyn DepthModel>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl ModelSession {
    /// Creates a session with no models loaded.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth_model<D: DepthModel + 'static>(mut self, model: D) -> Self {
        self.depth = Some(Arc::new(model));
        self
    }

    pub fn with_embedder<E: Embedder + 'static>(mut self, embedder: E) -> Self {
        self.embedder = Some(Arc::new(embedder));
        self
    }

    /// # Errors
    /// `LossErr::MissingModel` if no depth model was loaded.
    pub fn depth_model(&self) -> Result<Arc<dyn DepthModel>> {
        self.depth.clone().ok_or(LossErr::MissingModel("depth"))
    }

    /// # Errors
    /// `LossErr::MissingModel` if no embedder was loaded.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        self.embedder.clone().ok_or(LossErr::MissingModel("embedder"))
    }
}
