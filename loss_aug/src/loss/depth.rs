use std::sync::Arc;

use ndarray::{Array2, ArrayView3};

use super::{Loss, check_dims, mean_squared_error};
use crate::{error::Result, session::DepthModel};

/// Compares estimated depth maps of the input and a target image.
pub struct Depth {
    model: Arc<dyn DepthModel>,
    target_depth: Option<Array2<f32>>,
}

impl Depth {
    /// Returns a new, unbound `Depth` estimating with `model`.
    pub fn new(model: Arc<dyn DepthModel>) -> Self {
        Self {
            model,
            target_depth: None,
        }
    }
}

impl Loss for Depth {
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()> {
        self.target_depth = Some(self.model.estimate(target));
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.target_depth.is_some()
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let Some(target_depth) = &self.target_depth else {
            return Ok(0.0);
        };

        let depth = self.model.estimate(input);
        check_dims("depth map", depth.view(), target_depth.view())?;
        Ok(mean_squared_error(depth.iter(), target_depth.iter()))
    }
}
