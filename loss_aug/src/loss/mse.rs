use ndarray::ArrayView3;

use super::{Loss, check_image_dims, mean_squared_error};
use crate::{error::Result, image::RgbImage};

/// Mean squared error against a target image.
#[derive(Default, Clone)]
pub struct Mse {
    target: Option<RgbImage>,
}

impl Mse {
    /// Returns a new, unbound `Mse`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loss for Mse {
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()> {
        self.target = Some(target.to_owned());
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let Some(target) = &self.target else {
            return Ok(0.0);
        };

        check_image_dims("mse input", input, target.view())?;
        Ok(mean_squared_error(input.iter(), target.iter()))
    }
}
