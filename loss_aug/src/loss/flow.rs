use ndarray::ArrayView3;

use super::{Loss, check_image_dims, mean_squared_error};
use crate::{error::Result, image::RgbImage};

/// Temporal consistency against a prior frame.
///
/// The target is the prior frame already warped into the current one, the animation driver
/// supplies a new one every frame.
#[derive(Default, Clone)]
pub struct Flow {
    warped: Option<RgbImage>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loss for Flow {
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()> {
        self.warped = Some(target.to_owned());
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.warped.is_some()
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let Some(warped) = &self.warped else {
            return Ok(0.0);
        };

        check_image_dims("warped frame", input, warped.view())?;
        Ok(mean_squared_error(input.iter(), warped.iter()))
    }
}
