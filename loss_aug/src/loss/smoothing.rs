use ndarray::ArrayView3;

use super::Loss;
use crate::error::Result;

const EPSILON: f32 = 1e-8;

/// Total variation, penalizes differences between neighbouring pixels.
///
/// For every pixel with a right and a lower neighbour, the squared differences are averaged
/// over the channels and square rooted, the loss is the mean of those values.
#[derive(Default, Clone, Copy)]
pub struct Smoothing;

impl Smoothing {
    pub fn new() -> Self {
        Self
    }
}

impl Loss for Smoothing {
    fn set_target(&mut self, _target: ArrayView3<f32>) -> Result<()> {
        Ok(())
    }

    fn is_bound(&self) -> bool {
        true
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let (h, w, c) = input.dim();
        if h < 2 || w < 2 || c == 0 {
            return Ok(0.0);
        }

        let mut total = 0.0;
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let mut diff = 0.0;
                for ch in 0..c {
                    let here = input[[y, x, ch]];
                    let dx = input[[y, x + 1, ch]] - here;
                    let dy = input[[y + 1, x, ch]] - here;
                    diff += dx * dx + dy * dy + EPSILON;
                }
                total += (diff / c as f32).sqrt();
            }
        }

        Ok(total / ((h - 1) * (w - 1)) as f32)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    #[test]
    fn flat_image_is_almost_free() {
        let flat = Array3::from_elem((5, 5, 3), 0.3);
        let loss = Smoothing.loss(flat.view()).unwrap();
        assert!(loss < 1e-3);
    }

    #[test]
    fn checkerboard_costs_more_than_gradient() {
        let checker = Array3::from_shape_fn((6, 6, 3), |(y, x, _)| ((x + y) % 2) as f32);
        let ramp = Array3::from_shape_fn((6, 6, 3), |(_, x, _)| x as f32 / 5.0);

        let checker_loss = Smoothing.loss(checker.view()).unwrap();
        let ramp_loss = Smoothing.loss(ramp.view()).unwrap();

        assert!(checker_loss > ramp_loss);
        assert!((checker_loss - 2f32.sqrt()).abs() < 1e-3);
    }
}
