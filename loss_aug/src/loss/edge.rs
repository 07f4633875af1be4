use ndarray::{Array2, ArrayView3};

use super::{Loss, check_dims, mean_squared_error};
use crate::error::Result;

fn luminance(image: ArrayView3<f32>) -> Array2<f32> {
    let (h, w, _) = image.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        0.299 * image[[y, x, 0]] + 0.587 * image[[y, x, 1]] + 0.114 * image[[y, x, 2]]
    })
}

/// Gradient magnitude of the luminance, using forward differences. The last row and column
/// have no forward neighbour and only see the difference along the other axis.
pub(crate) fn edge_map(image: ArrayView3<f32>) -> Array2<f32> {
    let lum = luminance(image);
    let (h, w) = lum.dim();

    Array2::from_shape_fn((h, w), |(y, x)| {
        let dx = if x + 1 < w { lum[[y, x + 1]] - lum[[y, x]] } else { 0.0 };
        let dy = if y + 1 < h { lum[[y + 1, x]] - lum[[y, x]] } else { 0.0 };
        (dx * dx + dy * dy).sqrt()
    })
}

/// Compares the edges of the input with the edges of a target image.
#[derive(Default, Clone)]
pub struct Edge {
    target_edges: Option<Array2<f32>>,
}

impl Edge {
    /// Returns a new, unbound `Edge`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loss for Edge {
    fn set_target(&mut self, target: ArrayView3<f32>) -> Result<()> {
        self.target_edges = Some(edge_map(target));
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.target_edges.is_some()
    }

    fn loss(&self, input: ArrayView3<f32>) -> Result<f32> {
        let Some(target_edges) = &self.target_edges else {
            return Ok(0.0);
        };

        let edges = edge_map(input);
        check_dims("edge map", edges.view(), target_edges.view())?;
        Ok(mean_squared_error(edges.iter(), target_edges.iter()))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    #[test]
    fn flat_image_has_no_edges() {
        let flat = Array3::from_elem((4, 4, 3), 0.5);
        assert!(edge_map(flat.view()).iter().all(|&e| e == 0.0));
    }

    #[test]
    fn vertical_step_is_detected() {
        let step = Array3::from_shape_fn((3, 4, 3), |(_, x, _)| if x < 2 { 0.0 } else { 1.0 });
        let edges = edge_map(step.view());

        assert!((edges[[0, 1]] - 1.0).abs() < 1e-6);
        assert_eq!(edges[[0, 0]], 0.0);
        assert_eq!(edges[[0, 2]], 0.0);
    }
}
