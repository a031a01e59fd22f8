//! Reconstructor that answers with the true pixels
//!
//! Feeding its output through the pipeline must reproduce the original
//! image up to float error, which makes it the analytic fixture for the
//! reconstruction arithmetic and a lower bound for per-patch error.

use ndarray::{Array2, Array3, Axis};

use crate::io::error::{Result, shape_mismatch};
use crate::model::Reconstructor;
use crate::patch::ops::{PatchStats, denormalize_channels, patchify};
use crate::patch::{PatchGrid, PatchMask};

/// Returns each masked patch normalized by its own statistics
#[derive(Debug, Clone, Copy)]
pub struct OracleReconstructor {
    patch_size: usize,
}

impl OracleReconstructor {
    /// Create an oracle for the given patch size
    pub const fn new(patch_size: usize) -> Self {
        Self { patch_size }
    }
}

impl Reconstructor for OracleReconstructor {
    fn patch_size(&self) -> usize {
        self.patch_size
    }

    fn reconstruct(&self, image: &Array3<f32>, mask: &PatchMask) -> Result<Array2<f32>> {
        let (_, height, width) = image.dim();
        if height != width {
            return Err(shape_mismatch("oracle input", &(height, height), &(height, width)));
        }
        let grid = PatchGrid::new(height, self.patch_size)?;
        if mask.len() != grid.len() {
            return Err(shape_mismatch("oracle mask", &grid.len(), &mask.len()));
        }

        let display = denormalize_channels(image)?;
        let patches = patchify(&display, &grid)?;
        let normalized = PatchStats::compute(&patches)?.normalize(&patches)?;

        let masked = normalized.select(Axis(0), &mask.masked_indices());
        Ok(masked.into_shape_with_order((mask.masked_count(), grid.patch_dim()))?)
    }
}
