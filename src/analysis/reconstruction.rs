//! Rebuild pixel-space images from per-patch-normalized predictions
//!
//! The original is standardized patch by patch, masked rows are replaced
//! by the model's predictions, and the same per-patch statistics map the
//! result back to pixels. Visible patches therefore round-trip to the
//! original, and predictions inherit the true patch brightness and contrast.

use ndarray::{Array2, Array3, s};

use crate::io::configuration::CHANNELS;
use crate::io::error::{Result, shape_mismatch};
use crate::patch::ops::{PatchStats, patchify, unpatchify};
use crate::patch::{PatchGrid, PatchMask};

/// Which patches the overlay image keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    /// Zero the masked patches, leaving what the encoder saw
    #[default]
    Visible,
    /// Zero the visible patches, leaving only reconstructed content
    Masked,
}

/// Images derived from one forward pass
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Visible patches from the original, masked patches from the model
    pub reconstructed: Array3<f32>,
    /// 1 where a patch was kept, 0 where it was masked, per pixel
    pub keep_mask: Array3<f32>,
    /// `reconstructed` with one patch set zeroed per [`OverlayMode`]
    pub overlay: Array3<f32>,
}

impl Reconstruction {
    /// Assemble the derived images from a display-range original
    ///
    /// # Errors
    ///
    /// Returns an error if the original does not match the grid, the mask
    /// length differs from the patch count, or the prediction count or width
    /// does not match the masked patches
    pub fn build(
        original: &Array3<f32>,
        mask: &PatchMask,
        predictions: &Array2<f32>,
        grid: &PatchGrid,
        overlay_mode: OverlayMode,
    ) -> Result<Self> {
        if mask.len() != grid.len() {
            return Err(shape_mismatch("reconstruction mask", &grid.len(), &mask.len()));
        }
        let expected = (mask.masked_count(), grid.patch_dim());
        if predictions.dim() != expected {
            return Err(shape_mismatch(
                "reconstruction predictions",
                &expected,
                &predictions.dim(),
            ));
        }

        let patches = patchify(original, grid)?;
        let stats = PatchStats::compute(&patches)?;
        let mut normalized = stats.normalize(&patches)?;

        let predictions = predictions.as_standard_layout();
        for (row, index) in predictions.outer_iter().zip(mask.masked_indices()) {
            let prediction = row.into_shape_with_order((grid.pixels_per_patch(), CHANNELS))?;
            normalized.slice_mut(s![index, .., ..]).assign(&prediction);
        }

        let mut keep_patches = Array3::<f32>::ones(patches.raw_dim());
        for index in mask.masked_indices() {
            keep_patches.slice_mut(s![index, .., ..]).fill(0.0);
        }
        let keep_mask = unpatchify(&keep_patches, grid)?;

        let reconstructed = unpatchify(&stats.denormalize(&normalized)?, grid)?;

        let overlay = match overlay_mode {
            OverlayMode::Visible => &reconstructed * &keep_mask,
            OverlayMode::Masked => &reconstructed * &keep_mask.mapv(|keep| 1.0 - keep),
        };

        Ok(Self {
            reconstructed,
            keep_mask,
            overlay,
        })
    }

    /// Number of pixels flagged as kept, summed over channels
    pub fn kept_elements(&self) -> usize {
        self.keep_mask.iter().filter(|&&keep| keep > 0.5).count()
    }
}
