//! Reconstruction models and the seam the pipeline calls them through

/// Checkpoint reading and model construction
pub mod checkpoint;
/// Architecture registry
pub mod config;
/// Compute device selection
pub mod device;
/// Pretraining masked autoencoder
pub mod mae;
/// Ground-truth reconstructor for fixtures and baselines
pub mod oracle;
/// Vision transformer building blocks
pub mod vit;

use ndarray::{Array2, Array3};

use crate::io::error::Result;
use crate::patch::PatchMask;

/// Predicts the pixels of masked patches from the visible ones
pub trait Reconstructor {
    /// Side length of the patches this model works on
    fn patch_size(&self) -> usize;

    /// Predict every masked patch
    ///
    /// `image` is the channel-normalized `(3, H, W)` input. The result holds
    /// one per-patch-normalized `(p1 p2 c)` vector per masked patch, in
    /// ascending patch order.
    ///
    /// # Errors
    ///
    /// Returns an error if the input shape or mask does not fit the model,
    /// or the forward pass fails
    fn reconstruct(&self, image: &Array3<f32>, mask: &PatchMask) -> Result<Array2<f32>>;
}
