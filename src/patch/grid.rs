//! Square patch grid laid over a square input image
//!
//! Patches are indexed row-major: patch `n` sits at grid row `n / cols`
//! and grid column `n % cols`.

use crate::io::configuration::CHANNELS;
use crate::io::error::{MaeError, Result};

/// Non-overlapping partition of an `input_size` square into `patch_size` squares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    input_size: usize,
    patch_size: usize,
}

impl PatchGrid {
    /// Create a grid, validating that the patch size tiles the input exactly
    ///
    /// # Errors
    ///
    /// Returns [`MaeError::ShapeMismatch`] if the patch size is zero, larger
    /// than the input, or does not divide the input size
    pub fn new(input_size: usize, patch_size: usize) -> Result<Self> {
        if patch_size == 0 || input_size < patch_size || input_size % patch_size != 0 {
            return Err(MaeError::ShapeMismatch {
                operation: "patch grid",
                expected: format!("input size divisible by patch size {patch_size}"),
                actual: format!("input size {input_size}"),
            });
        }

        Ok(Self {
            input_size,
            patch_size,
        })
    }

    /// Side length of the input image in pixels
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    /// Side length of one patch in pixels
    pub const fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Number of patch rows
    pub const fn rows(&self) -> usize {
        self.input_size / self.patch_size
    }

    /// Number of patch columns
    pub const fn cols(&self) -> usize {
        self.input_size / self.patch_size
    }

    /// Total number of patches
    pub const fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// A valid grid always holds at least one patch
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixels covered by one patch
    pub const fn pixels_per_patch(&self) -> usize {
        self.patch_size * self.patch_size
    }

    /// Length of a flattened `(p1 p2 c)` patch vector
    pub const fn patch_dim(&self) -> usize {
        self.pixels_per_patch() * CHANNELS
    }

    /// Grid (row, col) of a patch index
    pub const fn position(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.len() {
            Some((index / self.cols(), index % self.cols()))
        } else {
            None
        }
    }

    /// Top-left pixel (y, x) of a patch index
    pub const fn origin(&self, index: usize) -> Option<(usize, usize)> {
        match self.position(index) {
            Some((row, col)) => Some((row * self.patch_size, col * self.patch_size)),
            None => None,
        }
    }
}
