//! Boolean patch masks and the strategies that produce them
//!
//! A set bit means the patch is hidden from the encoder and must be
//! reconstructed. Every consumer walks masked patches in ascending index
//! order, which is also the order the model emits its predictions.

use bitvec::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::fmt;

use crate::io::error::{Result, invalid_parameter, shape_mismatch};
use crate::patch::PatchGrid;

/// Fixed-size bitmask over patch positions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchMask {
    bits: BitVec,
}

impl PatchMask {
    /// Create a mask with no patches hidden
    pub fn new(len: usize) -> Self {
        Self {
            bits: bitvec![0; len],
        }
    }

    /// Build a mask from one flag per patch
    pub fn from_bools(flags: &[bool]) -> Self {
        Self {
            bits: flags.iter().copied().collect(),
        }
    }

    /// Build a mask hiding the listed patch indices
    ///
    /// # Errors
    ///
    /// Returns an error if any index is outside `0..len`
    pub fn from_indices(len: usize, indices: &[usize]) -> Result<Self> {
        let mut mask = Self::new(len);
        for &index in indices {
            if index >= len {
                return Err(invalid_parameter(
                    "mask index",
                    &index,
                    &format!("grid holds {len} patches"),
                ));
            }
            mask.bits.set(index, true);
        }
        Ok(mask)
    }

    /// Number of patch positions covered
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Test if the mask covers no positions
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Test whether a patch is hidden
    pub fn is_masked(&self, index: usize) -> bool {
        self.bits.get(index).as_deref() == Some(&true)
    }

    /// Count hidden patches
    pub fn masked_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Count patches the encoder sees
    pub fn visible_count(&self) -> usize {
        self.bits.count_zeros()
    }

    /// Hidden patch indices in ascending order
    pub fn masked_indices(&self) -> Vec<usize> {
        self.bits.iter_ones().collect()
    }

    /// Visible patch indices in ascending order
    pub fn visible_indices(&self) -> Vec<usize> {
        self.bits.iter_zeros().collect()
    }

    /// Fraction of patches hidden
    pub fn ratio(&self) -> f32 {
        if self.bits.is_empty() {
            0.0
        } else {
            self.masked_count() as f32 / self.len() as f32
        }
    }

    /// Borrow the underlying flags
    pub fn as_bits(&self) -> &BitSlice {
        &self.bits
    }
}

impl fmt::Display for PatchMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PatchMask({}/{} masked)",
            self.masked_count(),
            self.len()
        )
    }
}

/// Number of patches a ratio hides on a grid of `len` patches
///
/// Truncates toward zero, so 0.75 of 196 patches hides 147.
///
/// # Errors
///
/// Returns an error if the ratio is outside (0, 1) or leaves either the
/// visible or the masked set empty
pub fn masked_patch_count(len: usize, mask_ratio: f32) -> Result<usize> {
    if mask_ratio.is_nan() || mask_ratio <= 0.0 || mask_ratio >= 1.0 {
        return Err(invalid_parameter(
            "mask_ratio",
            &mask_ratio,
            &"must lie strictly between 0 and 1",
        ));
    }

    let count = (mask_ratio * len as f32) as usize;
    if count == 0 || count >= len {
        return Err(invalid_parameter(
            "mask_ratio",
            &mask_ratio,
            &format!("hides {count} of {len} patches; both sets must be non-empty"),
        ));
    }

    Ok(count)
}

/// Chooses which patches to hide
pub trait MaskingStrategy {
    /// Select masked positions for the grid at the given ratio
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot produce a mask for this grid
    fn select(&mut self, grid: &PatchGrid, mask_ratio: f32) -> Result<PatchMask>;
}

impl<S: MaskingStrategy + ?Sized> MaskingStrategy for Box<S> {
    fn select(&mut self, grid: &PatchGrid, mask_ratio: f32) -> Result<PatchMask> {
        (**self).select(grid, mask_ratio)
    }
}

/// Uniformly random selection of exactly `floor(ratio * len)` patches
#[derive(Debug, Clone)]
pub struct RandomMasking {
    rng: StdRng,
}

impl RandomMasking {
    /// Create a seeded random strategy
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MaskingStrategy for RandomMasking {
    fn select(&mut self, grid: &PatchGrid, mask_ratio: f32) -> Result<PatchMask> {
        let len = grid.len();
        let count = masked_patch_count(len, mask_ratio)?;

        let mut flags = vec![false; len - count];
        flags.extend(std::iter::repeat_n(true, count));
        flags.shuffle(&mut self.rng);

        Ok(PatchMask::from_bools(&flags))
    }
}

/// Hides every patch whose row and column sum is odd
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerboardMasking;

impl MaskingStrategy for CheckerboardMasking {
    fn select(&mut self, grid: &PatchGrid, mask_ratio: f32) -> Result<PatchMask> {
        if (mask_ratio - 0.5).abs() > f32::EPSILON {
            tracing::warn!(mask_ratio, "checkerboard masking ignores the mask ratio");
        }

        let flags: Vec<bool> = (0..grid.len())
            .map(|index| {
                let (row, col) = grid.position(index).unwrap_or((0, 0));
                (row + col) % 2 == 1
            })
            .collect();

        Ok(PatchMask::from_bools(&flags))
    }
}

/// Replays a precomputed mask
#[derive(Debug, Clone)]
pub struct FixedMasking {
    mask: PatchMask,
}

impl FixedMasking {
    /// Wrap a mask for reuse on every selection
    pub const fn new(mask: PatchMask) -> Self {
        Self { mask }
    }
}

impl MaskingStrategy for FixedMasking {
    fn select(&mut self, grid: &PatchGrid, _mask_ratio: f32) -> Result<PatchMask> {
        if self.mask.len() != grid.len() {
            return Err(shape_mismatch(
                "fixed masking",
                &grid.len(),
                &self.mask.len(),
            ));
        }
        Ok(self.mask.clone())
    }
}
