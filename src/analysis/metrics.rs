//! Scalar and per-patch error measures between two `(3, H, W)` images

use ndarray::{Array3, ArrayView3, s};

use crate::io::error::{Result, shape_mismatch};
use crate::patch::{PatchGrid, PatchMask};

fn check_pair(original: &Array3<f32>, other: &Array3<f32>, operation: &'static str) -> Result<()> {
    if original.dim() == other.dim() {
        Ok(())
    } else {
        Err(shape_mismatch(operation, &original.dim(), &other.dim()))
    }
}

/// Fraction of elements whose absolute difference is below `threshold`
///
/// # Errors
///
/// Returns an error if the images differ in shape
pub fn pixelwise_accuracy(
    original: &Array3<f32>,
    reconstructed: &Array3<f32>,
    threshold: f32,
) -> Result<f32> {
    check_pair(original, reconstructed, "pixelwise accuracy")?;
    if original.is_empty() {
        return Ok(1.0);
    }

    let correct = original
        .iter()
        .zip(reconstructed.iter())
        .filter(|&(&a, &b)| (a - b).abs() < threshold)
        .count();

    Ok(correct as f32 / original.len() as f32)
}

fn patch_view<'a>(
    image: &'a Array3<f32>,
    grid: &PatchGrid,
    index: usize,
) -> Option<ArrayView3<'a, f32>> {
    let (y, x) = grid.origin(index)?;
    let p = grid.patch_size();
    Some(image.slice(s![.., y..y + p, x..x + p]))
}

fn mse_at(original: &Array3<f32>, other: &Array3<f32>, grid: &PatchGrid, index: usize) -> f32 {
    match (patch_view(original, grid, index), patch_view(other, grid, index)) {
        (Some(a), Some(b)) => {
            let sum: f32 = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| (x - y) * (x - y))
                .sum();
            sum / a.len() as f32
        }
        _ => 0.0,
    }
}

fn check_grid(original: &Array3<f32>, grid: &PatchGrid, operation: &'static str) -> Result<()> {
    let (_, height, width) = original.dim();
    if height == grid.input_size() && width == grid.input_size() {
        Ok(())
    } else {
        Err(shape_mismatch(
            operation,
            &(grid.input_size(), grid.input_size()),
            &(height, width),
        ))
    }
}

/// Mean squared error of every patch, row-major
///
/// # Errors
///
/// Returns an error if the images differ in shape or do not match the grid
pub fn patch_mse(
    original: &Array3<f32>,
    other: &Array3<f32>,
    grid: &PatchGrid,
) -> Result<Vec<f32>> {
    check_pair(original, other, "patch mse")?;
    check_grid(original, grid, "patch mse")?;

    Ok((0..grid.len())
        .map(|index| mse_at(original, other, grid, index))
        .collect())
}

/// Mean squared error of each masked patch, in ascending patch order
///
/// # Errors
///
/// Returns an error if the images differ in shape or the grid and mask disagree
pub fn masked_patch_mse(
    original: &Array3<f32>,
    other: &Array3<f32>,
    grid: &PatchGrid,
    mask: &PatchMask,
) -> Result<Vec<f32>> {
    check_pair(original, other, "masked patch mse")?;
    check_grid(original, grid, "masked patch mse")?;
    if mask.len() != grid.len() {
        return Err(shape_mismatch("masked patch mse", &grid.len(), &mask.len()));
    }

    Ok(mask
        .masked_indices()
        .into_iter()
        .map(|index| mse_at(original, other, grid, index))
        .collect())
}

/// The four per-patch error series reported for one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MseSeries {
    /// Reconstruction vs original, every patch
    pub reconstructed: Vec<f32>,
    /// Overlay vs original, every patch
    pub overlay: Vec<f32>,
    /// Reconstruction vs original, masked patches
    pub masked_reconstructed: Vec<f32>,
    /// Overlay vs original, masked patches
    pub masked_overlay: Vec<f32>,
}

impl MseSeries {
    /// Measure both derived images against the original
    ///
    /// # Errors
    ///
    /// Returns an error if any image does not match the grid
    pub fn measure(
        original: &Array3<f32>,
        reconstructed: &Array3<f32>,
        overlay: &Array3<f32>,
        grid: &PatchGrid,
        mask: &PatchMask,
    ) -> Result<Self> {
        Ok(Self {
            reconstructed: patch_mse(original, reconstructed, grid)?,
            overlay: patch_mse(original, overlay, grid)?,
            masked_reconstructed: masked_patch_mse(original, reconstructed, grid, mask)?,
            masked_overlay: masked_patch_mse(original, overlay, grid, mask)?,
        })
    }
}
