//! Rearrangement between CHW pixel space and `(N, P*P, C)` patch space
//!
//! Patch tensors keep the pixel index `p1 * P + p2` on the middle axis and
//! the channel innermost, so a flattened row is the `(p1 p2 c)` vector the
//! decoder predicts.

use ndarray::{Array2, Array3, Axis};

use crate::io::configuration::{
    CHANNELS, IMAGENET_DEFAULT_MEAN, IMAGENET_DEFAULT_STD, PATCH_NORM_EPSILON,
};
use crate::io::error::{Result, computation_error, shape_mismatch};
use crate::patch::PatchGrid;

fn check_image_shape(image: &Array3<f32>, grid: &PatchGrid, operation: &'static str) -> Result<()> {
    let expected = (CHANNELS, grid.input_size(), grid.input_size());
    if image.dim() == expected {
        Ok(())
    } else {
        Err(shape_mismatch(operation, &expected, &image.dim()))
    }
}

/// Split a `(3, H, W)` image into `(N, P*P, 3)` patches
///
/// # Errors
///
/// Returns an error if the image does not match the grid's input size
pub fn patchify(image: &Array3<f32>, grid: &PatchGrid) -> Result<Array3<f32>> {
    check_image_shape(image, grid, "patchify")?;
    let p = grid.patch_size();

    let blocks = image
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((CHANNELS, grid.rows(), p, grid.cols(), p))?;
    // (c, h, p1, w, p2) -> (h, w, p1, p2, c)
    let patches = blocks
        .permuted_axes([1, 3, 2, 4, 0])
        .as_standard_layout()
        .into_owned();

    Ok(patches.into_shape_with_order((grid.len(), grid.pixels_per_patch(), CHANNELS))?)
}

/// Reassemble `(N, P*P, 3)` patches into a `(3, H, W)` image
///
/// # Errors
///
/// Returns an error if the patch tensor does not match the grid
pub fn unpatchify(patches: &Array3<f32>, grid: &PatchGrid) -> Result<Array3<f32>> {
    let expected = (grid.len(), grid.pixels_per_patch(), CHANNELS);
    if patches.dim() != expected {
        return Err(shape_mismatch("unpatchify", &expected, &patches.dim()));
    }
    let p = grid.patch_size();

    let blocks = patches
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((grid.rows(), grid.cols(), p, p, CHANNELS))?;
    // (h, w, p1, p2, c) -> (c, h, p1, w, p2)
    let image = blocks
        .permuted_axes([4, 0, 2, 1, 3])
        .as_standard_layout()
        .into_owned();

    Ok(image.into_shape_with_order((CHANNELS, grid.input_size(), grid.input_size()))?)
}

/// Per-patch, per-channel mean and standard deviation
#[derive(Debug, Clone)]
pub struct PatchStats {
    /// Mean over each patch's pixels, shaped `(N, 3)`
    pub mean: Array2<f32>,
    /// Unbiased standard deviation plus epsilon, shaped `(N, 3)`
    pub std: Array2<f32>,
}

impl PatchStats {
    /// Measure every patch independently
    ///
    /// # Errors
    ///
    /// Returns an error if patches hold fewer than two pixels, where the
    /// unbiased estimator is undefined
    pub fn compute(patches: &Array3<f32>) -> Result<Self> {
        let pixels = patches.len_of(Axis(1));
        if pixels < 2 {
            return Err(computation_error(
                "patch statistics",
                &format!("unbiased variance needs at least 2 pixels per patch, got {pixels}"),
            ));
        }

        let mean = patches
            .mean_axis(Axis(1))
            .ok_or_else(|| computation_error("patch statistics", &"empty patch axis"))?;
        let std = patches
            .var_axis(Axis(1), 1.0)
            .mapv(|variance| variance.sqrt() + PATCH_NORM_EPSILON);

        Ok(Self { mean, std })
    }

    fn check(&self, patches: &Array3<f32>, operation: &'static str) -> Result<()> {
        let (count, _, channels) = patches.dim();
        if self.mean.dim() == (count, channels) {
            Ok(())
        } else {
            Err(shape_mismatch(operation, &self.mean.dim(), &(count, channels)))
        }
    }

    /// Standardize each patch with its own statistics
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics were measured on a different patch count
    pub fn normalize(&self, patches: &Array3<f32>) -> Result<Array3<f32>> {
        self.check(patches, "patch normalize")?;
        let mean = self.mean.view().insert_axis(Axis(1));
        let std = self.std.view().insert_axis(Axis(1));
        Ok((patches - &mean) / &std)
    }

    /// Invert [`PatchStats::normalize`]
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics were measured on a different patch count
    pub fn denormalize(&self, patches: &Array3<f32>) -> Result<Array3<f32>> {
        self.check(patches, "patch denormalize")?;
        let mean = self.mean.view().insert_axis(Axis(1));
        let std = self.std.view().insert_axis(Axis(1));
        Ok(patches * &std + &mean)
    }
}

fn check_channels(image: &Array3<f32>, operation: &'static str) -> Result<()> {
    if image.len_of(Axis(0)) == CHANNELS {
        Ok(())
    } else {
        Err(shape_mismatch(operation, &CHANNELS, &image.len_of(Axis(0))))
    }
}

/// Standardize a display-range image with the ImageNet channel statistics
///
/// # Errors
///
/// Returns an error if the image is not three-channel
pub fn normalize_channels(image: &Array3<f32>) -> Result<Array3<f32>> {
    check_channels(image, "channel normalize")?;
    let mut normalized = image.clone();
    for ((mut channel, &mean), &std) in normalized
        .axis_iter_mut(Axis(0))
        .zip(IMAGENET_DEFAULT_MEAN.iter())
        .zip(IMAGENET_DEFAULT_STD.iter())
    {
        channel.mapv_inplace(|value| (value - mean) / std);
    }
    Ok(normalized)
}

/// Map a standardized image back to display range
///
/// # Errors
///
/// Returns an error if the image is not three-channel
pub fn denormalize_channels(image: &Array3<f32>) -> Result<Array3<f32>> {
    check_channels(image, "channel denormalize")?;
    let mut restored = image.clone();
    for ((mut channel, &mean), &std) in restored
        .axis_iter_mut(Axis(0))
        .zip(IMAGENET_DEFAULT_MEAN.iter())
        .zip(IMAGENET_DEFAULT_STD.iter())
    {
        channel.mapv_inplace(|value| value.mul_add(std, mean));
    }
    Ok(restored)
}
