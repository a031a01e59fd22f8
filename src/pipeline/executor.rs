//! One image in, reconstruction diagnostics out
//!
//! The pipeline owns no global state: the model, the masking strategy and
//! every numeric setting arrive through [`Pipeline::new`].

use std::path::Path;

use ndarray::Array3;

use crate::analysis::metrics::{MseSeries, pixelwise_accuracy};
use crate::analysis::reconstruction::{OverlayMode, Reconstruction};
use crate::io::configuration::{
    DEFAULT_ACCURACY_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_MASK_RATIO, DISPLAY_MAX,
};
use crate::io::error::{Result, invalid_parameter, shape_mismatch};
use crate::io::image::{load_image, save_image};
use crate::io::plot::{PlotLabels, plot_series};
use crate::io::progress::{NoProgress, Stage, StageObserver};
use crate::model::Reconstructor;
use crate::patch::mask::masked_patch_count;
use crate::patch::ops::{denormalize_channels, normalize_channels};
use crate::patch::{MaskingStrategy, PatchGrid, PatchMask};
use crate::pipeline::outputs::OutputLayout;

/// Numeric settings for one pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Side length images are resized and cropped to
    pub input_size: usize,
    /// Fraction of patches hidden from the encoder
    pub mask_ratio: f32,
    /// Absolute difference below which a pixel counts as correct
    pub accuracy_threshold: f32,
    /// Upper clip bound for the saved reconstruction
    pub display_max: f32,
    /// Which patches the overlay image keeps
    pub overlay: OverlayMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            mask_ratio: DEFAULT_MASK_RATIO,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            display_max: DISPLAY_MAX,
            overlay: OverlayMode::default(),
        }
    }
}

/// Everything computed for one image before anything is written
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Patch grid the image was split on
    pub grid: PatchGrid,
    /// Patches hidden from the model
    pub mask: PatchMask,
    /// Display-range original, recovered from the normalized model input
    pub original: Array3<f32>,
    /// Derived images
    pub reconstruction: Reconstruction,
    /// Fraction of pixels reconstructed within the threshold
    pub accuracy: f32,
    /// Per-patch error series
    pub series: MseSeries,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct Report {
    /// Fraction of pixels reconstructed within the threshold
    pub accuracy: f32,
    /// Total patches on the grid
    pub patches: usize,
    /// Patches that were masked
    pub masked: usize,
    /// Where the artifacts were written
    pub outputs: OutputLayout,
}

/// Drives masking, inference, reconstruction and measurement for one image
pub struct Pipeline<'a, R: Reconstructor + ?Sized, M: MaskingStrategy> {
    model: &'a R,
    masking: M,
    config: PipelineConfig,
    grid: PatchGrid,
}

impl<'a, R: Reconstructor + ?Sized, M: MaskingStrategy> Pipeline<'a, R, M> {
    /// Validate the configuration against the model
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model's patch size does not tile the input size
    /// - The mask ratio leaves the visible or masked set empty
    /// - The accuracy threshold or display bound is out of range
    pub fn new(model: &'a R, masking: M, config: PipelineConfig) -> Result<Self> {
        let grid = PatchGrid::new(config.input_size, model.patch_size())?;
        masked_patch_count(grid.len(), config.mask_ratio)?;

        if config.accuracy_threshold.is_nan() || config.accuracy_threshold <= 0.0 {
            return Err(invalid_parameter(
                "accuracy_threshold",
                &config.accuracy_threshold,
                &"must be positive",
            ));
        }
        if config.display_max.is_nan() || config.display_max <= 0.0 || config.display_max > 1.0 {
            return Err(invalid_parameter(
                "display_max",
                &config.display_max,
                &"must lie in (0, 1]",
            ));
        }

        tracing::info!(
            patch_size = grid.patch_size(),
            window = ?(grid.rows(), grid.cols()),
            "pipeline ready"
        );

        Ok(Self {
            model,
            masking,
            config,
            grid,
        })
    }

    /// Patch grid every image is split on
    pub const fn grid(&self) -> &PatchGrid {
        &self.grid
    }

    /// Settings in effect
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze an already decoded display-range image
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not match the grid, the strategy
    /// fails, or the model rejects the input
    pub fn analyze_image(
        &mut self,
        image: &Array3<f32>,
        observer: &mut impl StageObserver,
    ) -> Result<Analysis> {
        let grid = self.grid;

        observer.stage(Stage::Mask);
        let mask = self.masking.select(&grid, self.config.mask_ratio)?;
        if mask.len() != grid.len() {
            return Err(shape_mismatch("masking strategy", &grid.len(), &mask.len()));
        }
        if mask.masked_count() == 0 || mask.visible_count() == 0 {
            return Err(invalid_parameter(
                "mask",
                &mask,
                &"both the visible and the masked set must be non-empty",
            ));
        }
        tracing::debug!(
            masked = mask.masked_count(),
            visible = mask.visible_count(),
            "mask selected"
        );

        observer.stage(Stage::Forward);
        let input = normalize_channels(image)?;
        let predictions = self.model.reconstruct(&input, &mask)?;

        observer.stage(Stage::Reconstruct);
        let original = denormalize_channels(&input)?;
        let reconstruction =
            Reconstruction::build(&original, &mask, &predictions, &grid, self.config.overlay)?;
        let accuracy = pixelwise_accuracy(
            &original,
            &reconstruction.reconstructed,
            self.config.accuracy_threshold,
        )?;
        let series = MseSeries::measure(
            &original,
            &reconstruction.reconstructed,
            &reconstruction.overlay,
            &grid,
            &mask,
        )?;

        Ok(Analysis {
            grid,
            mask,
            original,
            reconstruction,
            accuracy,
            series,
        })
    }

    /// Decode and analyze the image at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be loaded or analysis fails
    pub fn analyze(
        &mut self,
        path: &Path,
        observer: &mut impl StageObserver,
    ) -> Result<Analysis> {
        observer.stage(Stage::Load);
        tracing::info!(path = %path.display(), "loading image");
        let image = load_image(path, self.config.input_size)?;
        self.analyze_image(&image, observer)
    }

    /// Analyze the image at `path` and write all artifacts under `output_root`
    ///
    /// # Errors
    ///
    /// Returns an error if loading, analysis or any write fails
    pub fn run(&mut self, path: &Path, output_root: &Path) -> Result<Report> {
        self.run_observed(path, output_root, &mut NoProgress)
    }

    /// [`Pipeline::run`] with stage notifications
    ///
    /// # Errors
    ///
    /// Returns an error if loading, analysis or any write fails
    pub fn run_observed(
        &mut self,
        path: &Path,
        output_root: &Path,
        observer: &mut impl StageObserver,
    ) -> Result<Report> {
        let analysis = self.analyze(path, observer)?;

        observer.stage(Stage::Write);
        let outputs = OutputLayout::new(output_root);
        write_artifacts(&analysis, &outputs, self.config.display_max)?;

        Ok(Report {
            accuracy: analysis.accuracy,
            patches: analysis.grid.len(),
            masked: analysis.mask.masked_count(),
            outputs,
        })
    }
}

/// Write the three images and four plots of an analysis
///
/// Only the reconstruction is clipped to `display_max`; the original and
/// overlay are clamped to the full `[0, 1]` range.
///
/// # Errors
///
/// Returns an error if the output directory cannot be created or any file
/// cannot be written
pub fn write_artifacts(
    analysis: &Analysis,
    outputs: &OutputLayout,
    display_max: f32,
) -> Result<()> {
    outputs.prepare()?;

    save_image(&analysis.original, &outputs.original_image(), 1.0)?;
    save_image(
        &analysis.reconstruction.reconstructed,
        &outputs.reconstructed_image(),
        display_max,
    )?;
    save_image(&analysis.reconstruction.overlay, &outputs.overlay_image(), 1.0)?;

    let series = &analysis.series;
    plot_series(&series.overlay, &outputs.overlay_plot(), &PlotLabels::OVERLAY)?;
    plot_series(
        &series.reconstructed,
        &outputs.reconstructed_plot(),
        &PlotLabels::RECONSTRUCTED,
    )?;
    plot_series(
        &series.masked_overlay,
        &outputs.masked_overlay_plot(),
        &PlotLabels::MASKED_OVERLAY,
    )?;
    plot_series(
        &series.masked_reconstructed,
        &outputs.masked_reconstructed_plot(),
        &PlotLabels::MASKED_RECONSTRUCTED,
    )?;

    tracing::debug!(root = %outputs.root().display(), "artifacts written");
    Ok(())
}
