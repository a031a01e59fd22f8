//! File layout for the seven artifacts written per image
//!
//! Every artifact lives directly under one caller-chosen root.

use std::path::{Path, PathBuf};

use crate::io::configuration::{
    MASKED_OVERLAY_MSE_PLOT_FILE, MASKED_RECONSTRUCTED_MSE_PLOT_FILE, ORIGINAL_IMAGE_FILE,
    OVERLAY_IMAGE_FILE, OVERLAY_MSE_PLOT_FILE, RECONSTRUCTED_IMAGE_FILE,
    RECONSTRUCTED_MSE_PLOT_FILE,
};
use crate::io::error::{PathContext, Result};

/// Artifact paths for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Place every artifact under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the artifacts
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Denormalized input image
    pub fn original_image(&self) -> PathBuf {
        self.root.join(ORIGINAL_IMAGE_FILE)
    }

    /// Reconstructed image
    pub fn reconstructed_image(&self) -> PathBuf {
        self.root.join(RECONSTRUCTED_IMAGE_FILE)
    }

    /// Overlay image
    pub fn overlay_image(&self) -> PathBuf {
        self.root.join(OVERLAY_IMAGE_FILE)
    }

    /// Plot of overlay error over every patch
    pub fn overlay_plot(&self) -> PathBuf {
        self.root.join(OVERLAY_MSE_PLOT_FILE)
    }

    /// Plot of reconstruction error over every patch
    pub fn reconstructed_plot(&self) -> PathBuf {
        self.root.join(RECONSTRUCTED_MSE_PLOT_FILE)
    }

    /// Plot of overlay error over masked patches
    pub fn masked_overlay_plot(&self) -> PathBuf {
        self.root.join(MASKED_OVERLAY_MSE_PLOT_FILE)
    }

    /// Plot of reconstruction error over masked patches
    pub fn masked_reconstructed_plot(&self) -> PathBuf {
        self.root.join(MASKED_RECONSTRUCTED_MSE_PLOT_FILE)
    }

    /// Every artifact path: three images followed by four plots
    pub fn all(&self) -> [PathBuf; 7] {
        [
            self.original_image(),
            self.reconstructed_image(),
            self.overlay_image(),
            self.overlay_plot(),
            self.reconstructed_plot(),
            self.masked_overlay_plot(),
            self.masked_reconstructed_plot(),
        ]
    }

    /// Create the root directory if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).with_path(&self.root, "create output directory")
    }
}
