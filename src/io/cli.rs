//! Command-line interface for reconstructing one image or a directory of images

use crate::analysis::reconstruction::OverlayMode;
use crate::io::configuration::{
    DEFAULT_CHECKPOINT_KEY, DEFAULT_DEVICE, DEFAULT_DROP_PATH, DEFAULT_INPUT_SIZE,
    DEFAULT_MASK_RATIO, DEFAULT_MODEL, DEFAULT_SEED, IMAGE_EXTENSIONS,
};
use crate::io::error::{PathContext, Result, invalid_parameter};
use crate::io::progress::{NoProgress, ProgressManager};
use crate::model::Reconstructor;
use crate::model::checkpoint::load_model;
use crate::model::config::MaeConfig;
use crate::model::device::parse_device;
use crate::patch::MaskingStrategy;
use crate::patch::mask::{CheckerboardMasking, RandomMasking};
use crate::pipeline::{Pipeline, PipelineConfig, Report};
use clap::{Parser, ValueEnum};
use indicatif::MultiProgress;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Patch selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaskingKind {
    /// Seeded uniform selection of `floor(ratio * patches)` patches
    Random,
    /// Every patch whose row plus column is odd
    Checkerboard,
}

/// Which patches the overlay image keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverlayKind {
    /// Zero the masked patches
    Visible,
    /// Zero the visible patches
    Masked,
}

impl From<OverlayKind> for OverlayMode {
    fn from(kind: OverlayKind) -> Self {
        match kind {
            OverlayKind::Visible => Self::Visible,
            OverlayKind::Masked => Self::Masked,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "maevis")]
#[command(
    author,
    version,
    about = "Visualize masked autoencoder reconstructions and per-patch error"
)]
/// Command-line arguments for the reconstruction tool
pub struct Cli {
    /// Input image, or a directory of images
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Directory receiving images and plots
    #[arg(value_name = "SAVE_PATH")]
    pub save_path: PathBuf,

    /// Checkpoint of the model (.pth or .safetensors)
    #[arg(value_name = "MODEL_PATH")]
    pub model_path: PathBuf,

    /// Side length images are resized and cropped to
    #[arg(long, alias = "input_size", default_value_t = DEFAULT_INPUT_SIZE)]
    pub input_size: usize,

    /// Compute device: cpu, cuda[:N] or metal[:N]
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    pub device: String,

    /// Fraction of patches hidden from the encoder
    #[arg(long, alias = "mask_ratio", default_value_t = DEFAULT_MASK_RATIO)]
    pub mask_ratio: f32,

    /// Model architecture name
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Drop path rate (inactive at inference)
    #[arg(long, alias = "drop_path", default_value_t = DEFAULT_DROP_PATH)]
    pub drop_path: f64,

    /// Random seed for reproducible masks
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Patch selection policy
    #[arg(long, value_enum, default_value_t = MaskingKind::Random)]
    pub masking: MaskingKind,

    /// Which patches the overlay image keeps
    #[arg(long, value_enum, default_value_t = OverlayKind::Visible)]
    pub overlay: OverlayKind,

    /// Top-level key of the state dict in pickle checkpoints
    #[arg(long, alias = "checkpoint_key", default_value = DEFAULT_CHECKPOINT_KEY)]
    pub checkpoint_key: String,

    /// Suppress progress and informational output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Pipeline settings selected by the flags
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_size: self.input_size,
            mask_ratio: self.mask_ratio,
            overlay: self.overlay.into(),
            ..PipelineConfig::default()
        }
    }

    /// Fresh masking strategy; every image gets the same seeded sequence
    pub fn masking_strategy(&self) -> Box<dyn MaskingStrategy> {
        match self.masking {
            MaskingKind::Random => Box::new(RandomMasking::new(self.seed)),
            MaskingKind::Checkerboard => Box::new(CheckerboardMasking),
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Orchestrates model loading and per-image processing with progress tracking
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Progress bar group the log writer must draw around, if bars are shown
    pub fn multi_progress(&self) -> Option<MultiProgress> {
        self.progress_manager
            .as_ref()
            .map(ProgressManager::multi_progress)
    }

    /// Load the model named on the command line, then process every image
    ///
    /// # Errors
    ///
    /// Returns an error if the device, architecture or checkpoint is
    /// invalid, or any image fails
    pub fn process(&mut self) -> Result<Vec<Report>> {
        let files = self.collect_files()?;
        if files.is_empty() {
            tracing::warn!(path = %self.cli.image.display(), "no images found");
            return Ok(Vec::new());
        }

        let device = parse_device(&self.cli.device)?;
        tracing::info!("Creating model: {}", self.cli.model);
        let config = MaeConfig::from_name(&self.cli.model)?.with_drop_path(self.cli.drop_path);
        let model = load_model(
            &self.cli.model_path,
            Some(self.cli.checkpoint_key.as_str()),
            config,
            &device,
        )?;
        tracing::info!("Patch size = {}", model.patch_size());

        self.process_files(&model, &files)
    }

    /// Process the target with an already constructed model
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid or any image fails
    pub fn process_with<R: Reconstructor + ?Sized>(&mut self, model: &R) -> Result<Vec<Report>> {
        let files = self.collect_files()?;
        self.process_files(model, &files)
    }

    fn process_files<R: Reconstructor + ?Sized>(
        &mut self,
        model: &R,
        files: &[PathBuf],
    ) -> Result<Vec<Report>> {
        tracing::info!(cli = ?self.cli, "run configuration");

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        let roots = self.output_roots(files);
        let mut reports = Vec::with_capacity(files.len());
        for (index, (file, root)) in files.iter().zip(&roots).enumerate() {
            reports.push(self.process_file(model, file, root, index)?);
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        Ok(reports)
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.image;
        if target.is_file() {
            Ok(vec![target.clone()])
        } else if target.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(target).with_path(target, "read directory")? {
                let path = entry.with_path(target, "read directory entry")?.path();
                if path.is_file() && has_image_extension(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_parameter(
                "image",
                &target.display(),
                &"must be an image file or a directory of images",
            ))
        }
    }

    fn is_batch(&self) -> bool {
        self.cli.image.is_dir()
    }

    /// Output directory for each file, in the same order
    ///
    /// Artifacts for a single image go straight into the save path. A
    /// directory target gets one subdirectory per image stem, widened to
    /// `<stem>_<ext>` for stems shared by several files.
    pub fn output_roots(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        if !self.is_batch() {
            return vec![self.cli.save_path.clone(); files.len()];
        }

        let mut stem_counts: HashMap<&OsStr, usize> = HashMap::new();
        for file in files {
            *stem_counts.entry(file.file_stem().unwrap_or_default()).or_default() += 1;
        }

        files
            .iter()
            .map(|file| {
                let stem = file.file_stem().unwrap_or_default();
                if stem_counts.get(stem).copied().unwrap_or_default() > 1 {
                    let mut name = stem.to_os_string();
                    name.push("_");
                    name.push(file.extension().unwrap_or_default());
                    self.cli.save_path.join(name)
                } else {
                    self.cli.save_path.join(stem)
                }
            })
            .collect()
    }

    // Allow print for the accuracy result, which is the tool's primary output
    #[allow(clippy::print_stdout)]
    fn process_file<R: Reconstructor + ?Sized>(
        &mut self,
        model: &R,
        input_path: &Path,
        output_root: &Path,
        index: usize,
    ) -> Result<Report> {
        let mut pipeline = Pipeline::new(
            model,
            self.cli.masking_strategy(),
            self.cli.pipeline_config(),
        )?;

        let report = if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path);
            let report = pipeline.run_observed(input_path, output_root, pm)?;
            pm.complete_file(index);
            report
        } else {
            pipeline.run_observed(input_path, output_root, &mut NoProgress)?
        };

        let line = if self.is_batch() {
            let name = input_path.file_name().unwrap_or_default().to_string_lossy();
            format!("{name} Accuracy: {}", report.accuracy)
        } else {
            format!("Accuracy: {}", report.accuracy)
        };
        self.progress_manager.as_ref().map_or_else(
            || println!("{line}"),
            |pm| pm.suspend(|| println!("{line}")),
        );

        Ok(report)
    }
}
