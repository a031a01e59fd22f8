//! Per-image stage progress with automatic batching for large sets

use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

/// Steps every image passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Decode and resize
    Load,
    /// Choose hidden patches
    Mask,
    /// Run the model
    Forward,
    /// Rebuild images and measure error
    Reconstruct,
    /// Encode images and plots
    Write,
}

impl Stage {
    /// Stages in execution order
    pub const ALL: [Self; 5] = [
        Self::Load,
        Self::Mask,
        Self::Forward,
        Self::Reconstruct,
        Self::Write,
    ];

    /// Short label shown next to the bar
    pub const fn label(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Mask => "mask",
            Self::Forward => "forward",
            Self::Reconstruct => "reconstruct",
            Self::Write => "write",
        }
    }

    /// Number of stages finished once this one starts
    pub const fn position(self) -> u64 {
        match self {
            Self::Load => 0,
            Self::Mask => 1,
            Self::Forward => 2,
            Self::Reconstruct => 3,
            Self::Write => 4,
        }
    }
}

/// Receives stage transitions from the pipeline
pub trait StageObserver {
    /// Called as each stage begins
    fn stage(&mut self, stage: Stage);
}

/// Observer that ignores every transition
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl StageObserver for NoProgress {
    fn stage(&mut self, _stage: Stage) {}
}

/// Coordinates progress display for batch operations
///
/// Shows one stage bar per image for small batches and adds a single
/// batch bar once the file count grows past the display limit
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_bars: Vec<ProgressBar>,
    active: Option<usize>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} [{bar:30.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Images: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_bars: Vec::new(),
            active: None,
        }
    }

    /// Initialize progress bars based on file count
    pub fn initialize(&mut self, file_count: usize) {
        // Switch to batch mode for large file sets to avoid terminal spam
        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        let bars_to_create = file_count.min(MAX_INDIVIDUAL_PROGRESS_BARS);
        for _ in 0..bars_to_create {
            let pb = ProgressBar::new(Stage::ALL.len() as u64);
            pb.set_style(STAGE_STYLE.clone());
            self.file_bars.push(self.multi_progress.add(pb));
        }
    }

    /// Handle to the bar group, for writers that must draw around it
    pub fn multi_progress(&self) -> MultiProgress {
        self.multi_progress.clone()
    }

    /// Run `f` with every bar cleared from the terminal, then redraw
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.multi_progress.suspend(f)
    }

    /// Number of per-image bars on screen
    pub fn visible_bars(&self) -> usize {
        self.file_bars.len()
    }

    /// Whether the batch bar is shown
    pub const fn is_batched(&self) -> bool {
        self.batch_bar.is_some()
    }

    // Bars are reused round-robin once there are more files than bars
    fn bar(&self, index: usize) -> Option<&ProgressBar> {
        if self.file_bars.is_empty() {
            return None;
        }
        self.file_bars.get(index % self.file_bars.len())
    }

    /// Configure a bar for a new image
    pub fn start_file(&mut self, index: usize, path: &Path) {
        self.active = Some(index);
        let display_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if let Some(bar) = self.bar(index) {
            bar.set_position(0);
            bar.set_prefix(display_name);
            bar.set_message(String::new());
        }
    }

    /// Mark the active image as complete and advance the batch bar
    pub fn complete_file(&mut self, index: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(bar) = self.bar(index) {
            bar.set_position(Stage::ALL.len() as u64);
            bar.set_message("✓ done");
        }
        self.active = None;
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All images processed");
        }
        let _ = self.multi_progress.clear();
    }
}

impl StageObserver for ProgressManager {
    fn stage(&mut self, stage: Stage) {
        if let Some(bar) = self.active.and_then(|index| self.bar(index)) {
            bar.set_position(stage.position());
            bar.set_message(stage.label());
        }
    }
}
