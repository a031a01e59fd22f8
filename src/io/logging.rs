//! Diagnostic log output on stderr

use std::io::{self, Write};

use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const fn default_directive(quiet: bool) -> &'static str {
    if quiet { "warn" } else { "info" }
}

/// Build the log filter, preferring `RUST_LOG` when it parses
pub fn build_filter(quiet: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(quiet)))
}

/// Stderr writer that clears live progress bars for the duration of a write
#[derive(Clone)]
pub struct LogWriter {
    progress: MultiProgress,
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LogWriter {
    /// Writer that redraws `progress` after every log line
    ///
    /// Without bars writes go straight through.
    pub fn new(progress: Option<MultiProgress>) -> Self {
        Self {
            progress: progress
                .unwrap_or_else(|| MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        }
    }

    fn with_bars_hidden<R>(&self, write: impl FnOnce() -> R) -> R {
        self.progress.suspend(write)
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_bars_hidden(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.with_bars_hidden(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Install the global subscriber; later calls are ignored
///
/// Log lines are written around `progress` when bars are on screen.
pub fn init(quiet: bool, progress: Option<MultiProgress>) {
    let writer = LogWriter::new(progress);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(quiet))
        .with_writer(move || writer.clone())
        .with_target(false)
        .try_init();
}
