/// Command-line parsing and per-file orchestration
pub mod cli;
/// Default parameters and output file names
pub mod configuration;
/// Error types and context helpers
pub mod error;
/// Image decoding, resizing and export
pub mod image;
/// Diagnostic log subscriber setup
pub mod logging;
/// Per-patch error line plots
pub mod plot;
/// Stage progress display
pub mod progress;
