//! Single-image reconstruction pipeline and its on-disk artifacts

/// Pipeline configuration, execution and reports
pub mod executor;
/// Artifact file layout under one output root
pub mod outputs;

pub use executor::{Analysis, Pipeline, PipelineConfig, Report};
pub use outputs::OutputLayout;
