//! Reconstruction assembly and error measurement

/// Pixelwise accuracy and per-patch mean squared error
pub mod metrics;
/// Pixel-space images rebuilt from model predictions
pub mod reconstruction;
