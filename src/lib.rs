//! Masked autoencoder reconstruction viewer and per-patch error diagnostics
//!
//! An image is split into square patches, most of them are hidden, and a
//! pretrained masked autoencoder predicts the hidden pixels. The crate
//! rebuilds the original, reconstructed and overlay images and measures
//! how far the reconstruction strays from the source, patch by patch.

#![deny(unsafe_code)]

/// Reconstruction assembly, pixel accuracy and per-patch error
pub mod analysis;
/// Input/output operations, logging and error handling
pub mod io;
/// Masked autoencoder models and checkpoint loading
pub mod model;
/// Patch grid geometry, rearrangement and masking
pub mod patch;
/// Single-image reconstruction pipeline
pub mod pipeline;

pub use io::error::{MaeError, Result};
