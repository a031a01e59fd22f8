//! Patch-space geometry, tensor rearrangement and masking

/// Patch grid dimensions and index arithmetic
pub mod grid;
/// Patch selection bitmask and masking strategies
pub mod mask;
/// Rearrangement between pixel and patch space and per-patch statistics
pub mod ops;

pub use grid::PatchGrid;
pub use mask::{MaskingStrategy, PatchMask};
