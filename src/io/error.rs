//! Error types and path context for reconstruction diagnostics

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all pipeline operations
#[derive(Debug)]
pub enum MaeError {
    /// Failed to read or decode the input image
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to encode or write an output image
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Checkpoint missing, unreadable, or incompatible with the architecture
    CheckpointLoad {
        /// Path to the checkpoint file
        path: PathBuf,
        /// Underlying tensor library error
        source: candle_core::Error,
    },

    /// Tensor operation failed inside the model
    Model {
        /// Name of the model stage that failed
        operation: &'static str,
        /// Underlying tensor library error
        source: candle_core::Error,
    },

    /// Requested compute device is not available
    Device {
        /// Device identifier as given on the command line
        identifier: String,
        /// Underlying tensor library error
        source: candle_core::Error,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Tensor or grid dimensions disagree
    ShapeMismatch {
        /// Operation that detected the mismatch
        operation: &'static str,
        /// Shape the operation required
        expected: String,
        /// Shape it received
        actual: String,
    },

    /// Failed to render or save a plot
    Plot {
        /// Path of the plot being written
        path: PathBuf,
        /// Description of the failure
        reason: String,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for MaeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::CheckpointLoad { path, source } => {
                write!(
                    f,
                    "Failed to load checkpoint '{}': {source}",
                    path.display()
                )
            }
            Self::Model { operation, source } => {
                write!(f, "Model error in {operation}: {source}")
            }
            Self::Device { identifier, source } => {
                write!(f, "Device '{identifier}' is unavailable: {source}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ShapeMismatch {
                operation,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Shape mismatch in {operation}: expected {expected}, got {actual}"
                )
            }
            Self::Plot { path, reason } => {
                write!(f, "Failed to plot '{}': {reason}", path.display())
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for MaeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::CheckpointLoad { source, .. }
            | Self::Model { source, .. }
            | Self::Device { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for pipeline results
pub type Result<T> = std::result::Result<T, MaeError>;

/// Attaches the path and operation to a bare I/O failure
pub trait PathContext<T> {
    /// Convert an I/O error into [`MaeError::FileSystem`] naming `path`
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> PathContext<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| MaeError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<ndarray::ShapeError> for MaeError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Computation {
            operation: "array reshape",
            reason: err.to_string(),
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MaeError {
    MaeError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> MaeError {
    MaeError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a shape mismatch error from any debug-printable shapes
pub fn shape_mismatch(
    operation: &'static str,
    expected: &impl fmt::Debug,
    actual: &impl fmt::Debug,
) -> MaeError {
    MaeError::ShapeMismatch {
        operation,
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    }
}

/// Wrap a tensor library error raised by the named model stage
pub fn model_error(operation: &'static str) -> impl FnOnce(candle_core::Error) -> MaeError {
    move |source| MaeError::Model { operation, source }
}
