//! Parameter maps from disk and model construction on top of them
//!
//! `.safetensors` files are read directly. Anything else is treated as a
//! PyTorch pickle archive whose state dict sits under a top-level key.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;

use crate::io::error::{MaeError, Result};
use crate::model::config::MaeConfig;
use crate::model::mae::MaeModel;

// Prefix left behind by checkpoints saved from a data-parallel wrapper
const DATA_PARALLEL_PREFIX: &str = "module.";

/// On-disk layout of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointFormat {
    /// Flat safetensors archive
    SafeTensors,
    /// PyTorch pickle (`.pth`, `.pt`, `.bin`)
    Pickle,
}

impl CheckpointFormat {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("safetensors") => Self::SafeTensors,
            _ => Self::Pickle,
        }
    }
}

fn load_error(path: &Path) -> impl FnOnce(candle_core::Error) -> MaeError {
    move |source| MaeError::CheckpointLoad {
        path: path.to_path_buf(),
        source,
    }
}

/// Read every tensor of a checkpoint
///
/// For pickle archives the tensors under `key` are returned; when the key
/// is absent or holds nothing the archive is retried as a bare state dict.
/// Names lose any `module.` prefix.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or holds no tensors
pub fn load_tensors(
    path: &Path,
    key: Option<&str>,
    device: &Device,
) -> Result<HashMap<String, Tensor>> {
    if !path.is_file() {
        return Err(load_error(path)(candle_core::Error::msg(
            "checkpoint file not found",
        )));
    }

    let tensors: HashMap<String, Tensor> = match CheckpointFormat::from_path(path) {
        CheckpointFormat::SafeTensors => {
            candle_core::safetensors::load(path, device).map_err(load_error(path))?
        }
        CheckpointFormat::Pickle => match candle_core::pickle::read_all_with_key(path, key) {
            Ok(entries) if !entries.is_empty() || key.is_none() => entries.into_iter().collect(),
            // A missing key is an error in the reader, an empty one is not
            _ => {
                tracing::debug!(?key, "checkpoint key missing or empty, reading bare state dict");
                candle_core::pickle::read_all_with_key(path, None)
                    .map_err(load_error(path))?
                    .into_iter()
                    .collect()
            }
        },
    };

    if tensors.is_empty() {
        return Err(load_error(path)(candle_core::Error::msg(format!(
            "no tensors found (key {key:?})"
        ))));
    }

    Ok(tensors
        .into_iter()
        .map(|(name, tensor)| {
            let name = name
                .strip_prefix(DATA_PARALLEL_PREFIX)
                .map_or_else(|| name.clone(), str::to_string);
            (name, tensor)
        })
        .collect())
}

/// Construct a model of the given architecture and fill it from a checkpoint
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be read or does not match the
/// architecture
pub fn load_model(
    path: &Path,
    key: Option<&str>,
    config: MaeConfig,
    device: &Device,
) -> Result<MaeModel> {
    config.validate()?;
    let tensors = load_tensors(path, key, device)?;
    tracing::debug!(tensors = tensors.len(), path = %path.display(), "checkpoint read");

    let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
    MaeModel::load(&vb, config).map_err(load_error(path))
}
