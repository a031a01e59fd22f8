//! Compute device selection from a textual identifier

use candle_core::Device;

use crate::io::error::{MaeError, Result, invalid_parameter};

/// Resolve `cpu`, `cuda`, `cuda:N`, `metal` or `metal:N`
///
/// Accelerators need the matching cargo feature; without it the backend
/// reports itself as unavailable.
///
/// # Errors
///
/// Returns an error if the identifier is malformed or the device cannot be opened
pub fn parse_device(identifier: &str) -> Result<Device> {
    let (kind, ordinal) = match identifier.split_once(':') {
        Some((kind, ordinal)) => {
            let ordinal = ordinal.parse::<usize>().map_err(|e| {
                invalid_parameter("device", &identifier, &format!("bad ordinal: {e}"))
            })?;
            (kind, Some(ordinal))
        }
        None => (identifier, None),
    };

    let opened = match kind {
        "cpu" if ordinal.is_none() => return Ok(Device::Cpu),
        "cuda" => Device::new_cuda(ordinal.unwrap_or(0)),
        "metal" => Device::new_metal(ordinal.unwrap_or(0)),
        _ => {
            return Err(invalid_parameter(
                "device",
                &identifier,
                &"expected cpu, cuda[:N] or metal[:N]",
            ));
        }
    };

    opened.map_err(|source| MaeError::Device {
        identifier: identifier.to_string(),
        source,
    })
}
