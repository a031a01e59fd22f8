//! Image decoding into `(3, H, W)` arrays and encoding back to files

use std::path::Path;

use image::imageops::FilterType;
use image::{ImageBuffer, ImageReader, Rgb, RgbImage};
use ndarray::Array3;

use crate::io::configuration::CHANNELS;
use crate::io::error::{MaeError, PathContext, Result, invalid_parameter, shape_mismatch};

/// Decode an image, resize it to cover an `input_size` square and
/// center-crop, returning display-range `[0, 1]` RGB values
///
/// The format is sniffed from the file contents rather than the extension.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or read
/// - The contents cannot be decoded as an image
/// - `input_size` is zero or exceeds `u32`
pub fn load_image(path: &Path, input_size: usize) -> Result<Array3<f32>> {
    let side = u32::try_from(input_size)
        .ok()
        .filter(|&side| side > 0)
        .ok_or_else(|| invalid_parameter("input_size", &input_size, &"must be 1..=u32::MAX"))?;

    let decoded = ImageReader::open(path)
        .with_path(path, "open image")?
        .with_guessed_format()
        .with_path(path, "read image header")?
        .decode()
        .map_err(|source| MaeError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;

    let rgb = decoded
        .resize_to_fill(side, side, FilterType::Triangle)
        .to_rgb8();
    Ok(rgb_to_array(&rgb))
}

/// Convert 8-bit RGB pixels to a `(3, H, W)` array in `[0, 1]`
pub fn rgb_to_array(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn(
        (CHANNELS, height as usize, width as usize),
        |(channel, y, x)| {
            let value = image
                .get_pixel(x as u32, y as u32)
                .0
                .get(channel)
                .copied()
                .unwrap_or(0);
            f32::from(value) / 255.0
        },
    )
}

// Scale then truncate, so 0.999 maps to 254 rather than 255
fn to_byte(value: f32, max: f32) -> u8 {
    (value.clamp(0.0, max) * 255.0) as u8
}

/// Convert a `(3, H, W)` array to 8-bit RGB, clamping values to `[0, max]`
///
/// # Errors
///
/// Returns an error if the array is not three-channel or too large for an image
pub fn array_to_rgb(image: &Array3<f32>, max: f32) -> Result<RgbImage> {
    let (channels, height, width) = image.dim();
    if channels != CHANNELS {
        return Err(shape_mismatch("image export", &CHANNELS, &channels));
    }
    let width = u32::try_from(width).map_err(|e| invalid_parameter("width", &width, &e))?;
    let height = u32::try_from(height).map_err(|e| invalid_parameter("height", &height, &e))?;

    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        let channel = |c: usize| {
            let value = image
                .get((c, y as usize, x as usize))
                .copied()
                .unwrap_or(0.0);
            to_byte(value, max)
        };
        Rgb([channel(0), channel(1), channel(2)])
    }))
}

/// Encode a `(3, H, W)` array to `path`, format chosen by extension
///
/// # Errors
///
/// Returns an error if:
/// - The array cannot be converted to an image
/// - The parent directory cannot be created
/// - The image cannot be encoded or written
pub fn save_image(image: &Array3<f32>, path: &Path, max: f32) -> Result<()> {
    let rgb = array_to_rgb(image, max)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }

    rgb.save(path).map_err(|source| MaeError::ImageExport {
        path: path.to_path_buf(),
        source,
    })
}
