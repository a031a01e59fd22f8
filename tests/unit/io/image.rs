//! Tests for image decoding, resizing and export

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use maevis::MaeError;
    use maevis::io::image::{array_to_rgb, load_image, rgb_to_array, save_image};
    use ndarray::Array3;
    use std::fs;
    use tempfile::TempDir;

    // Tests arrays are (3, H, W) scaled into [0, 1]
    // Verified by transposing height and width
    #[test]
    fn test_rgb_to_array_layout() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([255, 0, 51]));
        let array = rgb_to_array(&image);

        assert_eq!(array.dim(), (3, 2, 3));
        assert!((array[[0, 1, 2]] - 1.0).abs() < f32::EPSILON);
        assert!(array[[1, 1, 2]].abs() < f32::EPSILON);
        assert!((array[[2, 1, 2]] - 0.2).abs() < 1e-6);
    }

    // Tests export clamps to the bound and truncates
    // Verified by rounding instead of truncating
    #[test]
    fn test_array_to_rgb_clamps_and_truncates() {
        let mut array = Array3::<f32>::zeros((3, 1, 3));
        array[[0, 0, 0]] = 1.7;
        array[[0, 0, 1]] = -0.3;
        array[[0, 0, 2]] = 0.999;

        let full = array_to_rgb(&array, 1.0).expect("three channels");
        assert_eq!(full.get_pixel(0, 0).0[0], 255);
        assert_eq!(full.get_pixel(1, 0).0[0], 0);
        assert_eq!(full.get_pixel(2, 0).0[0], 254);

        let clipped = array_to_rgb(&array, 0.996).expect("three channels");
        assert_eq!(clipped.get_pixel(0, 0).0[0], 253);
    }

    // Tests non-RGB arrays are rejected
    // Verified by reading missing channels as zero
    #[test]
    fn test_array_to_rgb_requires_three_channels() {
        let array = Array3::<f32>::zeros((4, 2, 2));
        assert!(matches!(
            array_to_rgb(&array, 1.0),
            Err(MaeError::ShapeMismatch { .. })
        ));
    }

    // Tests loading resizes non-square images to the requested square
    // Verified by resizing without cropping
    #[test]
    fn test_load_image_resizes_to_square() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("wide.png");
        RgbImage::from_pixel(60, 30, Rgb([128, 64, 32]))
            .save(&path)
            .expect("Failed to write test image");

        let array = load_image(&path, 16).expect("decodable image");
        assert_eq!(array.dim(), (3, 16, 16));
        assert!((array[[0, 8, 8]] - 128.0 / 255.0).abs() < 0.01);
    }

    // Tests the format is sniffed from content rather than extension
    // Verified by decoding by extension only
    #[test]
    fn test_load_image_ignores_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let png = temp_dir.path().join("actual.png");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]))
            .save(&png)
            .expect("Failed to write test image");
        let disguised = temp_dir.path().join("disguised.jpg");
        fs::copy(&png, &disguised).expect("Failed to copy");

        assert!(load_image(&disguised, 8).is_ok());
    }

    // Tests missing and undecodable files surface distinct errors
    // Verified by mapping every failure to ImageLoad
    #[test]
    fn test_load_image_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("missing.png");
        assert!(matches!(
            load_image(&missing, 16),
            Err(MaeError::FileSystem { .. })
        ));

        let garbage = temp_dir.path().join("garbage.png");
        fs::write(&garbage, "not an image").expect("Failed to write");
        assert!(load_image(&garbage, 16).is_err());

        assert!(matches!(
            load_image(&garbage, 0),
            Err(MaeError::InvalidParameter { .. })
        ));
    }

    // Tests saving creates parent directories
    // Verified by removing directory creation
    #[test]
    fn test_save_image_creates_parent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("dir").join("ori_img.jpg");
        let array = Array3::from_elem((3, 8, 8), 0.5_f32);

        save_image(&array, &path, 1.0).expect("writable location");
        assert!(path.exists());
    }
}
