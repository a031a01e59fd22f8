//! Tests for pixelwise accuracy and per-patch mean squared error

#[cfg(test)]
mod tests {
    use maevis::analysis::metrics::{MseSeries, masked_patch_mse, patch_mse, pixelwise_accuracy};
    use maevis::patch::{PatchGrid, PatchMask};
    use ndarray::{Array3, s};

    fn grid() -> PatchGrid {
        PatchGrid::new(4, 2).expect("valid grid")
    }

    // Tests identical images score perfect accuracy
    // Verified by using <= against a zero threshold
    #[test]
    fn test_accuracy_identical() {
        let image = Array3::from_elem((3, 4, 4), 0.3_f32);
        let accuracy = pixelwise_accuracy(&image, &image, 0.05).expect("same shape");
        assert!((accuracy - 1.0).abs() < f32::EPSILON);
    }

    // Tests the threshold is a strict bound
    // Verified by changing < to <=
    #[test]
    fn test_accuracy_threshold_strict() {
        let original = Array3::<f32>::zeros((3, 2, 2));
        let mut other = original.clone();
        other[[0, 0, 0]] = 0.5;
        other[[1, 1, 1]] = 0.01;

        let accuracy = pixelwise_accuracy(&original, &other, 0.05).expect("same shape");
        assert!((accuracy - 11.0 / 12.0).abs() < 1e-6);

        let strict = pixelwise_accuracy(&original, &other, 0.01).expect("same shape");
        assert!((strict - 10.0 / 12.0).abs() < 1e-6);
    }

    // Tests accuracy never increases as noise grows
    // Verified by counting pixels above the threshold
    #[test]
    fn test_accuracy_monotone_in_noise() {
        let original = Array3::from_shape_fn((3, 8, 8), |(c, y, x)| {
            ((c + y * 8 + x) % 10) as f32 / 10.0
        });
        let noise = Array3::from_shape_fn((3, 8, 8), |(c, y, x)| {
            ((c * 31 + y * 7 + x * 13) % 17) as f32 / 17.0 - 0.5
        });

        let mut previous = 1.0_f32;
        for level in [0.0_f32, 0.02, 0.05, 0.1, 0.3] {
            let noisy = &original + &noise.mapv(|n| n * level);
            let accuracy = pixelwise_accuracy(&original, &noisy, 0.05).expect("same shape");
            assert!(accuracy <= previous + f32::EPSILON, "level {level}");
            previous = accuracy;
        }
        assert!(previous < 1.0);
    }

    // Tests per-patch MSE is row-major and local to each patch
    // Verified by indexing patches column-major
    #[test]
    fn test_patch_mse_locality() {
        let original = Array3::<f32>::zeros((3, 4, 4));
        let mut other = original.clone();
        // Top-right patch, every channel, every pixel off by 0.5
        other.slice_mut(s![.., 0..2, 2..4]).fill(0.5);

        let mse = patch_mse(&original, &other, &grid()).expect("matching grid");
        assert_eq!(mse.len(), 4);
        assert!(mse[0].abs() < f32::EPSILON);
        assert!((mse[1] - 0.25).abs() < 1e-6);
        assert!(mse[2].abs() < f32::EPSILON);
        assert!(mse[3].abs() < f32::EPSILON);
    }

    // Tests the masked series follows ascending masked index order
    // Verified by iterating visible indices
    #[test]
    fn test_masked_patch_mse_order() {
        let original = Array3::<f32>::zeros((3, 4, 4));
        let mut other = original.clone();
        other.slice_mut(s![.., 2..4, 2..4]).fill(1.0);
        let mask = PatchMask::from_indices(4, &[3, 0]).expect("indices in range");

        let mse = masked_patch_mse(&original, &other, &grid(), &mask).expect("matching grid");
        assert_eq!(mse.len(), 2);
        assert!(mse[0].abs() < f32::EPSILON);
        assert!((mse[1] - 1.0).abs() < 1e-6);
    }

    // Tests shape disagreements surface as errors
    // Verified by truncating the zip to the shorter image
    #[test]
    fn test_shape_mismatch_rejected() {
        let a = Array3::<f32>::zeros((3, 4, 4));
        let b = Array3::<f32>::zeros((3, 4, 2));
        assert!(pixelwise_accuracy(&a, &b, 0.05).is_err());
        assert!(patch_mse(&a, &b, &grid()).is_err());

        let wrong_grid = PatchGrid::new(8, 2).expect("valid grid");
        assert!(patch_mse(&a, &a, &wrong_grid).is_err());
        assert!(masked_patch_mse(&a, &a, &grid(), &PatchMask::new(3)).is_err());
    }

    // Tests the four series have the documented lengths
    // Verified by measuring masked series over every patch
    #[test]
    fn test_series_lengths() {
        let image = Array3::from_elem((3, 4, 4), 0.2_f32);
        let mask = PatchMask::from_indices(4, &[1, 2, 3]).expect("indices in range");
        let series =
            MseSeries::measure(&image, &image, &image, &grid(), &mask).expect("matching grid");

        assert_eq!(series.reconstructed.len(), 4);
        assert_eq!(series.overlay.len(), 4);
        assert_eq!(series.masked_reconstructed.len(), 3);
        assert_eq!(series.masked_overlay.len(), 3);
    }
}
