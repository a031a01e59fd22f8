//! Tests for pipeline validation, analysis and artifact writing

#[cfg(test)]
mod tests {
    use maevis::MaeError;
    use maevis::analysis::reconstruction::OverlayMode;
    use maevis::io::progress::{Stage, StageObserver};
    use maevis::model::oracle::OracleReconstructor;
    use maevis::patch::PatchMask;
    use maevis::patch::mask::{FixedMasking, RandomMasking};
    use maevis::pipeline::executor::write_artifacts;
    use maevis::pipeline::{OutputLayout, Pipeline, PipelineConfig};
    use ndarray::{Array3, s};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        stages: Vec<Stage>,
    }

    impl StageObserver for Recorder {
        fn stage(&mut self, stage: Stage) {
            self.stages.push(stage);
        }
    }

    fn config(input_size: usize) -> PipelineConfig {
        PipelineConfig {
            input_size,
            ..PipelineConfig::default()
        }
    }

    fn image(size: usize) -> Array3<f32> {
        Array3::from_shape_fn((3, size, size), |(c, y, x)| {
            0.05 + 0.9 * (((c * 7 + y * 3 + x * 5) % 23) as f32 / 23.0)
        })
    }

    // Tests configuration validation at construction
    // Verified by deferring the ratio check to the first image
    #[test]
    fn test_new_validates_config() {
        let oracle = OracleReconstructor::new(16);

        assert!(Pipeline::new(&oracle, RandomMasking::new(0), config(224)).is_ok());
        assert!(matches!(
            Pipeline::new(&oracle, RandomMasking::new(0), config(200)),
            Err(MaeError::ShapeMismatch { .. })
        ));

        let bad_ratio = PipelineConfig {
            mask_ratio: 1.0,
            ..config(224)
        };
        assert!(Pipeline::new(&oracle, RandomMasking::new(0), bad_ratio).is_err());

        let bad_threshold = PipelineConfig {
            accuracy_threshold: 0.0,
            ..config(224)
        };
        assert!(Pipeline::new(&oracle, RandomMasking::new(0), bad_threshold).is_err());

        let bad_display = PipelineConfig {
            display_max: 1.5,
            ..config(224)
        };
        assert!(Pipeline::new(&oracle, RandomMasking::new(0), bad_display).is_err());
    }

    // Tests an oracle analysis reproduces the image with perfect accuracy
    // Verified by comparing against the pre-normalization image
    #[test]
    fn test_analyze_image_with_oracle() {
        let oracle = OracleReconstructor::new(16);
        let mut pipeline =
            Pipeline::new(&oracle, RandomMasking::new(42), config(64)).expect("valid config");
        let mut recorder = Recorder::default();

        let analysis = pipeline
            .analyze_image(&image(64), &mut recorder)
            .expect("analysis succeeds");

        assert_eq!(analysis.grid.len(), 16);
        assert_eq!(analysis.mask.masked_count(), 12);
        assert!((analysis.accuracy - 1.0).abs() < 1e-6);
        assert_eq!(analysis.series.reconstructed.len(), 16);
        assert_eq!(analysis.series.masked_reconstructed.len(), 12);
        assert!(analysis.series.masked_reconstructed.iter().all(|&mse| mse < 1e-9));
        assert_eq!(
            recorder.stages,
            vec![Stage::Mask, Stage::Forward, Stage::Reconstruct]
        );
    }

    // Tests the overlay error equals the patch energy at masked patches
    // Verified by wiring the reconstruction error into the overlay series
    #[test]
    fn test_overlay_series_reflects_zeroed_patches() {
        let oracle = OracleReconstructor::new(8);
        let mask = PatchMask::from_indices(4, &[0]).expect("in range");
        let mut pipeline =
            Pipeline::new(&oracle, FixedMasking::new(mask), config(16)).expect("valid config");

        let analysis = pipeline
            .analyze_image(&image(16), &mut Recorder::default())
            .expect("analysis succeeds");

        let patch = analysis.original.slice(s![.., 0..8, 0..8]);
        let energy = patch.iter().map(|v| v * v).sum::<f32>() / patch.len() as f32;
        assert!((analysis.series.masked_overlay[0] - energy).abs() < 1e-5);
        assert!(analysis.series.overlay[1] < 1e-9);
    }

    // Tests the inverted overlay zeroes visible patches instead
    // Verified by ignoring the overlay flag
    #[test]
    fn test_masked_overlay_mode() {
        let oracle = OracleReconstructor::new(8);
        let mask = PatchMask::from_indices(4, &[0]).expect("in range");
        let settings = PipelineConfig {
            overlay: OverlayMode::Masked,
            ..config(16)
        };
        let mut pipeline =
            Pipeline::new(&oracle, FixedMasking::new(mask), settings).expect("valid config");

        let analysis = pipeline
            .analyze_image(&image(16), &mut Recorder::default())
            .expect("analysis succeeds");

        assert!(analysis.series.masked_overlay[0] < 1e-9);
        assert!(analysis.series.overlay[1] > 0.0);
    }

    // Tests masks without visible patches are rejected
    // Verified by skipping the non-empty check
    #[test]
    fn test_rejects_degenerate_mask() {
        let oracle = OracleReconstructor::new(8);
        let all = PatchMask::from_indices(4, &[0, 1, 2, 3]).expect("in range");
        let mut pipeline =
            Pipeline::new(&oracle, FixedMasking::new(all), config(16)).expect("valid config");

        assert!(matches!(
            pipeline.analyze_image(&image(16), &mut Recorder::default()),
            Err(MaeError::InvalidParameter { .. })
        ));
    }

    // Tests a full run writes all seven artifacts
    // Verified by skipping the masked-patch plots
    #[test]
    fn test_run_writes_artifacts() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let input = temp_dir.path().join("input.png");
        image::RgbImage::from_fn(40, 40, |x, y| image::Rgb([(x * 6) as u8, (y * 6) as u8, 90]))
            .save(&input)
            .expect("Failed to write test image");
        let root = temp_dir.path().join("out");

        let oracle = OracleReconstructor::new(16);
        let mut pipeline =
            Pipeline::new(&oracle, RandomMasking::new(42), config(32)).expect("valid config");
        let report = pipeline.run(&input, &root).expect("run succeeds");

        assert_eq!(report.patches, 4);
        assert_eq!(report.masked, 3);
        assert_eq!(report.outputs.root(), root.as_path());
        for path in report.outputs.all() {
            assert!(path.exists(), "{} should exist", path.display());
        }
    }

    // Tests artifacts can be written from an analysis directly
    // Verified by clamping the original to the display bound
    #[test]
    fn test_write_artifacts() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let oracle = OracleReconstructor::new(8);
        let mut pipeline =
            Pipeline::new(&oracle, RandomMasking::new(1), config(16)).expect("valid config");
        let analysis = pipeline
            .analyze_image(&Array3::from_elem((3, 16, 16), 1.0), &mut Recorder::default())
            .expect("analysis succeeds");

        let layout = OutputLayout::new(temp_dir.path().join("direct"));
        write_artifacts(&analysis, &layout, 0.996).expect("writable location");

        let original = image::open(layout.original_image()).expect("valid image").to_rgb8();
        let reconstructed = image::open(layout.reconstructed_image())
            .expect("valid image")
            .to_rgb8();
        assert!(original.get_pixel(4, 4).0[0] >= 250);
        assert!(reconstructed.get_pixel(4, 4).0[0] <= 254);
    }

    // Tests the pipeline exposes its grid and settings
    // Verified by returning the default config
    #[test]
    fn test_accessors() {
        let oracle = OracleReconstructor::new(16);
        let pipeline =
            Pipeline::new(&oracle, RandomMasking::new(0), config(32)).expect("valid config");
        assert_eq!(pipeline.grid().len(), 4);
        assert_eq!(pipeline.config().input_size, 32);
    }
}
