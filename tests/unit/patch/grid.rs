//! Tests for patch grid validation and index arithmetic

#[cfg(test)]
mod tests {
    use maevis::MaeError;
    use maevis::patch::PatchGrid;

    // Tests the standard 224 / 16 layout
    // Verified by computing cols from the patch size instead of the input size
    #[test]
    fn test_default_grid_dimensions() {
        let grid = PatchGrid::new(224, 16).expect("224 is divisible by 16");

        assert_eq!(grid.rows(), 14);
        assert_eq!(grid.cols(), 14);
        assert_eq!(grid.len(), 196);
        assert!(!grid.is_empty());
        assert_eq!(grid.pixels_per_patch(), 256);
        assert_eq!(grid.patch_dim(), 768);
    }

    // Tests rejection of patch sizes that do not tile the input
    // Verified by removing the divisibility check
    #[test]
    fn test_rejects_non_dividing_patch() {
        for (input, patch) in [(224, 15), (224, 0), (8, 16)] {
            let result = PatchGrid::new(input, patch);
            assert!(
                matches!(result, Err(MaeError::ShapeMismatch { .. })),
                "{input}/{patch} should be rejected"
            );
        }
    }

    // Tests row-major position and pixel origin lookup
    // Verified by swapping row and column in position
    #[test]
    fn test_position_and_origin() {
        let grid = PatchGrid::new(32, 8).expect("valid grid");

        assert_eq!(grid.position(0), Some((0, 0)));
        assert_eq!(grid.position(5), Some((1, 1)));
        assert_eq!(grid.position(7), Some((1, 3)));
        assert_eq!(grid.origin(7), Some((8, 24)));
        assert_eq!(grid.position(16), None);
        assert_eq!(grid.origin(16), None);
    }

    // Tests a single patch covering the whole image
    // Verified by rejecting patch == input
    #[test]
    fn test_single_patch_grid() {
        let grid = PatchGrid::new(16, 16).expect("patch may equal input");
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.origin(0), Some((0, 0)));
    }
}
