//! Tests for stage progress tracking and batch display

#[cfg(test)]
mod tests {
    use maevis::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
    use maevis::io::progress::{NoProgress, ProgressManager, Stage, StageObserver};
    use std::path::Path;

    // Tests ProgressManager construction and a full stage cycle
    // Verified by setting wrong initial state
    #[test]
    fn test_progress_manager_cycle() {
        let mut pm = ProgressManager::new();
        pm.initialize(1);
        assert_eq!(pm.visible_bars(), 1);
        assert!(!pm.is_batched());

        pm.start_file(0, Path::new("test.png"));
        for stage in Stage::ALL {
            pm.stage(stage);
        }
        pm.complete_file(0);
        pm.finish();
    }

    // Tests default trait implementation
    // Verified by creating different initial states
    #[test]
    fn test_progress_manager_default() {
        let mut pm = ProgressManager::default();
        pm.initialize(2);
        assert_eq!(pm.visible_bars(), 2);
        pm.finish();
    }

    // Tests switching to batch mode past the display limit
    // Verified by changing the threshold comparison
    #[test]
    fn test_batch_mode_threshold() {
        let mut small = ProgressManager::new();
        small.initialize(MAX_INDIVIDUAL_PROGRESS_BARS + 1);
        assert!(!small.is_batched());

        let mut large = ProgressManager::new();
        large.initialize(MAX_INDIVIDUAL_PROGRESS_BARS + 2);
        assert!(large.is_batched());
        assert_eq!(large.visible_bars(), MAX_INDIVIDUAL_PROGRESS_BARS);

        // Bars are reused once files outnumber them
        let last = MAX_INDIVIDUAL_PROGRESS_BARS + 1;
        large.start_file(last, Path::new("last.png"));
        large.stage(Stage::Forward);
        large.complete_file(last);
        large.finish();
    }

    // Tests stage notifications without an active file are ignored
    // Verified by indexing the first bar unconditionally
    #[test]
    fn test_stage_without_active_file() {
        let mut pm = ProgressManager::new();
        pm.stage(Stage::Load);
        pm.initialize(0);
        pm.stage(Stage::Write);
        pm.finish();

        let mut silent = NoProgress;
        silent.stage(Stage::Mask);
    }

    // Tests stages are ordered and positioned consecutively
    // Verified by reordering the Stage variants
    #[test]
    fn test_stage_positions() {
        for (expected, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.position(), expected as u64);
            assert!(!stage.label().is_empty());
        }
        assert!(Stage::Load < Stage::Write);
    }

    // Tests suspended output runs once and the bar group stays shared
    // Verified by returning a fresh bar group from the accessor
    #[test]
    fn test_progress_manager_suspend() {
        let mut pm = ProgressManager::new();
        pm.initialize(2);
        pm.start_file(0, Path::new("a.png"));

        let mut calls = 0;
        let value = pm.suspend(|| {
            calls += 1;
            calls * 7
        });
        assert_eq!((calls, value), (1, 7));

        let shared = pm.multi_progress();
        let extra = shared.add(indicatif::ProgressBar::new(1));
        extra.finish();
        pm.complete_file(0);
        pm.finish();
    }
}
