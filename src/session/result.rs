use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring;
use crate::session::input::InputTracker;
use crate::session::replay::ReplaySource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrillKind {
    Timed,
    WordCount,
}

impl fmt::Display for DrillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrillKind::Timed => write!(f, "timer"),
            DrillKind::WordCount => write!(f, "word count"),
        }
    }
}

/// Scores of a finished drill. Computed once and never changed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrillResult {
    pub kind: DrillKind,
    pub wpm: f64,
    pub raw_wpm: f64,
    pub cpm: f64,
    /// `None` when no key was pressed.
    pub accuracy: Option<f64>,
    pub elapsed_secs: f64,
    pub word_count: usize,
    pub wpm_series: Vec<f64>,
    pub timestamp: DateTime<Utc>,
}

impl DrillResult {
    pub fn from_tracker(
        kind: DrillKind,
        tracker: &InputTracker,
        elapsed: Duration,
        wpm_series: Vec<f64>,
    ) -> Self {
        let minutes = scoring::elapsed_minutes(elapsed);
        Self {
            kind,
            wpm: scoring::normalized_wpm(tracker, minutes),
            raw_wpm: scoring::raw_wpm(tracker, minutes),
            cpm: scoring::cpm(tracker, minutes),
            accuracy: scoring::accuracy(tracker),
            elapsed_secs: elapsed.as_secs_f64(),
            word_count: tracker.typed_word_count(),
            wpm_series,
            timestamp: Utc::now(),
        }
    }

    /// `(second, wpm)` points for charting.
    pub fn wpm_points(&self, sample_secs: f64) -> Vec<(f64, f64)> {
        self.wpm_series
            .iter()
            .enumerate()
            .map(|(i, &wpm)| ((i + 1) as f64 * sample_secs, wpm))
            .collect()
    }
}

/// What the results screen holds: the scores plus, for word-count drills,
/// the frozen log the replay screen plays back.
#[derive(Clone, Debug)]
pub struct CompletedDrill {
    pub result: DrillResult,
    pub replay: Option<Arc<ReplaySource>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::input::BackspacePolicy;

    #[test]
    fn test_result_from_clean_drill() {
        let mut t = InputTracker::new("cat dog".chars().collect(), BackspacePolicy::Free);
        for ch in "cat dog".chars() {
            t.accept_char(ch);
        }
        let result =
            DrillResult::from_tracker(DrillKind::WordCount, &t, Duration::from_secs(6), vec![]);
        // 7 chars / 5 = 1.4 words in 0.1 min
        assert!((result.wpm - 14.0).abs() < 1e-9);
        assert!((result.raw_wpm - 20.0).abs() < 1e-9);
        assert!((result.cpm - 70.0).abs() < 1e-9);
        assert_eq!(result.accuracy, Some(100.0));
        assert_eq!(result.word_count, 2);
    }

    #[test]
    fn test_result_without_input_has_no_accuracy() {
        let t = InputTracker::new("cat".chars().collect(), BackspacePolicy::Free);
        let result = DrillResult::from_tracker(DrillKind::Timed, &t, Duration::from_secs(30), vec![]);
        assert_eq!(result.wpm, 0.0);
        assert_eq!(result.accuracy, None);
    }

    #[test]
    fn test_wpm_points_are_indexed_by_sample() {
        let t = InputTracker::new("cat".chars().collect(), BackspacePolicy::Free);
        let result = DrillResult::from_tracker(
            DrillKind::Timed,
            &t,
            Duration::from_secs(2),
            vec![10.0, 12.0],
        );
        assert_eq!(result.wpm_points(1.0), vec![(1.0, 10.0), (2.0, 12.0)]);
    }
}
