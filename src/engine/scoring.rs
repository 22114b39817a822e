use std::time::Duration;

use crate::session::input::InputTracker;

/// Characters per word for normalized WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

pub fn elapsed_minutes(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() / 60.0
}

/// Net words per minute, never negative.
pub fn wpm(words: f64, mistakes: usize, minutes: f64) -> f64 {
    if minutes <= 0.0 {
        return 0.0;
    }
    (words / minutes - mistakes as f64 / minutes).max(0.0)
}

pub fn normalized_wpm(tracker: &InputTracker, minutes: f64) -> f64 {
    let words = tracker.buffer().len() as f64 / CHARS_PER_WORD;
    wpm(words, tracker.mistakes().len(), minutes)
}

pub fn raw_wpm(tracker: &InputTracker, minutes: f64) -> f64 {
    if minutes <= 0.0 {
        return 0.0;
    }
    tracker.typed_word_count() as f64 / minutes
}

pub fn cpm(tracker: &InputTracker, minutes: f64) -> f64 {
    if minutes <= 0.0 {
        return 0.0;
    }
    tracker.raw_input_count() as f64 / minutes
}

/// Percentage of keystrokes that were right on first entry.
/// `None` when nothing has been typed yet.
pub fn accuracy(tracker: &InputTracker) -> Option<f64> {
    accuracy_from_counts(tracker.raw_mistake_count(), tracker.raw_input_count())
}

pub fn accuracy_from_counts(raw_mistakes: usize, raw_inputs: usize) -> Option<f64> {
    if raw_inputs == 0 {
        return None;
    }
    Some(100.0 - raw_mistakes as f64 * 100.0 / raw_inputs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::input::BackspacePolicy;

    fn typed(target: &str, input: &str) -> InputTracker {
        let mut t = InputTracker::new(target.chars().collect(), BackspacePolicy::Free);
        for ch in input.chars() {
            t.accept_char(ch);
        }
        t
    }

    #[test]
    fn test_zero_minutes_is_zero_not_nan() {
        let t = typed("hello world", "hello");
        assert_eq!(normalized_wpm(&t, 0.0), 0.0);
        assert_eq!(raw_wpm(&t, 0.0), 0.0);
        assert_eq!(cpm(&t, 0.0), 0.0);
    }

    #[test]
    fn test_normalized_wpm_uses_five_char_words() {
        // 10 chars in 0.5 min = 2 words / 0.5 = 4 wpm
        let t = typed("abcdefghij", "abcdefghij");
        assert!((normalized_wpm(&t, 0.5) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_mistake_penalty_clamps_at_zero() {
        let t = typed("abcde", "xxxxx");
        assert_eq!(normalized_wpm(&t, 1.0), 0.0);
    }

    #[test]
    fn test_nothing_typed_after_timeout_is_zero() {
        let t = typed("the quick brown fox", "");
        let minutes = elapsed_minutes(Duration::from_secs(30));
        assert!(minutes > 0.0);
        let wpm = normalized_wpm(&t, minutes);
        assert_eq!(wpm, 0.0);
        assert!(!wpm.is_nan());
    }

    #[test]
    fn test_raw_wpm_counts_space_separated_words() {
        let t = typed("cat dog cow", "cat dog");
        assert!((raw_wpm(&t, 1.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpm_counts_every_keystroke() {
        let mut t = typed("cat", "cx");
        t.backspace();
        t.accept_char('a');
        assert!((cpm(&t, 0.5) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_undefined_without_input() {
        let t = typed("cat", "");
        assert_eq!(accuracy(&t), None);
    }

    #[test]
    fn test_accuracy_is_100_without_mistakes() {
        let t = typed("cat dog", "cat dog");
        assert_eq!(accuracy(&t), Some(100.0));
    }

    #[test]
    fn test_accuracy_after_correction() {
        let mut t = typed("cat", "cx");
        t.backspace();
        t.accept_char('a');
        t.accept_char('t');
        assert_eq!(accuracy(&t), Some(75.0));
    }

    #[test]
    fn test_accuracy_never_increases_with_more_mistakes() {
        let mut last = f64::INFINITY;
        for mistakes in 0..=20 {
            let acc = accuracy_from_counts(mistakes, 20).unwrap_or_default();
            assert!(acc <= last);
            last = acc;
        }
        assert_eq!(accuracy_from_counts(0, 20), Some(100.0));
    }
}
