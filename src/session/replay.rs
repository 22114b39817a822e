use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::session::clock::Stopwatch;
use crate::session::input::{BackspacePolicy, InputTracker, KeyStroke};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("keystroke at {offset_ms}ms recorded after one at {previous_ms}ms")]
    OutOfOrder { offset_ms: u64, previous_ms: u64 },
    #[error("keystroke log ran out after {applied} keys without reproducing the drill text")]
    LogExhausted { applied: usize },
}

/// One accepted keystroke and when it happened, relative to drill start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub stroke: KeyStroke,
    pub offset_ms: u64,
}

/// Keystrokes in non-decreasing offset order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeystrokeLog {
    events: Vec<KeyEvent>,
}

impl KeystrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stroke: KeyStroke, offset_ms: u64) -> Result<(), ReplayError> {
        if let Some(last) = self.events.last() {
            if offset_ms < last.offset_ms {
                return Err(ReplayError::OutOfOrder {
                    offset_ms,
                    previous_ms: last.offset_ms,
                });
            }
        }
        self.events.push(KeyEvent { stroke, offset_ms });
        Ok(())
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn span(&self) -> Duration {
        self.events
            .last()
            .map(|e| Duration::from_millis(e.offset_ms))
            .unwrap_or_default()
    }
}

/// Everything a replay needs: the drill text and its frozen log.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplaySource {
    pub target: Vec<char>,
    pub log: KeystrokeLog,
}

/// Captures accepted keystrokes during a word-count drill.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    log: KeystrokeLog,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stroke: KeyStroke, offset_ms: u64) -> Result<(), ReplayError> {
        self.log.push(stroke, offset_ms)
    }

    pub fn log(&self) -> &KeystrokeLog {
        &self.log
    }

    /// Freezes the log together with the text it was typed against.
    pub fn finish(self, target: Vec<char>) -> Arc<ReplaySource> {
        Arc::new(ReplaySource {
            target,
            log: self.log,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayPhase {
    Idle,
    Armed,
    Playing,
    Done,
}

/// A key as it was re-applied during playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedKey {
    pub stroke: KeyStroke,
    pub offset_ms: u64,
    pub applied_at_ms: u64,
}

/// Plays a keystroke log back into a fresh tracker on its own clock.
pub struct ReplayEngine {
    source: Arc<ReplaySource>,
    phase: ReplayPhase,
    tracker: InputTracker,
    clock: Stopwatch,
    tick_interval: Duration,
    next: usize,
    applied: Vec<AppliedKey>,
}

impl ReplayEngine {
    pub fn new(source: Arc<ReplaySource>, tick_interval: Duration) -> Self {
        let tracker = InputTracker::new(source.target.clone(), BackspacePolicy::Free);
        Self {
            source,
            phase: ReplayPhase::Idle,
            tracker,
            clock: Stopwatch::new(tick_interval),
            tick_interval,
            next: 0,
            applied: Vec::new(),
        }
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    pub fn source(&self) -> &Arc<ReplaySource> {
        &self.source
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn applied(&self) -> &[AppliedKey] {
        &self.applied
    }

    /// Keys applied so far out of the whole log.
    pub fn progress(&self) -> (usize, usize) {
        (self.next, self.source.log.len())
    }

    /// The key that arms playback is a start signal only; it is not typed.
    pub fn arm(&mut self) {
        if self.phase != ReplayPhase::Idle {
            return;
        }
        self.tracker = InputTracker::new(self.source.target.clone(), BackspacePolicy::Free);
        self.clock = Stopwatch::new(self.tick_interval);
        self.clock.start();
        self.next = 0;
        self.applied.clear();
        self.phase = ReplayPhase::Armed;
        tracing::debug!(keys = self.source.log.len(), "replay armed");
    }

    pub fn tick(&mut self, dt: Duration) -> Result<(), ReplayError> {
        match self.phase {
            ReplayPhase::Idle | ReplayPhase::Done => return Ok(()),
            ReplayPhase::Armed => self.phase = ReplayPhase::Playing,
            ReplayPhase::Playing => {
                self.clock.advance(dt);
            }
        }

        let now = self.clock.elapsed_millis();
        let events = self.source.log.events();
        while let Some(event) = events.get(self.next) {
            if event.offset_ms > now {
                break;
            }
            self.tracker.apply(event.stroke);
            self.applied.push(AppliedKey {
                stroke: event.stroke,
                offset_ms: event.offset_ms,
                applied_at_ms: now,
            });
            self.next += 1;
        }

        if self.next == events.len() {
            if !self.tracker.is_complete() {
                return Err(ReplayError::LogExhausted {
                    applied: self.next,
                });
            }
            self.clock.stop();
            self.phase = ReplayPhase::Done;
            tracing::debug!(elapsed_ms = now, "replay finished");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(target: &str, keys: &[(KeyStroke, u64)]) -> Arc<ReplaySource> {
        let mut recorder = Recorder::new();
        for &(stroke, ms) in keys {
            recorder.record(stroke, ms).unwrap();
        }
        recorder.finish(target.chars().collect())
    }

    fn run(engine: &mut ReplayEngine, step_ms: u64) {
        engine.arm();
        for _ in 0..10_000 {
            engine.tick(Duration::from_millis(step_ms)).unwrap();
            if engine.phase() == ReplayPhase::Done {
                return;
            }
        }
        panic!("replay never finished");
    }

    fn cat_with_correction() -> Arc<ReplaySource> {
        source(
            "cat",
            &[
                (KeyStroke::Char('c'), 0),
                (KeyStroke::Char('x'), 120),
                (KeyStroke::Backspace, 300),
                (KeyStroke::Char('a'), 410),
                (KeyStroke::Char('t'), 500),
            ],
        )
    }

    #[test]
    fn test_log_rejects_out_of_order_offsets() {
        let mut log = KeystrokeLog::new();
        log.push(KeyStroke::Char('a'), 10).unwrap();
        let err = log.push(KeyStroke::Char('b'), 5).unwrap_err();
        assert_eq!(
            err,
            ReplayError::OutOfOrder {
                offset_ms: 5,
                previous_ms: 10
            }
        );
        assert!(log.push(KeyStroke::Char('b'), 10).is_ok());
    }

    #[test]
    fn test_idle_until_armed() {
        let mut engine = ReplayEngine::new(cat_with_correction(), Duration::from_millis(1));
        engine.tick(Duration::from_secs(5)).unwrap();
        assert_eq!(engine.phase(), ReplayPhase::Idle);
        assert!(engine.tracker().buffer().is_empty());
    }

    #[test]
    fn test_arming_key_is_not_typed() {
        let mut engine = ReplayEngine::new(cat_with_correction(), Duration::from_millis(1));
        engine.arm();
        assert_eq!(engine.phase(), ReplayPhase::Armed);
        assert!(engine.tracker().buffer().is_empty());
        engine.tick(Duration::ZERO).unwrap();
        assert_eq!(engine.phase(), ReplayPhase::Playing);
        // only the key at offset 0 is due
        assert_eq!(engine.tracker().buffer(), &['c']);
    }

    #[test]
    fn test_keys_apply_at_recorded_offsets() {
        let mut engine = ReplayEngine::new(cat_with_correction(), Duration::from_millis(1));
        engine.arm();
        engine.tick(Duration::ZERO).unwrap();
        engine.tick(Duration::from_millis(119)).unwrap();
        assert_eq!(engine.tracker().buffer(), &['c']);
        engine.tick(Duration::from_millis(1)).unwrap();
        assert_eq!(engine.tracker().buffer(), &['c', 'x']);
        assert!(engine.tracker().is_mistake(1));
    }

    #[test]
    fn test_done_when_log_empty_and_text_matches() {
        let mut engine = ReplayEngine::new(cat_with_correction(), Duration::from_millis(1));
        run(&mut engine, 16);
        assert_eq!(engine.phase(), ReplayPhase::Done);
        assert!(engine.tracker().is_complete());
        assert_eq!(engine.tracker().raw_mistake_count(), 1);
        assert_eq!(engine.progress(), (5, 5));
    }

    #[test]
    fn test_two_replays_are_identical() {
        let src = cat_with_correction();
        let mut first = ReplayEngine::new(Arc::clone(&src), Duration::from_millis(1));
        let mut second = ReplayEngine::new(src, Duration::from_millis(1));
        run(&mut first, 7);
        run(&mut second, 7);
        assert_eq!(first.applied(), second.applied());
        assert_eq!(first.tracker().buffer(), second.tracker().buffer());
        assert_eq!(first.tracker().mistakes(), second.tracker().mistakes());
    }

    #[test]
    fn test_exhausted_log_without_completion_is_error() {
        let src = source("cat", &[(KeyStroke::Char('c'), 0)]);
        let mut engine = ReplayEngine::new(src, Duration::from_millis(1));
        engine.arm();
        let err = engine.tick(Duration::ZERO).unwrap_err();
        assert_eq!(err, ReplayError::LogExhausted { applied: 1 });
    }
}
