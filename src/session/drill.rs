use std::time::Duration;

use crate::engine::scoring;
use crate::session::clock::{Countdown, Stopwatch};
use crate::session::input::{BackspacePolicy, InputTracker, KeyStroke};
use crate::session::replay::{Recorder, ReplayError};
use crate::session::result::{CompletedDrill, DrillKind, DrillResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrillPhase {
    NotStarted,
    Running,
    Completed,
}

/// Editing keys a drill understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrillInput {
    Char(char),
    Backspace,
    WordDelete,
}

/// Appends one WPM sample for every tick boundary crossed between `from`
/// and `to`, so the series length follows the clock and not the caller's `dt`.
fn sample_ticks(
    series: &mut Vec<f64>,
    tracker: &InputTracker,
    interval: Duration,
    from: Duration,
    to: Duration,
) {
    let mut at = from + interval;
    while at <= to {
        series.push(scoring::normalized_wpm(tracker, scoring::elapsed_minutes(at)));
        at += interval;
    }
}

/// Type as much as possible before the countdown runs out.
pub struct TimedDrill {
    tracker: InputTracker,
    clock: Countdown,
    phase: DrillPhase,
    wpm_series: Vec<f64>,
}

impl TimedDrill {
    pub fn new(
        target: Vec<char>,
        duration: Duration,
        tick: Duration,
        policy: BackspacePolicy,
    ) -> Self {
        Self {
            tracker: InputTracker::new(target, policy),
            clock: Countdown::new(duration, tick),
            phase: DrillPhase::NotStarted,
            wpm_series: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    pub fn duration(&self) -> Duration {
        self.clock.duration()
    }

    pub fn remaining(&self) -> Duration {
        self.clock.remaining()
    }

    pub fn input(&mut self, key: DrillInput) {
        if self.phase == DrillPhase::Completed {
            return;
        }
        match key {
            DrillInput::Char(ch) => {
                if self.phase == DrillPhase::NotStarted {
                    self.phase = DrillPhase::Running;
                    self.clock.start();
                }
                self.tracker.accept_char(ch);
            }
            DrillInput::Backspace => {
                self.tracker.backspace();
            }
            DrillInput::WordDelete => {
                self.tracker.word_delete();
            }
        }
    }

    /// Returns the result once the countdown hits zero.
    pub fn tick(&mut self, dt: Duration) -> Option<CompletedDrill> {
        if self.phase != DrillPhase::Running {
            return None;
        }
        let before = self.clock.elapsed();
        self.clock.advance(dt);
        sample_ticks(
            &mut self.wpm_series,
            &self.tracker,
            self.clock.interval(),
            before,
            self.clock.elapsed(),
        );

        if !self.clock.timed_out() {
            return None;
        }
        self.phase = DrillPhase::Completed;
        let result = DrillResult::from_tracker(
            DrillKind::Timed,
            &self.tracker,
            self.clock.duration(),
            std::mem::take(&mut self.wpm_series),
        );
        Some(CompletedDrill {
            result,
            replay: None,
        })
    }
}

/// Type a fixed number of words; every accepted key is recorded for replay.
pub struct WordCountDrill {
    tracker: InputTracker,
    clock: Stopwatch,
    recorder: Recorder,
    phase: DrillPhase,
    wpm_series: Vec<f64>,
}

impl WordCountDrill {
    pub fn new(target: Vec<char>, tick: Duration, policy: BackspacePolicy) -> Self {
        Self {
            tracker: InputTracker::new(target, policy),
            clock: Stopwatch::new(tick),
            recorder: Recorder::new(),
            phase: DrillPhase::NotStarted,
            wpm_series: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn recorded_keys(&self) -> usize {
        self.recorder.log().len()
    }

    /// Returns the result when this key finished the text.
    pub fn input(&mut self, key: DrillInput) -> Result<Option<CompletedDrill>, ReplayError> {
        if self.phase == DrillPhase::Completed {
            return Ok(None);
        }
        let offset = self.clock.elapsed_millis();
        match key {
            DrillInput::Char(ch) => {
                if self.phase == DrillPhase::NotStarted {
                    self.phase = DrillPhase::Running;
                    self.clock.start();
                }
                if self.tracker.accept_char(ch) {
                    self.recorder.record(KeyStroke::Char(ch), offset)?;
                }
            }
            DrillInput::Backspace => {
                if self.tracker.backspace() {
                    self.recorder.record(KeyStroke::Backspace, offset)?;
                }
            }
            DrillInput::WordDelete => {
                for _ in 0..self.tracker.word_delete() {
                    self.recorder.record(KeyStroke::Backspace, offset)?;
                }
            }
        }

        if !self.tracker.is_complete() {
            return Ok(None);
        }
        Ok(Some(self.complete()))
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.phase != DrillPhase::Running {
            return;
        }
        let before = self.clock.elapsed();
        self.clock.advance(dt);
        sample_ticks(
            &mut self.wpm_series,
            &self.tracker,
            self.clock.interval(),
            before,
            self.clock.elapsed(),
        );
    }

    fn complete(&mut self) -> CompletedDrill {
        self.phase = DrillPhase::Completed;
        self.clock.stop();
        let result = DrillResult::from_tracker(
            DrillKind::WordCount,
            &self.tracker,
            self.clock.elapsed(),
            std::mem::take(&mut self.wpm_series),
        );
        let recorder = std::mem::take(&mut self.recorder);
        CompletedDrill {
            result,
            replay: Some(recorder.finish(self.tracker.target().to_vec())),
        }
    }
}

/// Free typing with no target; only leaves through an explicit key.
pub struct ZenDrill {
    tracker: InputTracker,
    clock: Stopwatch,
    phase: DrillPhase,
    wpm_series: Vec<f64>,
}

impl ZenDrill {
    pub fn new(tick: Duration) -> Self {
        Self {
            tracker: InputTracker::unbounded(),
            clock: Stopwatch::new(tick),
            phase: DrillPhase::NotStarted,
            wpm_series: Vec::new(),
        }
    }

    pub fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn wpm_series(&self) -> &[f64] {
        &self.wpm_series
    }

    pub fn live_wpm(&self) -> f64 {
        scoring::normalized_wpm(&self.tracker, scoring::elapsed_minutes(self.clock.elapsed()))
    }

    pub fn input(&mut self, key: DrillInput) {
        match key {
            DrillInput::Char(ch) => {
                if self.phase == DrillPhase::NotStarted {
                    self.phase = DrillPhase::Running;
                    self.clock.start();
                }
                self.tracker.accept_char(ch);
            }
            DrillInput::Backspace => {
                self.tracker.backspace();
            }
            DrillInput::WordDelete => {
                self.tracker.word_delete();
            }
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.phase != DrillPhase::Running {
            return;
        }
        let before = self.clock.elapsed();
        self.clock.advance(dt);
        sample_ticks(
            &mut self.wpm_series,
            &self.tracker,
            self.clock.interval(),
            before,
            self.clock.elapsed(),
        );
    }
}
