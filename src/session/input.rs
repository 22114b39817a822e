use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Characters that end a word for word-delete purposes.
pub const SEPARATORS: [char; 6] = [' ', ',', '.', '!', '?', ';'];

pub fn is_separator(ch: char) -> bool {
    SEPARATORS.contains(&ch)
}

/// One accepted keystroke as seen by the tracker and the recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStroke {
    Char(char),
    Backspace,
}

/// When a backspace is honoured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackspacePolicy {
    /// Backspace is allowed down to an empty buffer.
    #[default]
    Free,
    /// Backspace only while at least one mistake is pending.
    MistakesOnly,
}

/// Whether the buffer may grow past the target text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Target,
    Unbounded,
}

#[derive(Clone, Debug)]
pub struct InputTracker {
    target: Vec<char>,
    buffer: Vec<char>,
    cursor: usize,
    mistakes: BTreeSet<usize>,
    raw_mistake_count: usize,
    raw_input_count: usize,
    bound: Bound,
    policy: BackspacePolicy,
}

impl InputTracker {
    pub fn new(target: Vec<char>, policy: BackspacePolicy) -> Self {
        Self {
            target,
            buffer: Vec::new(),
            cursor: 0,
            mistakes: BTreeSet::new(),
            raw_mistake_count: 0,
            raw_input_count: 0,
            bound: Bound::Target,
            policy,
        }
    }

    /// A tracker with no target that never marks mistakes (zen drills).
    pub fn unbounded() -> Self {
        Self {
            bound: Bound::Unbounded,
            ..Self::new(Vec::new(), BackspacePolicy::Free)
        }
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mistakes(&self) -> &BTreeSet<usize> {
        &self.mistakes
    }

    pub fn is_mistake(&self, pos: usize) -> bool {
        self.mistakes.contains(&pos)
    }

    pub fn raw_mistake_count(&self) -> usize {
        self.raw_mistake_count
    }

    pub fn raw_input_count(&self) -> usize {
        self.raw_input_count
    }

    /// Returns false when the character was dropped because the buffer is full.
    pub fn accept_char(&mut self, ch: char) -> bool {
        let pos = self.buffer.len();
        if self.bound == Bound::Target && pos >= self.target.len() {
            return false;
        }

        self.buffer.push(ch);
        self.raw_input_count += 1;
        if let Some(&expected) = self.target.get(pos) {
            if ch != expected {
                self.mistakes.insert(pos);
                self.raw_mistake_count += 1;
            }
        }
        self.cursor = self.buffer.len();
        true
    }

    /// Returns false when the backspace was refused.
    pub fn backspace(&mut self) -> bool {
        if self.buffer.is_empty() || !self.may_delete() {
            return false;
        }

        self.buffer.pop();
        self.mistakes.remove(&self.buffer.len());
        self.cursor = self.buffer.len();
        true
    }

    /// Deletes the last word and returns how many characters were removed.
    ///
    /// A single trailing separator goes with the word in front of it, so
    /// "cat dog " becomes "cat ". Raw counters are left alone.
    pub fn word_delete(&mut self) -> usize {
        if !self.may_delete() {
            return 0;
        }
        let len = self.buffer.len();
        let mut start = len;

        if start > 0 && is_separator(self.buffer[start - 1]) {
            start -= 1;
        }
        while start > 0 && !is_separator(self.buffer[start - 1]) {
            start -= 1;
        }

        self.buffer.truncate(start);
        self.mistakes.retain(|&p| p < start);
        self.cursor = self.buffer.len();
        len - start
    }

    fn may_delete(&self) -> bool {
        match self.policy {
            BackspacePolicy::Free => true,
            BackspacePolicy::MistakesOnly => !self.mistakes.is_empty() || self.target.is_empty(),
        }
    }

    pub fn apply(&mut self, stroke: KeyStroke) -> bool {
        match stroke {
            KeyStroke::Char(ch) => self.accept_char(ch),
            KeyStroke::Backspace => self.backspace(),
        }
    }

    pub fn is_complete(&self) -> bool {
        if self.target.is_empty() || self.buffer.len() != self.target.len() {
            return false;
        }
        !self.mistakes.contains(&(self.buffer.len() - 1))
    }

    /// Space-separated words in the buffer; empty chunks are not words.
    pub fn typed_word_count(&self) -> usize {
        self.buffer
            .split(|&c| c == ' ')
            .filter(|word| !word.is_empty())
            .count()
    }

    pub fn progress(&self) -> f64 {
        if self.target.is_empty() {
            return 0.0;
        }
        self.buffer.len() as f64 / self.target.len() as f64
    }
}
