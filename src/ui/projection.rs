//! Layout math for the typing view: wrapping the drill text into lines,
//! finding the cursor's line and centering the three visible lines.
//!
//! Everything here works on cell counts and indices so it can be tested
//! without a terminal.

use std::ops::Range;

/// How many lines are shown around the cursor line.
pub const VISIBLE_LINES: usize = 3;

/// Wrap width for a terminal `width` columns wide: 60% of it, clamped.
pub fn line_len_limit(width: u16, min: usize, max: usize) -> usize {
    let reactive = width as usize * 6 / 10;
    reactive.clamp(min.max(1), max.max(min).max(1))
}

/// Splits `text` into lines of at most `limit` cells, breaking at spaces.
///
/// Spaces stay on the line they follow, so the line lengths always sum to
/// `text.len()`. A word longer than `limit` is split hard.
pub fn wrap(text: &[char], limit: usize) -> Vec<Range<usize>> {
    let limit = limit.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < text.len() {
        let word_start = i;
        let mut word_end = i;
        while word_end < text.len() && text[word_end] != ' ' {
            word_end += 1;
        }
        let mut chunk_end = word_end;
        while chunk_end < text.len() && text[chunk_end] == ' ' {
            chunk_end += 1;
        }

        if word_start > start && word_end - start > limit {
            lines.push(start..word_start);
            start = word_start;
        }
        while word_end - start > limit {
            lines.push(start..start + limit);
            start += limit;
        }
        i = chunk_end;
    }

    if start < text.len() || lines.is_empty() {
        lines.push(start..text.len());
    }
    lines
}

/// Index of the line holding cell `cursor`; `lines.len()` if past the end.
pub fn find_cursor_line(lines: &[Range<usize>], cursor: usize) -> usize {
    lines
        .iter()
        .position(|line| cursor < line.end)
        .unwrap_or(lines.len())
}

/// One line above the cursor line and one below; two below on the first line.
pub fn lines_around_cursor(line_count: usize, cursor_line: usize) -> Range<usize> {
    let after = if cursor_line == 0 { 3 } else { 2 };
    let low = cursor_line.saturating_sub(1).min(line_count);
    let high = (cursor_line + after).min(line_count);
    low..high
}

/// Blank rows above the typing block.
pub fn vertical_offset(height: u16) -> u16 {
    (height / 2).saturating_sub(3)
}

/// Mean line length, leaving out the last line, which is usually short.
pub fn average_line_len(lines: &[Range<usize>]) -> usize {
    let counted = if lines.len() > 1 {
        &lines[..lines.len() - 1]
    } else {
        lines
    };
    let total: usize = counted.iter().map(|l| l.len()).sum();
    total / counted.len().max(1)
}

/// Left padding that centers a block of `avg_len` wide lines.
pub fn indent_for(width: u16, avg_len: usize) -> u16 {
    let half = (avg_len / 2).min(u16::MAX as usize) as u16;
    (width / 2).saturating_sub(half)
}

/// Where each piece of the typing view goes inside a `width` x `height` area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub lines: Vec<Range<usize>>,
    pub cursor_line: usize,
    pub visible: Range<usize>,
    pub indent: u16,
    pub top: u16,
}

pub fn project(
    cells: &[char],
    cursor: usize,
    width: u16,
    height: u16,
    min_line_len: usize,
    max_line_len: usize,
) -> Projection {
    let limit = line_len_limit(width, min_line_len, max_line_len);
    let lines = wrap(cells, limit);
    let cursor_line = find_cursor_line(&lines, cursor);
    let visible = lines_around_cursor(lines.len(), cursor_line);
    let indent = indent_for(width, average_line_len(&lines));
    Projection {
        cursor_line,
        visible,
        indent,
        top: vertical_offset(height),
        lines,
    }
}
