use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::session::input::InputTracker;
use crate::ui::projection::{self, Projection};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Correct,
    Mistake,
    Cursor,
    Pending,
}

/// One displayed character of the typing view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub kind: CellKind,
}

/// Typed text, then the cursor, then the rest of the target.
/// A wrong position shows the expected character, not the typed one.
pub fn build_cells(tracker: &InputTracker) -> Vec<Cell> {
    let buffer = tracker.buffer();
    let target = tracker.target();
    let mut cells = Vec::with_capacity(target.len().max(buffer.len()) + 1);

    for (i, &typed) in buffer.iter().enumerate() {
        if tracker.is_mistake(i) {
            let expected = target.get(i).copied().unwrap_or(typed);
            cells.push(Cell {
                ch: expected,
                kind: CellKind::Mistake,
            });
        } else {
            cells.push(Cell {
                ch: typed,
                kind: CellKind::Correct,
            });
        }
    }

    let cursor = buffer.len();
    cells.push(Cell {
        ch: target.get(cursor).copied().unwrap_or(' '),
        kind: CellKind::Cursor,
    });
    for &ch in target.iter().skip(cursor + 1) {
        cells.push(Cell {
            ch,
            kind: CellKind::Pending,
        });
    }
    cells
}

pub struct TypingArea<'a> {
    tracker: &'a InputTracker,
    header: Line<'a>,
    footer: Option<&'a str>,
    theme: &'a Theme,
    min_line_len: usize,
    max_line_len: usize,
    centered: bool,
}

impl<'a> TypingArea<'a> {
    pub fn new(tracker: &'a InputTracker, theme: &'a Theme, line_len: (usize, usize)) -> Self {
        Self {
            tracker,
            header: Line::default(),
            footer: None,
            theme,
            min_line_len: line_len.0,
            max_line_len: line_len.1,
            centered: true,
        }
    }

    /// Clock or progress shown above the text.
    pub fn header(mut self, header: impl Into<Line<'a>>) -> Self {
        self.header = header.into();
        self
    }

    pub fn footer(mut self, footer: Option<&'a str>) -> Self {
        self.footer = footer;
        self
    }

    /// Zen text is left as typed instead of centered on the average line.
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    fn style_for(&self, kind: CellKind) -> Style {
        let colors = &self.theme.colors;
        match kind {
            CellKind::Correct => Style::default().fg(colors.text_correct()),
            CellKind::Mistake => Style::default()
                .fg(colors.text_incorrect())
                .bg(colors.text_incorrect_bg())
                .add_modifier(Modifier::UNDERLINED),
            CellKind::Cursor => Style::default()
                .fg(colors.text_cursor_fg())
                .bg(colors.text_cursor_bg()),
            CellKind::Pending => Style::default().fg(colors.text_pending()),
        }
    }

    fn line_for(&self, cells: &[Cell]) -> Line<'static> {
        let mut spans: Vec<Span> = Vec::new();
        let mut run = String::new();
        let mut run_kind = None;
        for cell in cells {
            if run_kind != Some(cell.kind) {
                if let Some(kind) = run_kind {
                    spans.push(Span::styled(std::mem::take(&mut run), self.style_for(kind)));
                }
                run_kind = Some(cell.kind);
            }
            run.push(cell.ch);
        }
        if let Some(kind) = run_kind {
            spans.push(Span::styled(run, self.style_for(kind)));
        }
        Line::from(spans)
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cells = build_cells(self.tracker);
        let chars: Vec<char> = cells.iter().map(|c| c.ch).collect();
        let Projection {
            lines,
            visible,
            indent,
            top,
            ..
        } = projection::project(
            &chars,
            self.tracker.cursor(),
            area.width,
            area.height,
            self.min_line_len,
            self.max_line_len,
        );
        let indent = if self.centered { indent } else { area.width / 4 };
        let pad = " ".repeat(indent as usize);

        let mut out: Vec<Line> = Vec::new();
        for _ in 0..top {
            out.push(Line::default());
        }
        let mut header = self.header.clone();
        header.spans.insert(0, Span::raw(pad.clone()));
        out.push(header);
        out.push(Line::default());

        for range in &lines[visible] {
            let mut line = self.line_for(&cells[range.clone()]);
            line.spans.insert(0, Span::raw(pad.clone()));
            out.push(line);
        }

        if let Some(footer) = self.footer {
            out.push(Line::default());
            out.push(Line::default());
            out.push(
                Line::from(Span::styled(
                    footer,
                    Style::default().fg(self.theme.colors.text_pending()),
                ))
                .centered(),
            );
        }

        Paragraph::new(out)
            .style(Style::default().bg(self.theme.colors.bg()))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::input::BackspacePolicy;

    fn kinds(cells: &[Cell]) -> Vec<CellKind> {
        cells.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_cells_basic() {
        let mut t = InputTracker::new("abc".chars().collect(), BackspacePolicy::Free);
        t.accept_char('a');
        let cells = build_cells(&t);
        assert_eq!(
            kinds(&cells),
            vec![CellKind::Correct, CellKind::Cursor, CellKind::Pending]
        );
        assert_eq!(cells[1].ch, 'b');
    }

    #[test]
    fn test_mistake_shows_expected_char() {
        let mut t = InputTracker::new("abc".chars().collect(), BackspacePolicy::Free);
        t.accept_char('x');
        let cells = build_cells(&t);
        assert_eq!(cells[0].kind, CellKind::Mistake);
        assert_eq!(cells[0].ch, 'a');
    }

    #[test]
    fn test_full_buffer_adds_trailing_cursor() {
        let mut t = InputTracker::new("ab".chars().collect(), BackspacePolicy::Free);
        t.accept_char('a');
        t.accept_char('b');
        let cells = build_cells(&t);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2], Cell { ch: ' ', kind: CellKind::Cursor });
    }

    #[test]
    fn test_zen_cells_are_all_correct() {
        let mut t = InputTracker::unbounded();
        for ch in "hey".chars() {
            t.accept_char(ch);
        }
        let cells = build_cells(&t);
        assert_eq!(
            kinds(&cells),
            vec![
                CellKind::Correct,
                CellKind::Correct,
                CellKind::Correct,
                CellKind::Cursor
            ]
        );
    }

    #[test]
    fn test_cursor_cell_index_matches_tracker() {
        let mut t = InputTracker::new("the cat".chars().collect(), BackspacePolicy::Free);
        for ch in "thx".chars() {
            t.accept_char(ch);
        }
        let cells = build_cells(&t);
        assert_eq!(cells[t.cursor()].kind, CellKind::Cursor);
        assert_eq!(cells.len(), t.target().len());
    }
}
