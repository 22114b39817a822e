use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Labelled text fields with an optional error line (login, register).
pub struct Form<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, &'a LineInput)>,
    pub focused: usize,
    pub error: Option<&'a str>,
    pub hint: &'a str,
    pub theme: &'a Theme,
}

impl Widget for Form<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![Line::default()];
        for (i, (label, input)) in self.fields.iter().enumerate() {
            let focused = i == self.focused;
            let label_style = if focused {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let (before, at, after) = input.render_parts();
            let mut spans = vec![
                Span::styled(format!("  {label:<10}"), label_style),
                Span::styled(before, Style::default().fg(colors.fg())),
            ];
            if focused {
                spans.push(Span::styled(
                    at.unwrap_or(' ').to_string(),
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_cursor_bg()),
                ));
            } else if let Some(ch) = at {
                spans.push(Span::styled(ch.to_string(), Style::default().fg(colors.fg())));
            }
            spans.push(Span::styled(after, Style::default().fg(colors.fg())));
            lines.push(Line::from(spans));
            lines.push(Line::default());
        }

        if let Some(error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  \u{274c} {error}"),
                Style::default().fg(colors.error()),
            )));
            lines.push(Line::default());
        }

        lines.push(Line::from(Span::styled(
            format!("  {}", self.hint),
            Style::default().fg(colors.text_pending()),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}
