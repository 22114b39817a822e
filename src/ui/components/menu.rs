use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// Vertical list of choices under a title. Selection lives in the screen state.
pub struct Menu<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub items: &'a [MenuItem],
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(items: &'a [MenuItem], selected: usize, theme: &'a Theme) -> Self {
        Self {
            title: "termtyper",
            subtitle: "",
            items,
            selected,
            theme,
        }
    }

    pub fn subtitle(mut self, subtitle: &'a str) -> Self {
        self.subtitle = subtitle;
        self
    }
}

/// Wrapping selection movement shared by every menu screen.
pub fn next_index(selected: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (selected + 1) % len }
}

pub fn prev_index(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if selected > 0 {
        selected - 1
    } else {
        len - 1
    }
}

impl Widget for Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(Line::from(format!(" {} ", self.title)).centered())
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(
                self.subtitle,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::default(),
        ];

        let muted = Style::default().fg(colors.text_pending());
        for (i, item) in self.items.iter().enumerate() {
            let (marker, style) = if i == self.selected {
                (
                    ">",
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" ", Style::default().fg(colors.fg()))
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} "), style),
                Span::styled(format!("[{}] ", item.key), muted),
                Span::styled(item.label, style),
            ]));
            lines.push(Line::from(Span::styled(format!("       {}", item.description), muted)));
            lines.push(Line::default());
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(prev_index(0, 3), 2);
        assert_eq!(next_index(0, 3), 1);
        assert_eq!(prev_index(0, 0), 0);
    }
}
