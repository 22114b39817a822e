use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Widget};

use crate::ui::theme::Theme;

const MIN_WPM_CEILING: f64 = 10.0;

/// Axis ranges for `(seconds, wpm)` samples, with headroom above the peak.
pub fn chart_bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let last_x = points.last().map_or(1.0, |&(x, _)| x).max(1.0);
    let peak = points
        .iter()
        .map(|&(_, y)| y)
        .fold(MIN_WPM_CEILING, f64::max);
    ([0.0, last_x], [0.0, (peak + peak / 10.0).ceil()])
}

/// Mean speed drawn as a flat line across the drill.
pub fn mean_line(points: &[(f64, f64)]) -> Option<[(f64, f64); 2]> {
    let (first, last) = (points.first()?, points.last()?);
    let mean = points.iter().map(|&(_, y)| y).sum::<f64>() / points.len() as f64;
    Some([(first.0, mean), (last.0, mean)])
}

/// Net WPM across one drill.
pub struct WpmChart<'a> {
    points: &'a [(f64, f64)],
    theme: &'a Theme,
}

impl<'a> WpmChart<'a> {
    pub fn new(points: &'a [(f64, f64)], theme: &'a Theme) -> Self {
        Self { points, theme }
    }
}

impl Widget for WpmChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" speed ")
            .border_style(Style::default().fg(colors.border()));
        let muted = Style::default().fg(colors.text_pending());

        let Some(mean) = mean_line(self.points) else {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Span::styled("too short to chart", muted))
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        };

        let (x_bounds, y_bounds) = chart_bounds(self.points);
        let x_labels = vec![
            Span::styled("0", muted),
            Span::styled(format!("{:.0}s", x_bounds[1]), muted),
        ];
        let y_labels = vec![
            Span::styled("0", muted),
            Span::styled(format!("{:.0}", y_bounds[1]), muted),
        ];

        let datasets = vec![
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(muted)
                .data(&mean),
            Dataset::default()
                .name("wpm")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors.accent()))
                .data(self.points),
        ];

        Chart::new(datasets)
            .block(block)
            .x_axis(Axis::default().style(muted).bounds(x_bounds).labels(x_labels))
            .y_axis(Axis::default().style(muted).bounds(y_bounds).labels(y_labels))
            .render(area, buf);
    }
}
