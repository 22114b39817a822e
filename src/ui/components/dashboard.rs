use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::result::{DrillKind, DrillResult};
use crate::ui::components::chart::WpmChart;
use crate::ui::theme::{Theme, ThemeColors};

/// Results screen body: scores, the WPM chart and the action row.
pub struct Dashboard<'a> {
    result: &'a DrillResult,
    options: &'a [&'a str],
    selected: usize,
    sample_secs: f64,
    theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        result: &'a DrillResult,
        options: &'a [&'a str],
        selected: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            result,
            options,
            selected,
            sample_secs: 1.0,
            theme,
        }
    }

    /// Seconds between two WPM samples, for the chart's x axis.
    pub fn sample_secs(mut self, secs: f64) -> Self {
        self.sample_secs = secs;
        self
    }

    fn stats(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let r = self.result;
        let strong = |color: Color| Style::default().fg(color).add_modifier(Modifier::BOLD);

        let mut lines = vec![
            stat("wpm", format!("{:.0}", r.wpm), strong(colors.accent()), colors),
            stat("raw", format!("{:.0}", r.raw_wpm), Style::default().fg(colors.fg()), colors),
            stat("cpm", format!("{:.0}", r.cpm), Style::default().fg(colors.fg()), colors),
            stat(
                "accuracy",
                format_accuracy(r.accuracy),
                strong(accuracy_color(r.accuracy, colors)),
                colors,
            ),
            stat("time", format!("{:.1}s", r.elapsed_secs), Style::default().fg(colors.fg()), colors),
        ];
        if r.kind == DrillKind::WordCount {
            lines.push(stat(
                "words",
                r.word_count.to_string(),
                Style::default().fg(colors.fg()),
                colors,
            ));
        }
        lines
    }

    fn option_row(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let spans: Vec<Span> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                if i == self.selected {
                    Span::styled(
                        format!(" > {option} < "),
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(
                        format!("   {option}   "),
                        Style::default().fg(colors.text_pending()),
                    )
                }
            })
            .collect();
        Line::from(spans).centered()
    }
}

fn stat(label: &str, value: String, style: Style, colors: &ThemeColors) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<10}"), Style::default().fg(colors.text_pending())),
        Span::styled(value, style),
    ])
}

fn accuracy_color(accuracy: Option<f64>, colors: &ThemeColors) -> Color {
    match accuracy {
        Some(acc) if acc >= 95.0 => colors.success(),
        Some(acc) if acc >= 85.0 => colors.warning(),
        Some(_) => colors.error(),
        None => colors.text_pending(),
    }
}

pub fn format_accuracy(accuracy: Option<f64>) -> String {
    accuracy.map_or_else(|| "-".to_string(), |acc| format!("{acc:.1}%"))
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = format!(" {} results ", self.result.kind);
        let block = Block::bordered()
            .title(Line::from(title).centered())
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let stats = self.stats();
        let [stats_area, chart_area, options_area] = Layout::vertical([
            Constraint::Length(stats.len() as u16 + 1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .areas(inner);

        let mut stats_lines = vec![Line::default()];
        stats_lines.extend(stats);
        Paragraph::new(stats_lines).render(stats_area, buf);

        let points = self.result.wpm_points(self.sample_secs);
        WpmChart::new(&points, self.theme).render(chart_area, buf);

        Paragraph::new(vec![Line::default(), self.option_row()]).render(options_area, buf);
    }
}
