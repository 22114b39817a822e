use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Header bar, body and hint footer shared by every screen.
pub struct ScreenLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let [header, main, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(footer_lines),
        ])
        .areas(area);
        Self {
            header,
            main,
            footer,
        }
    }
}

/// Greedily fills lines of at most `width` columns with hints, two spaces
/// apart. A hint wider than a whole line still gets a line to itself.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    hints
        .iter()
        .filter(|h| !h.is_empty())
        .fold(Vec::<String>::new(), |mut lines, hint| {
            match lines.last_mut() {
                Some(line) if line.chars().count() + 2 + hint.chars().count() <= width => {
                    line.push_str("  ");
                    line.push_str(hint);
                }
                _ => lines.push(format!(" {hint}")),
            }
            lines
        })
}

/// A `percent_x` by `percent_y` box in the middle of `area`, never smaller
/// than `min_w` x `min_h` unless `area` itself is.
pub fn centered_rect(percent_x: u16, percent_y: u16, min_w: u16, min_h: u16, area: Rect) -> Rect {
    let scale = |len: u16, pct: u16| (u32::from(len) * u32::from(pct.min(100)) / 100) as u16;
    let width = scale(area.width, percent_x).max(min_w).min(area.width);
    let height = scale(area.height, percent_y).max(min_h).min(area.height);

    let [column] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(column);
    cell
}
