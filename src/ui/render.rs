use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::app::{
    AuthForm, FormKind, MAIN_MENU_ITEMS, PRE_AUTH_ITEMS, Screen, Session, SettingsForm,
};
use crate::engine::transitions::StateKind;
use crate::session::drill::DrillPhase;
use crate::session::input::InputTracker;
use crate::session::replay::{ReplayEngine, ReplayPhase};
use crate::ui::components::dashboard::Dashboard;
use crate::ui::components::form::Form;
use crate::ui::components::menu::{Menu, MenuItem};
use crate::ui::components::typing_area::TypingArea;
use crate::ui::layout::{ScreenLayout, centered_rect, pack_hint_lines};
use crate::ui::theme::Theme;

const PRE_AUTH_DESCRIPTIONS: [&str; 3] = [
    "create an account that remembers your settings",
    "sign in with email and password",
    "practice without an account",
];

const MAIN_MENU_DESCRIPTIONS: [&str; 4] = [
    "type as much as you can before time runs out",
    "type a fixed number of words as fast as you can",
    "free typing, no target",
    "drill time and word count",
];

const MENU_KEYS: [&str; 4] = ["1", "2", "3", "4"];

fn hints_for(screen: &Screen) -> &'static [&'static str] {
    match screen {
        Screen::PreAuth { .. } => &["[1-3] choose", "[j/k] move", "[enter] select", "[q] quit"],
        Screen::Login(_) | Screen::Register(_) => {
            &["[tab] next field", "[enter] submit", "[esc] back"]
        }
        Screen::MainMenu { .. } => &["[1-4] start", "[j/k] move", "[enter] select", "[q] quit"],
        Screen::TimerTest(_) | Screen::WordCountTest(_) | Screen::ZenMode(_) => &[
            "[esc] menu",
            "[ctrl+r] restart",
            "[ctrl+w] delete word",
        ],
        Screen::Settings(_) => &["[j/k] row", "[h/l] change", "[enter] save"],
        Screen::Results { .. } => &["[h/l] choose", "[enter] confirm", "[esc] menu"],
        Screen::Replay(_) => &["[esc] results", "[ctrl+q] menu"],
    }
}

/// Draws the whole session: header bar, current screen, key hints.
pub fn draw(session: &Session, area: Rect, buf: &mut Buffer) {
    let theme = session.theme();
    let colors = &theme.colors;
    Block::default()
        .style(Style::default().bg(colors.bg()))
        .render(area, buf);

    let hints = pack_hint_lines(hints_for(session.screen()), area.width as usize);
    let layout = ScreenLayout::new(area, hints.len() as u16);

    render_header(session, layout.header, buf);

    match session.screen() {
        Screen::PreAuth { selected } => {
            let items = menu_items(&PRE_AUTH_ITEMS, &PRE_AUTH_DESCRIPTIONS);
            let rect = centered_rect(50, 80, 50, 17, layout.main);
            Menu::new(&items, *selected, theme)
                .subtitle("Terminal typing practice")
                .render(rect, buf);
        }
        Screen::Login(form) | Screen::Register(form) => render_auth_form(form, theme, layout.main, buf),
        Screen::MainMenu { selected } => {
            let items = menu_items(&MAIN_MENU_ITEMS, &MAIN_MENU_DESCRIPTIONS);
            let name = session
                .identity()
                .map(|i| format!("Welcome, {}", i.name))
                .unwrap_or_default();
            let rect = centered_rect(50, 80, 50, 20, layout.main);
            Menu::new(&items, *selected, theme)
                .subtitle(&name)
                .render(rect, buf);
        }
        Screen::TimerTest(drill) => {
            let secs = drill.remaining().as_secs();
            let status = match drill.phase() {
                DrillPhase::NotStarted => "start typing to begin",
                _ => "",
            };
            render_typing(session, drill.tracker(), format!("{secs}s"), status, true, layout.main, buf);
        }
        Screen::WordCountTest(drill) => {
            let tracker = drill.tracker();
            let header = format!(
                "{}s  {}/{}",
                drill.elapsed().as_secs(),
                tracker.typed_word_count(),
                word_total(tracker)
            );
            let status = match drill.phase() {
                DrillPhase::NotStarted => "start typing to begin",
                _ => "",
            };
            render_typing(session, tracker, header, status, true, layout.main, buf);
        }
        Screen::ZenMode(drill) => {
            let header = format!("zen  {:.0} wpm", drill.live_wpm());
            render_typing(session, drill.tracker(), header, "", false, layout.main, buf);
        }
        Screen::Settings(form) => render_settings(form, theme, layout.main, buf),
        Screen::Results { selected } => {
            if let Some(done) = session.last_completed() {
                let options = session.result_options();
                let samples = done.result.wpm_series.len().max(1) as f64;
                let rect = centered_rect(70, 90, 50, 20, layout.main);
                Dashboard::new(&done.result, &options, *selected, theme)
                    .sample_secs(done.result.elapsed_secs / samples)
                    .render(rect, buf);
            }
        }
        Screen::Replay(engine) => render_replay(session, engine, layout.main, buf),
    }

    let footer: Vec<Line> = hints
        .into_iter()
        .map(|h| Line::from(Span::styled(h, Style::default().fg(colors.text_pending()))))
        .collect();
    Paragraph::new(footer).render(layout.footer, buf);
}

fn menu_items(labels: &[&'static str], descriptions: &[&'static str]) -> Vec<MenuItem> {
    labels
        .iter()
        .zip(descriptions)
        .zip(MENU_KEYS)
        .map(|((&label, &description), key)| MenuItem {
            key,
            label,
            description,
        })
        .collect()
}

fn word_total(tracker: &InputTracker) -> usize {
    tracker
        .target()
        .split(|&c| c == ' ')
        .filter(|w| !w.is_empty())
        .count()
}

fn render_header(session: &Session, area: Rect, buf: &mut Buffer) {
    let colors = &session.theme().colors;
    let user = session
        .identity()
        .map(|i| i.name.as_str())
        .unwrap_or("not signed in");
    let state = match session.state() {
        StateKind::TimerTest => "timer",
        StateKind::WordCountTest => "word count",
        StateKind::ZenMode => "zen",
        _ => "",
    };

    let mut spans = vec![
        Span::styled(
            " termtyper ",
            Style::default()
                .fg(colors.header_fg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("| {user} "), Style::default().fg(colors.header_fg())),
    ];
    if !state.is_empty() {
        spans.push(Span::styled(
            format!("| {state} "),
            Style::default().fg(colors.accent()),
        ));
    }
    Paragraph::new(Line::from(spans))
        .style(Style::default().bg(colors.header_bg()))
        .render(area, buf);
}

fn render_typing(
    session: &Session,
    tracker: &InputTracker,
    header: String,
    status: &str,
    centered: bool,
    area: Rect,
    buf: &mut Buffer,
) {
    let config = session.config();
    let theme = session.theme();
    let header = Line::from(Span::styled(
        header,
        Style::default()
            .fg(theme.colors.accent())
            .add_modifier(Modifier::BOLD),
    ));
    let footer = (!status.is_empty()).then_some(status);
    TypingArea::new(tracker, theme, (config.min_line_len, config.max_line_len))
        .header(header)
        .footer(footer)
        .centered(centered)
        .render(area, buf);
}

fn render_auth_form(form: &AuthForm, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let (title, fields) = match form.kind {
        FormKind::Login => (
            "Login",
            vec![("Email", &form.email), ("Password", &form.password)],
        ),
        FormKind::Register => (
            "Register",
            vec![
                ("Email", &form.email),
                ("Password", &form.password),
                ("Confirm", &form.confirm),
            ],
        ),
    };
    let height = fields.len() as u16 * 2 + 7;
    let rect = centered_rect(50, 50, 50, height, area);
    Form {
        title,
        fields,
        focused: form.focused,
        error: form.error.as_deref(),
        hint: "passwords need at least 8 characters",
        theme,
    }
    .render(rect, buf);
}

fn render_settings(form: &SettingsForm, theme: &Theme, area: Rect, buf: &mut Buffer) {
    let colors = &theme.colors;
    let block = Block::bordered()
        .title(" Settings ")
        .border_style(Style::default().fg(colors.border_focused()))
        .style(Style::default().bg(colors.bg()));
    let rect = centered_rect(50, 50, 44, 10, area);
    let inner = block.inner(rect);
    block.render(rect, buf);

    let rows = [
        ("Timer", format!("{}s", form.prefs.timed_drill_secs)),
        ("Words", form.prefs.word_count_target.to_string()),
    ];
    let mut lines = vec![Line::default()];
    for (i, (label, value)) in rows.iter().enumerate() {
        let selected = i == form.row;
        let indicator = if selected { ">" } else { " " };
        let style = if selected {
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {indicator} {label:<8}"), style),
            Span::styled(format!("< {value} >"), style),
        ]));
        lines.push(Line::default());
    }
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!(" \u{274c} {error}"),
            Style::default().fg(colors.error()),
        )));
    }
    Paragraph::new(lines).render(inner, buf);
}

fn render_replay(session: &Session, engine: &ReplayEngine, area: Rect, buf: &mut Buffer) {
    let (applied, total) = engine.progress();
    let header = format!("replay  {applied}/{total}");
    let status = match engine.phase() {
        ReplayPhase::Idle => "press any key to start the replay",
        ReplayPhase::Done => "replay finished, [enter] back to results",
        _ => "",
    };
    render_typing(session, engine.tracker(), header, status, true, area, buf);

    if engine.phase() == ReplayPhase::Playing {
        let secs = format!("{:.1}s", engine.elapsed().as_secs_f64());
        let row = Rect::new(area.x, area.bottom().saturating_sub(1), area.width, 1.min(area.height));
        Paragraph::new(Span::styled(
            secs,
            Style::default().fg(session.theme().colors.text_pending()),
        ))
        .alignment(Alignment::Right)
        .render(row, buf);
    }
}
