use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::engine::transitions::{StateKind, validate_transition};
use crate::generator::{GeneratorError, WordSource};
use crate::session::drill::{DrillInput, TimedDrill, WordCountDrill, ZenDrill};
use crate::session::replay::{ReplayEngine, ReplayError, ReplayPhase};
use crate::session::result::CompletedDrill;
use crate::store::{AccountError, AccountStore, DrillPrefs, Identity};
use crate::ui::components::menu::{next_index, prev_index};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::render;
use crate::ui::theme::Theme;

pub const PRE_AUTH_ITEMS: [&str; 3] = ["Register", "Login", "Guest"];
pub const MAIN_MENU_ITEMS: [&str; 4] = ["Timer", "Word Count", "Zen", "Settings"];
pub const TIMER_OPTIONS: [u32; 4] = [15, 30, 60, 120];
pub const WORD_OPTIONS: [u32; 4] = [15, 30, 45, 60];

/// Input to a session, processed strictly one at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Key(KeyEvent),
    /// Time since the previous tick. Drill clocks advance only by this.
    Tick(Duration),
    Resize(u16, u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Continue,
    Quit,
}

/// Conditions that end the session they happen in.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("word generator failed: {0}")]
    Generator(#[from] GeneratorError),
    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),
}

/// Collaborators shared by every session in the process.
#[derive(Clone)]
pub struct Services {
    pub words: Arc<dyn WordSource>,
    pub accounts: Arc<dyn AccountStore>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
}

pub struct AuthForm {
    pub kind: FormKind,
    pub email: LineInput,
    pub password: LineInput,
    pub confirm: LineInput,
    pub focused: usize,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            email: LineInput::new(""),
            password: LineInput::masked(),
            confirm: LineInput::masked(),
            focused: 0,
            error: None,
        }
    }

    pub fn field_count(&self) -> usize {
        match self.kind {
            FormKind::Login => 2,
            FormKind::Register => 3,
        }
    }

    fn focused_input(&mut self) -> &mut LineInput {
        match self.focused {
            0 => &mut self.email,
            1 => &mut self.password,
            _ => &mut self.confirm,
        }
    }

    fn fail(&mut self, err: &AccountError) {
        self.error = Some(err.to_string());
        self.password.clear();
        self.confirm.clear();
        self.focused = match err {
            AccountError::InvalidEmail | AccountError::EmailTaken => 0,
            _ => 1,
        };
    }
}

pub struct SettingsForm {
    pub prefs: DrillPrefs,
    pub row: usize,
    pub error: Option<String>,
}

/// Steps `value` through `options`, wrapping; an off-list value starts at the ends.
pub fn cycle_option(options: &[u32], value: u32, forward: bool) -> u32 {
    let len = options.len();
    let next = match options.iter().position(|&o| o == value) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    options[next]
}

impl SettingsForm {
    fn cycle(&mut self, forward: bool) {
        self.error = None;
        match self.row {
            0 => {
                self.prefs.timed_drill_secs =
                    cycle_option(&TIMER_OPTIONS, self.prefs.timed_drill_secs, forward)
            }
            _ => {
                self.prefs.word_count_target =
                    cycle_option(&WORD_OPTIONS, self.prefs.word_count_target, forward)
            }
        }
    }
}

/// The active screen and everything it owns.
pub enum Screen {
    PreAuth { selected: usize },
    Login(AuthForm),
    Register(AuthForm),
    MainMenu { selected: usize },
    TimerTest(TimedDrill),
    ZenMode(ZenDrill),
    WordCountTest(WordCountDrill),
    Settings(SettingsForm),
    Results { selected: usize },
    Replay(ReplayEngine),
}

impl Screen {
    pub fn kind(&self) -> StateKind {
        match self {
            Screen::PreAuth { .. } => StateKind::PreAuth,
            Screen::Login(_) => StateKind::Login,
            Screen::Register(_) => StateKind::Register,
            Screen::MainMenu { .. } => StateKind::MainMenu,
            Screen::TimerTest(_) => StateKind::TimerTest,
            Screen::ZenMode(_) => StateKind::ZenMode,
            Screen::WordCountTest(_) => StateKind::WordCountTest,
            Screen::Settings(_) => StateKind::Settings,
            Screen::Results { .. } => StateKind::Results,
            Screen::Replay(_) => StateKind::Replay,
        }
    }
}

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

/// Maps a key to a drill edit, if it is one.
fn drill_input(key: &KeyEvent) -> Option<DrillInput> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Backspace if ctrl || alt => Some(DrillInput::WordDelete),
        KeyCode::Backspace => Some(DrillInput::Backspace),
        KeyCode::Char('w') if ctrl => Some(DrillInput::WordDelete),
        KeyCode::Char(ch) if !ctrl && !alt && !ch.is_control() => Some(DrillInput::Char(ch)),
        _ => None,
    }
}

/// One user's path through menus, drills, results and replays.
pub struct Session {
    screen: Screen,
    identity: Option<Identity>,
    last_completed: Option<CompletedDrill>,
    config: Arc<Config>,
    theme: Theme,
    services: Services,
    size: (u16, u16),
}

impl Session {
    pub fn new(config: Arc<Config>, theme: Theme, services: Services) -> Self {
        Self {
            screen: Screen::PreAuth { selected: 0 },
            identity: None,
            last_completed: None,
            config,
            theme,
            services,
            size: (80, 24),
        }
    }

    pub fn state(&self) -> StateKind {
        self.screen.kind()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn valid_transitions(&self) -> &'static [StateKind] {
        self.state().valid_transitions()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn last_completed(&self) -> Option<&CompletedDrill> {
        self.last_completed.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn prefs(&self) -> DrillPrefs {
        self.identity
            .as_ref()
            .map(|i| i.prefs)
            .unwrap_or(self.config.guest_drill)
    }

    /// Actions offered on the results screen; replay only when a log exists.
    pub fn result_options(&self) -> Vec<&'static str> {
        let mut options = vec!["Next Test", "Main Menu"];
        if self
            .last_completed
            .as_ref()
            .is_some_and(|done| done.replay.is_some())
        {
            options.push("Replay");
        }
        options
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> Result<Effect, SessionError> {
        match event {
            SessionEvent::Key(key) => self.handle_key(key),
            SessionEvent::Tick(dt) => {
                self.handle_tick(dt)?;
                Ok(Effect::Continue)
            }
            SessionEvent::Resize(w, h) => {
                self.size = (w, h);
                Ok(Effect::Continue)
            }
        }
    }

    /// Moves to `to` if the allow-list permits it from the current state.
    /// Returns false, leaving everything unchanged, when it does not.
    pub fn enter(&mut self, to: StateKind) -> Result<bool, SessionError> {
        let from = self.state();
        if !validate_transition(from, to) {
            debug!(%from, %to, "ignored illegal transition");
            return Ok(false);
        }
        let Some(screen) = self.build_screen(to)? else {
            debug!(%from, %to, "transition has nothing to show");
            return Ok(false);
        };
        debug!(%from, %to, "transition");
        self.screen = screen;
        Ok(true)
    }

    fn build_screen(&self, kind: StateKind) -> Result<Option<Screen>, SessionError> {
        let config = &self.config;
        let prefs = self.prefs();
        let screen = match kind {
            StateKind::PreAuth => Screen::PreAuth { selected: 0 },
            StateKind::Login => Screen::Login(AuthForm::new(FormKind::Login)),
            StateKind::Register => Screen::Register(AuthForm::new(FormKind::Register)),
            StateKind::MainMenu => Screen::MainMenu { selected: 0 },
            StateKind::TimerTest => {
                let target = self
                    .services
                    .words
                    .generate(&config.word_pool, config.timed_word_count)?;
                Screen::TimerTest(TimedDrill::new(
                    target,
                    Duration::from_secs(prefs.timed_drill_secs as u64),
                    config.timed_tick(),
                    config.backspace_policy,
                ))
            }
            StateKind::WordCountTest => {
                let target = self
                    .services
                    .words
                    .generate(&config.word_pool, prefs.word_count_target as usize)?;
                Screen::WordCountTest(WordCountDrill::new(
                    target,
                    config.word_count_tick(),
                    config.backspace_policy,
                ))
            }
            StateKind::ZenMode => Screen::ZenMode(ZenDrill::new(config.zen_tick())),
            StateKind::Settings => Screen::Settings(SettingsForm {
                prefs,
                row: 0,
                error: None,
            }),
            StateKind::Results => {
                if self.last_completed.is_none() {
                    return Ok(None);
                }
                Screen::Results { selected: 0 }
            }
            StateKind::Replay => {
                let Some(source) = self.last_completed.as_ref().and_then(|d| d.replay.clone())
                else {
                    return Ok(None);
                };
                Screen::Replay(ReplayEngine::new(source, config.replay_tick()))
            }
        };
        Ok(Some(screen))
    }

    /// Replaces the running drill with a fresh one of the same kind.
    fn restart(&mut self) -> Result<(), SessionError> {
        let kind = self.state();
        if let Some(screen) = self.build_screen(kind)? {
            debug!(state = %kind, "drill restarted");
            self.screen = screen;
        }
        Ok(())
    }

    fn finish_drill(&mut self, done: CompletedDrill) -> Result<(), SessionError> {
        info!(
            kind = %done.result.kind,
            wpm = done.result.wpm,
            accuracy = ?done.result.accuracy,
            elapsed_secs = done.result.elapsed_secs,
            "drill completed"
        );
        self.last_completed = Some(done);
        self.enter(StateKind::Results)?;
        Ok(())
    }

    fn handle_tick(&mut self, dt: Duration) -> Result<(), SessionError> {
        let finished = match &mut self.screen {
            Screen::TimerTest(drill) => drill.tick(dt),
            Screen::WordCountTest(drill) => {
                drill.tick(dt);
                None
            }
            Screen::ZenMode(drill) => {
                drill.tick(dt);
                None
            }
            Screen::Replay(engine) => {
                engine.tick(dt).inspect_err(|e| error!(error = %e, "replay aborted"))?;
                None
            }
            _ => None,
        };
        if let Some(done) = finished {
            self.finish_drill(done)?;
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Effect, SessionError> {
        if key.kind != KeyEventKind::Press {
            return Ok(Effect::Continue);
        }
        if is_ctrl(&key, 'c') {
            return Ok(Effect::Quit);
        }

        match self.state() {
            StateKind::PreAuth => return self.handle_pre_auth_key(key),
            StateKind::Login | StateKind::Register => self.handle_form_key(key)?,
            StateKind::MainMenu => return self.handle_main_menu_key(key),
            StateKind::TimerTest | StateKind::WordCountTest | StateKind::ZenMode => {
                self.handle_drill_key(key)?
            }
            StateKind::Settings => self.handle_settings_key(key)?,
            StateKind::Results => self.handle_results_key(key)?,
            StateKind::Replay => self.handle_replay_key(key)?,
        }
        Ok(Effect::Continue)
    }

    fn handle_pre_auth_key(&mut self, key: KeyEvent) -> Result<Effect, SessionError> {
        let Screen::PreAuth { selected } = &mut self.screen else {
            return Ok(Effect::Continue);
        };
        let len = PRE_AUTH_ITEMS.len();
        let choice = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Effect::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                *selected = prev_index(*selected, len);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                *selected = next_index(*selected, len);
                None
            }
            KeyCode::Char(ch @ '1'..='3') => Some(ch as usize - '1' as usize),
            KeyCode::Enter => Some(*selected),
            _ => None,
        };
        match choice {
            Some(0) => {
                self.enter(StateKind::Register)?;
            }
            Some(1) => {
                self.enter(StateKind::Login)?;
            }
            Some(_) => {
                self.identity = Some(Identity::guest(self.config.guest_drill));
                info!("guest session started");
                self.enter(StateKind::MainMenu)?;
            }
            None => {}
        }
        Ok(Effect::Continue)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        let (Screen::Login(form) | Screen::Register(form)) = &mut self.screen else {
            return Ok(());
        };
        let last = form.field_count() - 1;
        match form.focused_input().handle(key) {
            InputResult::Continue => {}
            InputResult::Next => form.focused = (form.focused + 1).min(last),
            InputResult::Prev => form.focused = form.focused.saturating_sub(1),
            InputResult::Cancel => {
                self.enter(StateKind::PreAuth)?;
            }
            InputResult::Submit if form.focused < last => form.focused += 1,
            InputResult::Submit => {
                let accounts = &self.services.accounts;
                let email = form.email.value();
                let outcome = match form.kind {
                    FormKind::Login => accounts.authenticate(&email, &form.password.value()),
                    FormKind::Register => {
                        accounts.register(&email, &form.password.value(), &form.confirm.value())
                    }
                };
                match outcome {
                    Ok(identity) => {
                        info!(user = %identity.name, "signed in");
                        self.identity = Some(identity);
                        self.enter(StateKind::MainMenu)?;
                    }
                    Err(err) => {
                        warn!(kind = ?form.kind, error = %err, "authentication failed");
                        form.fail(&err);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_main_menu_key(&mut self, key: KeyEvent) -> Result<Effect, SessionError> {
        let Screen::MainMenu { selected } = &mut self.screen else {
            return Ok(Effect::Continue);
        };
        let len = MAIN_MENU_ITEMS.len();
        let choice = match key.code {
            KeyCode::Char('q') => return Ok(Effect::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                *selected = prev_index(*selected, len);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                *selected = next_index(*selected, len);
                None
            }
            KeyCode::Char(ch @ '1'..='4') => Some(ch as usize - '1' as usize),
            KeyCode::Enter => Some(*selected),
            _ => None,
        };
        let target = match choice {
            Some(0) => StateKind::TimerTest,
            Some(1) => StateKind::WordCountTest,
            Some(2) => StateKind::ZenMode,
            Some(3) => StateKind::Settings,
            _ => return Ok(Effect::Continue),
        };
        self.enter(target)?;
        Ok(Effect::Continue)
    }

    fn handle_drill_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        if key.code == KeyCode::Esc || is_ctrl(&key, 'q') {
            self.enter(StateKind::MainMenu)?;
            return Ok(());
        }
        if is_ctrl(&key, 'r') {
            return self.restart();
        }
        let Some(input) = drill_input(&key) else {
            return Ok(());
        };

        let finished = match &mut self.screen {
            Screen::TimerTest(drill) => {
                drill.input(input);
                None
            }
            Screen::WordCountTest(drill) => drill.input(input)?,
            Screen::ZenMode(drill) => {
                drill.input(input);
                None
            }
            _ => None,
        };
        if let Some(done) = finished {
            self.finish_drill(done)?;
        }
        Ok(())
    }

    fn handle_settings_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        let Screen::Settings(form) = &mut self.screen else {
            return Ok(());
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => form.row = form.row.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => form.row = (form.row + 1).min(1),
            KeyCode::Right | KeyCode::Char('l') => form.cycle(true),
            KeyCode::Left | KeyCode::Char('h') => form.cycle(false),
            KeyCode::Enter | KeyCode::Esc => {
                let prefs = form.prefs;
                let saved = match self.identity.as_ref().and_then(|i| i.id) {
                    Some(id) => self.services.accounts.update_prefs(id, prefs),
                    None => prefs.validate(),
                };
                match saved {
                    Ok(()) => {
                        if let Some(identity) = self.identity.as_mut() {
                            identity.prefs = prefs;
                        }
                        self.enter(StateKind::MainMenu)?;
                    }
                    Err(err) => {
                        warn!(error = %err, "saving settings failed");
                        form.error = Some(err.to_string());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        let options = self.result_options();
        let Screen::Results { selected } = &mut self.screen else {
            return Ok(());
        };
        let target = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                *selected = prev_index(*selected, options.len());
                None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                *selected = next_index(*selected, options.len());
                None
            }
            KeyCode::Esc => Some(StateKind::MainMenu),
            KeyCode::Enter => match options.get(*selected).copied() {
                Some("Next Test") => self.last_completed.as_ref().map(|done| match done.result.kind {
                    crate::session::result::DrillKind::Timed => StateKind::TimerTest,
                    crate::session::result::DrillKind::WordCount => StateKind::WordCountTest,
                }),
                Some("Replay") => Some(StateKind::Replay),
                _ => Some(StateKind::MainMenu),
            },
            _ => None,
        };
        if let Some(target) = target {
            if target == StateKind::Replay {
                info!("replay started");
            }
            self.enter(target)?;
        }
        Ok(())
    }

    fn handle_replay_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        let Screen::Replay(engine) = &mut self.screen else {
            return Ok(());
        };
        if is_ctrl(&key, 'q') {
            self.enter(StateKind::MainMenu)?;
            return Ok(());
        }
        match (engine.phase(), key.code) {
            (_, KeyCode::Esc) | (ReplayPhase::Done, KeyCode::Enter) => {
                self.enter(StateKind::Results)?;
            }
            (ReplayPhase::Idle, _) => engine.arm(),
            _ => {}
        }
        Ok(())
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        self.draw(area, frame.buffer_mut());
    }

    pub fn draw(&self, area: Rect, buf: &mut Buffer) {
        render::draw(self, area, buf);
    }

    /// Renders one frame as plain text, one line per row, trailing blanks trimmed.
    pub fn render_text(&self, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        self.draw(area, &mut buf);

        let mut rows = Vec::with_capacity(height as usize);
        for y in 0..height {
            let row: String = (0..width)
                .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
                .collect();
            rows.push(row.trim_end().to_string());
        }
        rows.join("\n")
    }
}
