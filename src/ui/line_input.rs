use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Longest value a form field accepts.
pub const MAX_FIELD_LEN: usize = 128;

/// What a key did to a field, as seen by the form around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    /// Tab or Down.
    Next,
    /// BackTab or Up.
    Prev,
    Submit,
    Cancel,
}

/// One editable line of a login or register form.
#[derive(Clone, Debug, Default)]
pub struct LineInput {
    chars: Vec<char>,
    cursor: usize,
    masked: bool,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().take(MAX_FIELD_LEN).collect();
        Self {
            cursor: chars.len(),
            chars,
            masked: false,
        }
    }

    /// Shows bullets instead of the typed characters.
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Display text split around the cursor cell; the cell is `None` past the end.
    pub fn render_parts(&self) -> (String, Option<char>, String) {
        let shown = |c: &char| if self.masked { '•' } else { *c };
        let before = self.chars[..self.cursor].iter().map(shown).collect();
        let at = self.chars.get(self.cursor).map(shown);
        let after = self
            .chars
            .iter()
            .skip(self.cursor + 1)
            .map(shown)
            .collect();
        (before, at, after)
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, ctrl) {
            (KeyCode::Esc, _) => return InputResult::Cancel,
            (KeyCode::Enter, _) => return InputResult::Submit,
            (KeyCode::Tab | KeyCode::Down, _) => return InputResult::Next,
            (KeyCode::BackTab | KeyCode::Up, _) => return InputResult::Prev,
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.chars.len()),
            (KeyCode::Home, _) | (KeyCode::Char('a'), true) => self.cursor = 0,
            (KeyCode::End, _) | (KeyCode::Char('e'), true) => self.cursor = self.chars.len(),
            (KeyCode::Char('u'), true) => {
                self.chars.drain(..self.cursor);
                self.cursor = 0;
            }
            (KeyCode::Backspace, true) | (KeyCode::Char('w'), true) => self.rub_out_word(),
            (KeyCode::Backspace, false) if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
            }
            (KeyCode::Delete, _) if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
            }
            (KeyCode::Char(ch), false) if self.chars.len() < MAX_FIELD_LEN => {
                self.chars.insert(self.cursor, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    /// Removes whitespace before the cursor, then the word before that.
    fn rub_out_word(&mut self) {
        let before = &self.chars[..self.cursor];
        let spaces = before.iter().rev().take_while(|c| c.is_whitespace()).count();
        let word = before[..before.len() - spaces]
            .iter()
            .rev()
            .take_while(|c| !c.is_whitespace())
            .count();
        let start = self.cursor - spaces - word;
        self.chars.drain(start..self.cursor);
        self.cursor = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut LineInput, code: KeyCode) -> InputResult {
        input.handle(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press_ctrl(input: &mut LineInput, ch: char) -> InputResult {
        input.handle(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    fn type_str(input: &mut LineInput, s: &str) {
        for ch in s.chars() {
            press(input, KeyCode::Char(ch));
        }
    }

    #[test]
    fn test_editing_in_the_middle() {
        let mut field = LineInput::new("mal");
        press(&mut field, KeyCode::Left);
        type_str(&mut field, "i");
        assert_eq!(field.value(), "mail");
        assert_eq!(field.cursor(), 3);

        press(&mut field, KeyCode::Home);
        press(&mut field, KeyCode::Delete);
        assert_eq!(field.value(), "ail");
        press(&mut field, KeyCode::End);
        press(&mut field, KeyCode::Backspace);
        assert_eq!(field.value(), "ai");
    }

    #[test]
    fn test_backspace_on_empty_field() {
        let mut field = LineInput::default();
        press(&mut field, KeyCode::Backspace);
        press(&mut field, KeyCode::Delete);
        assert_eq!(field.value(), "");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_word_rub_out() {
        let mut field = LineInput::new("ana maria  ");
        press_ctrl(&mut field, 'w');
        assert_eq!(field.value(), "ana ");
        field.handle(KeyEvent::new(KeyCode::Backspace, KeyModifiers::CONTROL));
        assert_eq!(field.value(), "");
        press_ctrl(&mut field, 'w');
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_kill_to_start() {
        let mut field = LineInput::new("user@host");
        for _ in 0..4 {
            press(&mut field, KeyCode::Left);
        }
        press_ctrl(&mut field, 'u');
        assert_eq!(field.value(), "host");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_navigation_results() {
        let mut field = LineInput::default();
        assert_eq!(press(&mut field, KeyCode::Tab), InputResult::Next);
        assert_eq!(press(&mut field, KeyCode::Down), InputResult::Next);
        assert_eq!(press(&mut field, KeyCode::BackTab), InputResult::Prev);
        assert_eq!(press(&mut field, KeyCode::Enter), InputResult::Submit);
        assert_eq!(press(&mut field, KeyCode::Esc), InputResult::Cancel);
        assert_eq!(press(&mut field, KeyCode::Char('x')), InputResult::Continue);
    }

    #[test]
    fn test_masked_render() {
        let mut field = LineInput::masked();
        type_str(&mut field, "pw12");
        press(&mut field, KeyCode::Left);
        assert_eq!(field.value(), "pw12");
        assert_eq!(
            field.render_parts(),
            ("•••".to_string(), Some('•'), String::new())
        );
    }

    #[test]
    fn test_length_cap() {
        let mut field = LineInput::default();
        type_str(&mut field, &"x".repeat(MAX_FIELD_LEN + 5));
        assert_eq!(field.value().len(), MAX_FIELD_LEN);
    }
}
