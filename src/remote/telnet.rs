//! Just enough telnet to drive a full-screen UI: the server echoes and
//! suppresses go-ahead so clients send keys one at a time, and it asks for
//! NAWS so window sizes arrive as subnegotiations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;
pub const OPT_NAWS: u8 = 31;
pub const OPT_LINEMODE: u8 = 34;

/// Largest window a client may report; bigger NAWS values are clamped.
pub const MAX_COLS: u16 = 500;
pub const MAX_ROWS: u16 = 200;
/// Subnegotiation bytes past this are discarded. NAWS needs five.
const MAX_SUB_LEN: usize = 64;

/// Sent once right after accept.
pub fn negotiation() -> [u8; 12] {
    [
        IAC, WILL, OPT_ECHO,
        IAC, WILL, OPT_SGA,
        IAC, DO, OPT_NAWS,
        IAC, DONT, OPT_LINEMODE,
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientInput {
    Key(KeyEvent),
    Resize(u16, u16),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    /// Saw IAC WILL/WONT/DO/DONT, the option byte is next.
    Option,
    Sub,
    SubIac,
    Esc,
    Csi,
    Ss3,
}

/// Turns the client byte stream into keys and window sizes.
#[derive(Debug)]
pub struct Decoder {
    state: State,
    sub: Vec<u8>,
    params: Vec<u8>,
    utf8: Vec<u8>,
    after_cr: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

fn key(code: KeyCode) -> ClientInput {
    ClientInput::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn key_with(code: KeyCode, modifiers: KeyModifiers) -> ClientInput {
    ClientInput::Key(KeyEvent::new(code, modifiers))
}

fn utf8_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            sub: Vec::new(),
            params: Vec::new(),
            utf8: Vec::new(),
            after_cr: false,
        }
    }

    /// Decodes one read from the socket. A lone ESC at the end of a read is
    /// taken as the Esc key.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ClientInput> {
        let mut out = Vec::new();
        for &b in bytes {
            self.byte(b, &mut out);
        }
        if self.state == State::Esc {
            self.state = State::Data;
            out.push(key(KeyCode::Esc));
        }
        out
    }

    fn byte(&mut self, b: u8, out: &mut Vec<ClientInput>) {
        match self.state {
            State::Data => self.data(b, out),
            State::Iac => {
                self.state = match b {
                    WILL | WONT | DO | DONT => State::Option,
                    SB => {
                        self.sub.clear();
                        State::Sub
                    }
                    // escaped 0xFF data byte, never valid UTF-8
                    _ => State::Data,
                };
            }
            State::Option => self.state = State::Data,
            State::Sub => {
                if b == IAC {
                    self.state = State::SubIac;
                } else {
                    self.push_sub(b);
                }
            }
            State::SubIac => match b {
                IAC => {
                    self.push_sub(IAC);
                    self.state = State::Sub;
                }
                SE => {
                    self.state = State::Data;
                    let sub = std::mem::take(&mut self.sub);
                    if let Some(size) = parse_naws(&sub) {
                        out.push(ClientInput::Resize(size.0, size.1));
                    }
                }
                _ => self.state = State::Data,
            },
            State::Esc => match b {
                b'[' => {
                    self.params.clear();
                    self.state = State::Csi;
                }
                b'O' => self.state = State::Ss3,
                0x1B => out.push(key(KeyCode::Esc)),
                0x7F | 0x08 => {
                    self.state = State::Data;
                    out.push(key_with(KeyCode::Backspace, KeyModifiers::ALT));
                }
                0x20..=0x7E => {
                    self.state = State::Data;
                    out.push(key_with(KeyCode::Char(b as char), KeyModifiers::ALT));
                }
                _ => {
                    self.state = State::Data;
                    out.push(key(KeyCode::Esc));
                    self.data(b, out);
                }
            },
            State::Csi => match b {
                0x30..=0x3F => self.params.push(b),
                0x40..=0x7E => {
                    self.state = State::Data;
                    if let Some(input) = csi_key(&self.params, b) {
                        out.push(input);
                    }
                }
                _ => self.state = State::Data,
            },
            State::Ss3 => {
                self.state = State::Data;
                if let Some(input) = csi_key(&[], b) {
                    out.push(input);
                }
            }
        }
    }

    fn push_sub(&mut self, b: u8) {
        if self.sub.len() < MAX_SUB_LEN {
            self.sub.push(b);
        }
    }

    fn data(&mut self, b: u8, out: &mut Vec<ClientInput>) {
        let after_cr = std::mem::take(&mut self.after_cr);
        if !self.utf8.is_empty() && !(0x80..=0xBF).contains(&b) {
            // truncated sequence; the byte starts fresh input
            self.utf8.clear();
        }
        if !self.utf8.is_empty() {
            self.utf8.push(b);
            if self.utf8.len() == utf8_len(self.utf8[0]) {
                let bytes = std::mem::take(&mut self.utf8);
                if let Some(ch) = std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
                    out.push(key(KeyCode::Char(ch)));
                }
            }
            return;
        }

        match b {
            IAC => self.state = State::Iac,
            0x1B => self.state = State::Esc,
            b'\r' => {
                self.after_cr = true;
                out.push(key(KeyCode::Enter));
            }
            // CR NUL and CR LF are one Enter
            0x00 | b'\n' if after_cr => {}
            b'\n' => out.push(key(KeyCode::Enter)),
            b'\t' => out.push(key(KeyCode::Tab)),
            0x7F => out.push(key(KeyCode::Backspace)),
            0x08 => out.push(key_with(KeyCode::Backspace, KeyModifiers::CONTROL)),
            0x01..=0x1A => out.push(key_with(
                KeyCode::Char((b'a' + b - 1) as char),
                KeyModifiers::CONTROL,
            )),
            0x20..=0x7E => out.push(key(KeyCode::Char(b as char))),
            0xC0..=0xF7 => self.utf8.push(b),
            _ => {}
        }
    }
}

fn csi_key(params: &[u8], final_byte: u8) -> Option<ClientInput> {
    let input = match (params, final_byte) {
        (_, b'A') => key(KeyCode::Up),
        (_, b'B') => key(KeyCode::Down),
        (_, b'C') => key(KeyCode::Right),
        (_, b'D') => key(KeyCode::Left),
        (_, b'H') | (b"1", b'~') | (b"7", b'~') => key(KeyCode::Home),
        (_, b'F') | (b"4", b'~') | (b"8", b'~') => key(KeyCode::End),
        (_, b'Z') => key(KeyCode::BackTab),
        (b"3", b'~') => key(KeyCode::Delete),
        _ => return None,
    };
    Some(input)
}

/// Width and height from a NAWS payload (option byte first), clamped to
/// `MAX_COLS` x `MAX_ROWS`.
pub fn parse_naws(sub: &[u8]) -> Option<(u16, u16)> {
    match sub {
        [OPT_NAWS, w0, w1, h0, h1] => {
            let width = u16::from_be_bytes([*w0, *w1]);
            let height = u16::from_be_bytes([*h0, *h1]);
            (width > 0 && height > 0).then_some((width.min(MAX_COLS), height.min(MAX_ROWS)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(inputs: &[ClientInput]) -> Vec<KeyCode> {
        inputs
            .iter()
            .filter_map(|i| match i {
                ClientInput::Key(k) => Some(k.code),
                ClientInput::Resize(..) => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text() {
        let mut d = Decoder::new();
        assert_eq!(
            keys(&d.feed(b"hi ")),
            vec![KeyCode::Char('h'), KeyCode::Char('i'), KeyCode::Char(' ')]
        );
    }

    #[test]
    fn test_negotiation_replies_are_swallowed() {
        let mut d = Decoder::new();
        let out = d.feed(&[IAC, DO, OPT_ECHO, b'a', IAC, WILL, OPT_NAWS]);
        assert_eq!(keys(&out), vec![KeyCode::Char('a')]);
    }

    #[test]
    fn test_naws_resize() {
        let mut d = Decoder::new();
        let out = d.feed(&[IAC, SB, OPT_NAWS, 0, 120, 0, 40, IAC, SE]);
        assert_eq!(out, vec![ClientInput::Resize(120, 40)]);
    }

    #[test]
    fn test_naws_with_escaped_iac() {
        let mut d = Decoder::new();
        let out = d.feed(&[IAC, SB, OPT_NAWS, 0, IAC, IAC, 0, 50, IAC, SE]);
        assert_eq!(out, vec![ClientInput::Resize(255, 50)]);
    }

    #[test]
    fn test_naws_split_across_reads() {
        let mut d = Decoder::new();
        assert!(d.feed(&[IAC, SB, OPT_NAWS, 0]).is_empty());
        assert_eq!(d.feed(&[80, 0, 24, IAC, SE]), vec![ClientInput::Resize(80, 24)]);
    }

    #[test]
    fn test_cr_nul_is_one_enter() {
        let mut d = Decoder::new();
        assert_eq!(keys(&d.feed(b"\r\0")), vec![KeyCode::Enter]);
        assert_eq!(keys(&d.feed(b"\r\n")), vec![KeyCode::Enter]);
        assert_eq!(keys(&d.feed(b"\n")), vec![KeyCode::Enter]);
    }

    #[test]
    fn test_backspace_variants() {
        let mut d = Decoder::new();
        let out = d.feed(&[0x7F, 0x08, 0x17]);
        let expected = vec![
            key(KeyCode::Backspace),
            key_with(KeyCode::Backspace, KeyModifiers::CONTROL),
            key_with(KeyCode::Char('w'), KeyModifiers::CONTROL),
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_ctrl_c() {
        let mut d = Decoder::new();
        assert_eq!(
            d.feed(&[0x03]),
            vec![key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)]
        );
    }

    #[test]
    fn test_arrows_and_backtab() {
        let mut d = Decoder::new();
        let out = d.feed(b"\x1b[A\x1b[B\x1bOC\x1b[D\x1b[Z\x1b[3~");
        assert_eq!(
            keys(&out),
            vec![
                KeyCode::Up,
                KeyCode::Down,
                KeyCode::Right,
                KeyCode::Left,
                KeyCode::BackTab,
                KeyCode::Delete
            ]
        );
    }

    #[test]
    fn test_lone_escape() {
        let mut d = Decoder::new();
        assert_eq!(keys(&d.feed(&[0x1B])), vec![KeyCode::Esc]);
    }

    #[test]
    fn test_alt_backspace() {
        let mut d = Decoder::new();
        assert_eq!(
            d.feed(&[0x1B, 0x7F]),
            vec![key_with(KeyCode::Backspace, KeyModifiers::ALT)]
        );
    }

    #[test]
    fn test_utf8_char() {
        let mut d = Decoder::new();
        assert_eq!(keys(&d.feed("é".as_bytes())), vec![KeyCode::Char('é')]);
    }

    #[test]
    fn test_huge_naws_is_clamped() {
        let mut d = Decoder::new();
        let out = d.feed(&[IAC, SB, OPT_NAWS, IAC, IAC, IAC, IAC, IAC, IAC, IAC, IAC, IAC, SE]);
        assert_eq!(out, vec![ClientInput::Resize(MAX_COLS, MAX_ROWS)]);
    }

    #[test]
    fn test_endless_subnegotiation_is_bounded() {
        let mut d = Decoder::new();
        d.feed(&[IAC, SB, OPT_NAWS]);
        for _ in 0..1024 {
            assert!(d.feed(&[b'x'; 1024]).is_empty());
        }
        assert_eq!(d.sub.len(), MAX_SUB_LEN);

        // the oversized payload is dropped and decoding carries on
        assert_eq!(keys(&d.feed(&[IAC, SE, b'k'])), vec![KeyCode::Char('k')]);
        assert_eq!(
            d.feed(&[IAC, SB, OPT_NAWS, 0, 90, 0, 30, IAC, SE]),
            vec![ClientInput::Resize(90, 30)]
        );
    }

    #[test]
    fn test_broken_utf8_keeps_following_key() {
        let mut d = Decoder::new();
        assert_eq!(keys(&d.feed(&[0xC3, b'a'])), vec![KeyCode::Char('a')]);
        assert_eq!(keys(&d.feed(&[0xE2, 0x82, b'\r'])), vec![KeyCode::Enter]);
        assert_eq!(keys(&d.feed("ü".as_bytes())), vec![KeyCode::Char('ü')]);
    }

    #[test]
    fn test_parse_naws_rejects_zero() {
        assert_eq!(parse_naws(&[OPT_NAWS, 0, 0, 0, 24]), None);
        assert_eq!(parse_naws(&[OPT_NAWS, 0, 80]), None);
    }
}
