use std::fs;
use std::path::PathBuf;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_THEME: &str = "catppuccin-mocha";

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("no theme named {0}")]
    NotFound(String),
    #[error("theme {name} is malformed: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("theme {name} has a bad {field} colour {value:?}")]
    BadColor {
        name: String,
        field: &'static str,
        value: String,
    },
}

/// `#rrggbb` to a terminal colour.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

macro_rules! palette {
    ($($field:ident),* $(,)?) => {
        /// Colours as written in a theme file. Every entry is checked when the
        /// theme loads, so the accessors never see a bad value.
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub struct ThemeColors {
            $(pub $field: String,)*
        }

        impl ThemeColors {
            $(
                pub fn $field(&self) -> Color {
                    parse_hex(&self.$field).unwrap_or(Color::Reset)
                }
            )*

            fn check(&self, name: &str) -> Result<(), ThemeError> {
                $(
                    if parse_hex(&self.$field).is_none() {
                        return Err(ThemeError::BadColor {
                            name: name.to_string(),
                            field: stringify!($field),
                            value: self.$field.clone(),
                        });
                    }
                )*
                Ok(())
            }
        }
    };
}

palette!(
    bg,
    fg,
    text_correct,
    text_incorrect,
    text_incorrect_bg,
    text_pending,
    text_cursor_bg,
    text_cursor_fg,
    accent,
    border,
    border_focused,
    header_bg,
    header_fg,
    error,
    warning,
    success,
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

impl Theme {
    /// Themes in `<config_dir>/termtyper/themes/` shadow the bundled ones.
    pub fn load(name: &str) -> Result<Self, ThemeError> {
        let filename = format!("{name}.toml");
        let user_file = user_theme_dir()
            .map(|dir| dir.join(&filename))
            .and_then(|path| fs::read_to_string(path).ok());

        let content = match user_file {
            Some(content) => content,
            None => {
                let file = ThemeAssets::get(&filename)
                    .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
                String::from_utf8_lossy(file.data.as_ref()).into_owned()
            }
        };
        Self::parse(name, &content)
    }

    pub fn parse(name: &str, content: &str) -> Result<Self, ThemeError> {
        let theme: Theme = toml::from_str(content).map_err(|source| ThemeError::Parse {
            name: name.to_string(),
            source,
        })?;
        theme.colors.check(name)?;
        Ok(theme)
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(str::to_string))
            .collect()
    }
}

fn user_theme_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("termtyper").join("themes"))
}

impl Default for Theme {
    fn default() -> Self {
        let bundled = ThemeAssets::get(&format!("{DEFAULT_THEME}.toml"))
            .and_then(|file| Self::parse(DEFAULT_THEME, &String::from_utf8_lossy(file.data.as_ref())).ok());
        bundled.unwrap_or_else(|| Self {
            name: "plain".to_string(),
            colors: ThemeColors::plain(),
        })
    }
}

impl ThemeColors {
    /// Black and white, for when no theme file can be read.
    fn plain() -> Self {
        let black = "#000000".to_string();
        let white = "#ffffff".to_string();
        let grey = "#808080".to_string();
        Self {
            bg: black.clone(),
            fg: white.clone(),
            text_correct: white.clone(),
            text_incorrect: "#ff0000".to_string(),
            text_incorrect_bg: black.clone(),
            text_pending: grey.clone(),
            text_cursor_bg: white.clone(),
            text_cursor_fg: black.clone(),
            accent: white.clone(),
            border: grey.clone(),
            border_focused: white.clone(),
            header_bg: grey,
            header_fg: white.clone(),
            error: "#ff0000".to_string(),
            warning: "#ffff00".to_string(),
            success: "#00ff00".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let names = Theme::available_themes();
        assert!(names.contains(&DEFAULT_THEME.to_string()));
        for name in names {
            let theme = Theme::load(&name).unwrap();
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff0080"), Some(Color::Rgb(255, 0, 128)));
        assert_eq!(parse_hex("00ff00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_hex("nonsense"), None);
        assert_eq!(parse_hex("#12345"), None);
    }

    #[test]
    fn test_unknown_theme() {
        assert!(matches!(
            Theme::load("no-such-theme"),
            Err(ThemeError::NotFound(_))
        ));
    }

    #[test]
    fn test_bad_colour_is_rejected() {
        let mut content = String::from("name = \"broken\"\n[colors]\n");
        for field in ["bg", "fg", "text_correct", "text_incorrect", "text_incorrect_bg",
            "text_pending", "text_cursor_bg", "text_cursor_fg", "accent", "border",
            "border_focused", "header_bg", "header_fg", "error", "warning"]
        {
            content.push_str(&format!("{field} = \"#101010\"\n"));
        }
        content.push_str("success = \"green\"\n");

        match Theme::parse("broken", &content) {
            Err(ThemeError::BadColor { field, .. }) => assert_eq!(field, "success"),
            other => panic!("expected a bad colour, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_bundled_theme() {
        assert_eq!(Theme::default().name, DEFAULT_THEME);
    }
}
