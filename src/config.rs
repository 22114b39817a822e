use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::generator::COMMON_WORDS;
use crate::session::input::BackspacePolicy;
use crate::store::DrillPrefs;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_word_pool")]
    pub word_pool: String,
    /// Words drawn for a timed drill; more than anyone types in the time.
    #[serde(default = "default_timed_word_count")]
    pub timed_word_count: usize,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_timed_tick_ms")]
    pub timed_tick_ms: u64,
    #[serde(default = "default_word_count_tick_ms")]
    pub word_count_tick_ms: u64,
    #[serde(default = "default_zen_tick_ms")]
    pub zen_tick_ms: u64,
    #[serde(default = "default_replay_tick_ms")]
    pub replay_tick_ms: u64,
    #[serde(default = "default_min_line_len")]
    pub min_line_len: usize,
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    #[serde(default)]
    pub backspace_policy: BackspacePolicy,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub guest_drill: DrillPrefs,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_word_pool() -> String {
    COMMON_WORDS.to_string()
}
fn default_timed_word_count() -> usize {
    300
}
fn default_tick_rate_ms() -> u64 {
    50
}
fn default_timed_tick_ms() -> u64 {
    1000
}
fn default_word_count_tick_ms() -> u64 {
    10
}
fn default_zen_tick_ms() -> u64 {
    1000
}
fn default_replay_tick_ms() -> u64 {
    1
}
fn default_min_line_len() -> usize {
    5
}
fn default_max_line_len() -> usize {
    40
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    22222
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termtyper")
        .to_string_lossy()
        .to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            word_pool: default_word_pool(),
            timed_word_count: default_timed_word_count(),
            tick_rate_ms: default_tick_rate_ms(),
            timed_tick_ms: default_timed_tick_ms(),
            word_count_tick_ms: default_word_count_tick_ms(),
            zen_tick_ms: default_zen_tick_ms(),
            replay_tick_ms: default_replay_tick_ms(),
            min_line_len: default_min_line_len(),
            max_line_len: default_max_line_len(),
            backspace_policy: BackspacePolicy::default(),
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            guest_drill: DrillPrefs::default(),
        }
    }
}

impl Config {
    /// Loads from `path`, or the default location when `None`.
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    /// Writes to `path`, or the default location when `None`, and returns where.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(path)
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termtyper")
            .join("config.toml")
    }

    /// Repairs values that would make drills or layout misbehave.
    pub fn normalize(&mut self) {
        if self.min_line_len == 0 {
            self.min_line_len = default_min_line_len();
        }
        if self.max_line_len < self.min_line_len {
            self.max_line_len = self.min_line_len;
        }
        if self.guest_drill.validate().is_err() {
            self.guest_drill = DrillPrefs::default();
        }
        if self.timed_word_count == 0 {
            self.timed_word_count = default_timed_word_count();
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn timed_tick(&self) -> Duration {
        Duration::from_millis(self.timed_tick_ms.max(1))
    }

    pub fn word_count_tick(&self) -> Duration {
        Duration::from_millis(self.word_count_tick_ms.max(1))
    }

    pub fn zen_tick(&self) -> Duration {
        Duration::from_millis(self.zen_tick_ms.max(1))
    }

    pub fn replay_tick(&self) -> Duration {
        Duration::from_millis(self.replay_tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.word_pool, "Common words");
        assert_eq!(config.timed_word_count, 300);
        assert_eq!(config.port, 22222);
        assert_eq!(config.backspace_policy, BackspacePolicy::Free);
        assert_eq!(config.guest_drill, DrillPrefs::default());
        assert!(config.data_dir.contains("termtyper"));
    }

    #[test]
    fn test_config_partial_file() {
        let toml_str = r#"
theme = "nord"
port = 2323
backspace_policy = "mistakes-only"

[guest_drill]
timed_drill_secs = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "nord");
        assert_eq!(config.port, 2323);
        assert_eq!(config.backspace_policy, BackspacePolicy::MistakesOnly);
        assert_eq!(config.guest_drill.timed_drill_secs, 60);
        assert_eq!(config.guest_drill.word_count_target, 30);
        assert_eq!(config.max_line_len, 40);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.host, deserialized.host);
        assert_eq!(config.replay_tick_ms, deserialized.replay_tick_ms);
        assert_eq!(config.guest_drill, deserialized.guest_drill);
    }

    #[test]
    fn test_normalize_repairs_bad_values() {
        let mut config = Config {
            min_line_len: 10,
            max_line_len: 3,
            guest_drill: DrillPrefs {
                timed_drill_secs: 0,
                word_count_target: 30,
            },
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.max_line_len, 10);
        assert_eq!(config.guest_drill, DrillPrefs::default());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.port, 22222);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            port: 4040,
            backspace_policy: BackspacePolicy::MistakesOnly,
            ..Config::default()
        };
        let written = config.save(Some(&path)).unwrap();
        assert_eq!(written, path);
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.port, 4040);
        assert_eq!(loaded.backspace_policy, BackspacePolicy::MistakesOnly);
    }
}
