pub mod json_store;
pub mod memory;
pub mod password;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use json_store::JsonAccountStore;
pub use memory::MemoryAccountStore;

pub const TIMED_SECS_RANGE: std::ops::RangeInclusive<u32> = 1..=1440;
pub const WORD_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=500;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email already exists")]
    EmailTaken,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("passwords must match")]
    PasswordMismatch,
    #[error("no account with id {0}")]
    UnknownAccount(u64),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("account store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("account store is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Drill sizes a user trains with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillPrefs {
    #[serde(default = "default_timed_drill_secs")]
    pub timed_drill_secs: u32,
    #[serde(default = "default_word_count_target")]
    pub word_count_target: u32,
}

fn default_timed_drill_secs() -> u32 {
    30
}

fn default_word_count_target() -> u32 {
    30
}

impl Default for DrillPrefs {
    fn default() -> Self {
        Self {
            timed_drill_secs: default_timed_drill_secs(),
            word_count_target: default_word_count_target(),
        }
    }
}

impl DrillPrefs {
    pub fn validate(&self) -> Result<(), AccountError> {
        if !TIMED_SECS_RANGE.contains(&self.timed_drill_secs) {
            return Err(AccountError::InvalidConfig(format!(
                "time must be between {} and {} seconds",
                TIMED_SECS_RANGE.start(),
                TIMED_SECS_RANGE.end()
            )));
        }
        if !WORD_COUNT_RANGE.contains(&self.word_count_target) {
            return Err(AccountError::InvalidConfig(format!(
                "words must be between {} and {}",
                WORD_COUNT_RANGE.start(),
                WORD_COUNT_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// Who is driving a session. Guests have no id and nothing is persisted for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<u64>,
    pub name: String,
    pub prefs: DrillPrefs,
}

impl Identity {
    pub fn guest(prefs: DrillPrefs) -> Self {
        Self {
            id: None,
            name: "Guest".to_string(),
            prefs,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id.is_none()
    }
}

/// Credential and per-user preference storage shared by all sessions.
pub trait AccountStore: Send + Sync {
    fn register(&self, email: &str, password: &str, confirm: &str) -> Result<Identity, AccountError>;
    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AccountError>;
    fn email_exists(&self, email: &str) -> Result<bool, AccountError>;
    fn load_prefs(&self, id: u64) -> Result<DrillPrefs, AccountError>;
    fn update_prefs(&self, id: u64, prefs: DrillPrefs) -> Result<(), AccountError>;
}

/// Accepts `local@domain.tld` with no whitespace and no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Checks that do not need the store, in the order users see them.
pub fn validate_registration(email: &str, password: &str, confirm: &str) -> Result<(), AccountError> {
    if !is_valid_email(email) {
        return Err(AccountError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }
    if password != confirm {
        return Err(AccountError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada@example..com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
    }

    #[test]
    fn test_registration_checks_in_order() {
        assert!(matches!(
            validate_registration("nope", "short", "other"),
            Err(AccountError::InvalidEmail)
        ));
        assert!(matches!(
            validate_registration("ada@example.com", "short", "short"),
            Err(AccountError::PasswordTooShort)
        ));
        assert!(matches!(
            validate_registration("ada@example.com", "longenough", "different"),
            Err(AccountError::PasswordMismatch)
        ));
        assert!(validate_registration("ada@example.com", "longenough", "longenough").is_ok());
    }

    #[test]
    fn test_prefs_validation_bounds() {
        assert!(DrillPrefs::default().validate().is_ok());
        let too_long = DrillPrefs {
            timed_drill_secs: 1441,
            word_count_target: 30,
        };
        assert!(matches!(too_long.validate(), Err(AccountError::InvalidConfig(_))));
        let no_words = DrillPrefs {
            timed_drill_secs: 30,
            word_count_target: 0,
        };
        assert!(no_words.validate().is_err());
        let edge = DrillPrefs {
            timed_drill_secs: 1440,
            word_count_target: 500,
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_prefs_defaults_from_empty_json() {
        let prefs: DrillPrefs = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, DrillPrefs::default());
    }
}
