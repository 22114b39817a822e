use std::sync::Mutex;

use crate::store::password::{hash_password, verify_password};
use crate::store::{AccountError, AccountStore, DrillPrefs, Identity, validate_registration};

struct Account {
    id: u64,
    email: String,
    password_hash: String,
    prefs: DrillPrefs,
}

/// Accounts held only for the life of the process.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Account>> {
        self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AccountStore for MemoryAccountStore {
    fn register(&self, email: &str, password: &str, confirm: &str) -> Result<Identity, AccountError> {
        validate_registration(email, password, confirm)?;
        let mut accounts = self.lock();
        if accounts.iter().any(|a| a.email == email) {
            return Err(AccountError::EmailTaken);
        }
        let password_hash = hash_password(password)?;
        let id = accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let prefs = DrillPrefs::default();
        accounts.push(Account {
            id,
            email: email.to_string(),
            password_hash,
            prefs,
        });
        Ok(Identity {
            id: Some(id),
            name: email.to_string(),
            prefs,
        })
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AccountError> {
        let accounts = self.lock();
        let account = accounts
            .iter()
            .find(|a| a.email == email)
            .filter(|a| verify_password(password, &a.password_hash))
            .ok_or(AccountError::InvalidCredentials)?;
        Ok(Identity {
            id: Some(account.id),
            name: account.email.clone(),
            prefs: account.prefs,
        })
    }

    fn email_exists(&self, email: &str) -> Result<bool, AccountError> {
        Ok(self.lock().iter().any(|a| a.email == email))
    }

    fn load_prefs(&self, id: u64) -> Result<DrillPrefs, AccountError> {
        self.lock()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.prefs)
            .ok_or(AccountError::UnknownAccount(id))
    }

    fn update_prefs(&self, id: u64, prefs: DrillPrefs) -> Result<(), AccountError> {
        prefs.validate()?;
        let mut accounts = self.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AccountError::UnknownAccount(id))?;
        account.prefs = prefs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_login() {
        let store = MemoryAccountStore::new();
        let created = store.register("ada@example.com", "analytical", "analytical").unwrap();
        assert_eq!(created.prefs, DrillPrefs::default());
        let logged_in = store.authenticate("ada@example.com", "analytical").unwrap();
        assert_eq!(logged_in.id, created.id);
        assert!(!logged_in.is_guest());
    }

    #[test]
    fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = MemoryAccountStore::new();
        store.register("ada@example.com", "analytical", "analytical").unwrap();
        assert!(matches!(
            store.authenticate("ada@example.com", "wrongpass"),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("bob@example.com", "analytical"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = MemoryAccountStore::new();
        store.register("ada@example.com", "analytical", "analytical").unwrap();
        assert!(store.email_exists("ada@example.com").unwrap());
        assert!(matches!(
            store.register("ada@example.com", "different1", "different1"),
            Err(AccountError::EmailTaken)
        ));
    }

    #[test]
    fn test_invalid_prefs_not_saved() {
        let store = MemoryAccountStore::new();
        let id = store
            .register("ada@example.com", "analytical", "analytical")
            .unwrap()
            .id
            .unwrap();
        let bad = DrillPrefs {
            timed_drill_secs: 0,
            word_count_target: 30,
        };
        assert!(store.update_prefs(id, bad).is_err());
        assert_eq!(store.load_prefs(id).unwrap(), DrillPrefs::default());
    }
}
