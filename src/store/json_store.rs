use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::password::{hash_password, verify_password};
use crate::store::{AccountError, AccountStore, DrillPrefs, Identity, validate_registration};

const ACCOUNTS_FILE: &str = "accounts.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AccountRecord {
    id: u64,
    email: String,
    password_hash: String,
    #[serde(default)]
    prefs: DrillPrefs,
    created_at: DateTime<Utc>,
}

impl AccountRecord {
    fn identity(&self) -> Identity {
        Identity {
            id: Some(self.id),
            name: self.email.clone(),
            prefs: self.prefs,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    accounts: Vec<AccountRecord>,
}

/// Accounts in a single JSON file. Every change is a locked
/// read-modify-write ending in an atomic rename.
pub struct JsonAccountStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonAccountStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, AccountError> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(ACCOUNTS_FILE)
    }

    fn load(&self) -> Result<AccountsData, AccountError> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(AccountsData::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, data: &AccountsData) -> Result<(), AccountError> {
        let path = self.file_path();
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn modify<T>(
        &self,
        f: impl FnOnce(&mut AccountsData) -> Result<T, AccountError>,
    ) -> Result<T, AccountError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut data = self.load()?;
        let out = f(&mut data)?;
        self.save(&data)?;
        Ok(out)
    }
}

impl AccountStore for JsonAccountStore {
    fn register(&self, email: &str, password: &str, confirm: &str) -> Result<Identity, AccountError> {
        validate_registration(email, password, confirm)?;
        // hashing is slow, keep it outside the write lock
        let password_hash = hash_password(password)?;
        let identity = self.modify(|data| {
            if data.accounts.iter().any(|a| a.email == email) {
                return Err(AccountError::EmailTaken);
            }
            data.next_id += 1;
            let record = AccountRecord {
                id: data.next_id,
                email: email.to_string(),
                password_hash,
                prefs: DrillPrefs::default(),
                created_at: Utc::now(),
            };
            let identity = record.identity();
            data.accounts.push(record);
            Ok(identity)
        })?;
        tracing::info!(id = ?identity.id, "account registered");
        Ok(identity)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AccountError> {
        let data = self.load()?;
        data.accounts
            .iter()
            .find(|a| a.email == email)
            .filter(|a| verify_password(password, &a.password_hash))
            .map(AccountRecord::identity)
            .ok_or(AccountError::InvalidCredentials)
    }

    fn email_exists(&self, email: &str) -> Result<bool, AccountError> {
        Ok(self.load()?.accounts.iter().any(|a| a.email == email))
    }

    fn load_prefs(&self, id: u64) -> Result<DrillPrefs, AccountError> {
        self.load()?
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.prefs)
            .ok_or(AccountError::UnknownAccount(id))
    }

    fn update_prefs(&self, id: u64, prefs: DrillPrefs) -> Result<(), AccountError> {
        prefs.validate()?;
        self.modify(|data| {
            let record = data
                .accounts
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(AccountError::UnknownAccount(id))?;
            record.prefs = prefs;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonAccountStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonAccountStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_register_persists_across_instances() {
        let (dir, store) = make_test_store();
        let created = store.register("ada@example.com", "analytical", "analytical").unwrap();

        let reopened = JsonAccountStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let logged_in = reopened.authenticate("ada@example.com", "analytical").unwrap();
        assert_eq!(logged_in.id, created.id);
        assert_eq!(logged_in.prefs, DrillPrefs::default());
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let (dir, store) = make_test_store();
        store.register("ada@example.com", "analytical", "analytical").unwrap();
        assert!(dir.path().join(ACCOUNTS_FILE).exists());
        assert!(!dir.path().join("accounts.tmp").exists());
    }

    #[test]
    fn test_password_is_not_stored_in_clear() {
        let (dir, store) = make_test_store();
        store.register("ada@example.com", "analytical", "analytical").unwrap();
        let raw = fs::read_to_string(dir.path().join(ACCOUNTS_FILE)).unwrap();
        assert!(!raw.contains("analytical"));
    }

    #[test]
    fn test_ids_are_unique() {
        let (_dir, store) = make_test_store();
        let a = store.register("a@example.com", "password1", "password1").unwrap();
        let b = store.register("b@example.com", "password2", "password2").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (_dir, store) = make_test_store();
        store.register("ada@example.com", "analytical", "analytical").unwrap();
        assert!(matches!(
            store.register("ada@example.com", "analytical", "analytical"),
            Err(AccountError::EmailTaken)
        ));
    }

    #[test]
    fn test_update_prefs_round_trip() {
        let (_dir, store) = make_test_store();
        let id = store
            .register("ada@example.com", "analytical", "analytical")
            .unwrap()
            .id
            .unwrap();
        let prefs = DrillPrefs {
            timed_drill_secs: 60,
            word_count_target: 45,
        };
        store.update_prefs(id, prefs).unwrap();
        assert_eq!(store.load_prefs(id).unwrap(), prefs);
        assert!(matches!(
            store.update_prefs(99, prefs),
            Err(AccountError::UnknownAccount(99))
        ));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (dir, store) = make_test_store();
        fs::write(dir.path().join(ACCOUNTS_FILE), "{not json").unwrap();
        assert!(matches!(
            store.authenticate("ada@example.com", "analytical"),
            Err(AccountError::Serde(_))
        ));
    }

    #[test]
    fn test_concurrent_registrations_all_land() {
        let (_dir, store) = make_test_store();
        let store = std::sync::Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .register(&format!("user{i}@example.com"), "password1", "password1")
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            assert!(store.email_exists(&format!("user{i}@example.com")).unwrap());
        }
    }
}
