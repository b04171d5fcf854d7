use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Account, CollectionData, UserInteractions, UserRecord};

/// Durable account registry plus the last signed-in account.
pub trait AccountStore: Send + Sync {
    fn load_accounts(&self) -> Result<Vec<UserRecord>>;
    fn save_accounts(&self, accounts: &[UserRecord]) -> Result<()>;
    fn load_session(&self) -> Result<Option<Account>>;
    fn save_session(&self, session: Option<&Account>) -> Result<()>;
    /// Writes the registry and the session pointer together, or neither.
    fn save_registration(&self, accounts: &[UserRecord], session: &Account) -> Result<()>;
}

/// Per-account interaction snapshots.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, account_id: &str) -> Result<Option<UserInteractions>>;
    fn put(&self, account_id: &str, snapshot: &UserInteractions) -> Result<()>;
}

/// JSON document database. With no path it lives only in memory.
pub struct Database {
    path: Option<PathBuf>,
    cache: Mutex<CollectionData>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    let backup = corrupt_backup_path(&path);
                    fs::rename(&path, &backup)?;
                    warn!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "unreadable database moved aside, starting empty"
                    );
                    CollectionData::default()
                }
            }
        } else {
            CollectionData::default()
        };

        Ok(Database {
            path: Some(path),
            cache: Mutex::new(data),
        })
    }

    pub fn in_memory() -> Self {
        Database {
            path: None,
            cache: Mutex::new(CollectionData::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CollectionData>> {
        self.cache
            .lock()
            .map_err(|e| Error::Internal(e.to_string()))
    }

    fn save(&self, data: &CollectionData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "database saved");
        Ok(())
    }

    /// Applies `f` to a copy of the document and only swaps it into the
    /// cache once the copy is on disk.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CollectionData),
    {
        let mut data = self.lock()?;
        let mut next = data.clone();
        f(&mut next);
        self.save(&next)?;
        *data = next;
        Ok(())
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database".to_string());
    path.with_file_name(format!("{name}.corrupt-{stamp}"))
}

impl AccountStore for Database {
    fn load_accounts(&self) -> Result<Vec<UserRecord>> {
        Ok(self.lock()?.users.clone())
    }

    fn save_accounts(&self, accounts: &[UserRecord]) -> Result<()> {
        self.update(|data| data.users = accounts.to_vec())
    }

    fn load_session(&self) -> Result<Option<Account>> {
        Ok(self.lock()?.session.clone())
    }

    fn save_session(&self, session: Option<&Account>) -> Result<()> {
        self.update(|data| data.session = session.cloned())
    }

    fn save_registration(&self, accounts: &[UserRecord], session: &Account) -> Result<()> {
        self.update(|data| {
            data.users = accounts.to_vec();
            data.session = Some(session.clone());
        })
    }
}

impl SnapshotStore for Database {
    fn get(&self, account_id: &str) -> Result<Option<UserInteractions>> {
        Ok(self.lock()?.interactions_by_user.get(account_id).cloned())
    }

    fn put(&self, account_id: &str, snapshot: &UserInteractions) -> Result<()> {
        self.update(|data| {
            data.interactions_by_user
                .insert(account_id.to_string(), snapshot.clone());
        })
    }
}
