//! Local persistent cache.
//!
//! A directory of small JSON files, one per key. Keys are url-encoded into
//! file names so any user name is safe to use. This is the durable copy of a
//! user's progress; the remote store is a best-effort mirror of it.

use crate::catalog::Catalog;
use crate::types::UserProgress;
use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key holding the name of the active session.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Key holding catalog additions that have not reached the remote yet.
pub const PENDING_CATALOG_KEY: &str = "catalogPending";

/// Key holding a user's progress record.
pub fn progress_key(name: &str) -> String {
    format!("userProgress_{}", name)
}

/// File-backed key/value cache.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    /// Read the raw value stored under `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading cache key {}", key)),
        }
    }

    /// Store a raw value under `key`, replacing any previous value.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("writing cache key {}", key))?;
        fs::rename(&tmp, &path).with_context(|| format!("committing cache key {}", key))?;
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing cache key {}", key)),
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing cache key {}", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    /// Cached progress for `name`, if any.
    pub fn progress(&self, name: &str) -> Result<Option<UserProgress>> {
        self.get_json(&progress_key(name))
    }

    /// Cache a progress record under its own name.
    pub fn store_progress(&self, progress: &UserProgress) -> Result<()> {
        self.set_json(&progress_key(&progress.name), progress)
    }

    /// Name of the active session, if someone is logged in.
    pub fn current_user(&self) -> Result<Option<String>> {
        Ok(self
            .get_raw(CURRENT_USER_KEY)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    pub fn set_current_user(&self, name: &str) -> Result<()> {
        self.set_raw(CURRENT_USER_KEY, name)
    }

    pub fn clear_current_user(&self) -> Result<bool> {
        self.remove(CURRENT_USER_KEY)
    }

    /// Catalog additions waiting for the remote. Empty when there are none.
    pub fn pending_catalog(&self) -> Result<Catalog> {
        Ok(self.get_json(PENDING_CATALOG_KEY)?.unwrap_or_default())
    }

    /// Replace the pending additions; an empty catalog removes the key.
    pub fn store_pending_catalog(&self, pending: &Catalog) -> Result<()> {
        if pending.is_empty() {
            self.remove(PENDING_CATALOG_KEY)?;
            Ok(())
        } else {
            self.set_json(PENDING_CATALOG_KEY, pending)
        }
    }
}
