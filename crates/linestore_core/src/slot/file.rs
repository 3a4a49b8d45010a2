//! File-backed slot: one JSON document per key inside a directory.
//!
//! # Invariants
//! - Keys map to `<dir>/<key>.json`; keys are restricted to a portable charset.
//! - Writes go through a sibling temp file and a rename, so readers never
//!   observe a partially written snapshot.

use super::{Slot, SlotError, SlotResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Slot stored as a JSON file on the local file system.
#[derive(Debug, Clone)]
pub struct FileSlot {
    key: String,
    path: PathBuf,
}

impl FileSlot {
    /// Binds `key` to a file inside `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>, key: impl Into<String>) -> SlotResult<Self> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(SlotError::InvalidKey(key));
        }
        let path = dir.as_ref().join(format!("{key}.json"));
        Ok(Self { key, path })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl Slot for FileSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> SlotResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, snapshot: &str) -> SlotResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, snapshot)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}
