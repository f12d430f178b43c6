//! JSON file backend with owner-only permissions.

use crate::{SecureStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

type Entries = BTreeMap<String, String>;

/// File-backed storage.
///
/// Nothing is cached: every read goes to the file, so a long-running host
/// sees logins and logouts made by other processes. Writes re-read the file
/// under the lock and replace it through a sibling temp file and a rename,
/// so a crash never leaves a half-written token file behind.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// An existing file must parse; a corrupt one is reported here rather
    /// than on first use.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = load(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "Opened file storage");

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        let mut file = create_private(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path).map_err(|err| {
            let _ = std::fs::remove_file(&tmp);
            StorageError::Backend(format!(
                "failed to replace {}: {}",
                self.path.display(),
                err
            ))
        })?;
        Ok(())
    }
}

fn load(path: &Path) -> StorageResult<Entries> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(err) => return Err(err.into()),
    };
    if content.trim().is_empty() {
        Ok(Entries::new())
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Create `path` truncated, readable by the owner only from the first byte.
#[cfg(unix)]
fn create_private(path: &Path) -> StorageResult<std::fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A stale temp file keeps its old mode.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> StorageResult<std::fs::File> {
    Ok(std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

impl SecureStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(key = %key, "Setting stored value");
        let _guard = self.lock.lock();
        let mut entries = load(&self.path)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(load(&self.path)?.remove(key))
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(key = %key, "Deleting stored value");
        let _guard = self.lock.lock();
        let mut entries = load(&self.path)?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.persist(&entries)?;
        }
        Ok(existed)
    }
}
