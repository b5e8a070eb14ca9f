//! File-backed cache storage using capability-based filesystem access.

use crate::board::ports::{CacheStorage, CacheStorageError, CacheStorageResult};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stores the cache document as a single JSON file.
///
/// Writes go to a sibling temporary file that is synced and then renamed
/// over the target, so a reader sees either the previous or the new file.
#[derive(Debug)]
pub struct FileCacheStorage {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
}

impl FileCacheStorage {
    /// Opens storage for `path`, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStorageError`] when the path has no file name or the
    /// parent directory cannot be opened.
    pub fn open(path: &Utf8Path) -> CacheStorageResult<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            CacheStorageError::io(std::io::Error::other(format!(
                "cache path {path} must include a file name"
            )))
        })?;
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(CacheStorageError::io)?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(CacheStorageError::io)?;
        Ok(Self {
            dir,
            file_name: file_name.to_owned(),
            path: path.to_owned(),
        })
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn temp_name(&self) -> String {
        format!(
            ".{}.tmp-{}-{}",
            self.file_name,
            std::process::id(),
            TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        )
    }
}

/// Temporary file that is removed on drop unless committed.
struct PendingFile<'a> {
    dir: &'a Dir,
    name: String,
    committed: bool,
}

impl PendingFile<'_> {
    fn write(&self, contents: &str) -> std::io::Result<()> {
        let mut file = self.dir.create(&self.name)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    }

    fn commit(mut self, target: &str) -> std::io::Result<()> {
        self.dir.rename(&self.name, self.dir, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFile<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.dir.remove_file(&self.name) {
            debug!(file = %self.name, error = %err, "temporary cache file not removed");
        }
    }
}

impl CacheStorage for FileCacheStorage {
    fn read(&self) -> CacheStorageResult<Option<String>> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CacheStorageError::io(err)),
        }
    }

    fn write_atomic(&self, contents: &str) -> CacheStorageResult<()> {
        let pending = PendingFile {
            dir: &self.dir,
            name: self.temp_name(),
            committed: false,
        };
        pending.write(contents).map_err(CacheStorageError::io)?;
        pending
            .commit(&self.file_name)
            .map_err(CacheStorageError::io)?;
        debug!(path = %self.path, bytes = contents.len(), "board cache written");
        Ok(())
    }
}
