use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Serialize};

/// Failure taxonomy for every disk operation in the crate
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Map an io error, turning `ErrorKind::NotFound` into `StoreError::NotFound`
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::io(path, source)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Byte-level file primitives over arbitrary paths.
///
/// Knows nothing about mock APIs or scenes. Writes do not create parent
/// directories and are not atomic: a crash mid-write may truncate the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    /// Read a UTF-8 file. `Ok(None)` when the path does not exist.
    pub fn read_text(&self, path: &Path) -> StoreResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    pub fn write_text(&self, path: &Path, text: &str) -> StoreResult<()> {
        fs::write(path, text).map_err(|e| StoreError::io(path, e))
    }

    /// Read and parse a JSON file. `Ok(None)` when the path does not exist.
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<Option<T>> {
        let Some(text) = self.read_text(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Serialize with two-space indentation and write
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_text(path, &text)
    }

    /// Delete a file. Absence is an error, not a no-op.
    pub fn delete_file(&self, path: &Path) -> StoreResult<()> {
        if !path.is_file() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        fs::remove_file(path).map_err(|e| StoreError::from_io(path, e))
    }

    /// Delete a directory. Absence is an error, not a no-op.
    pub fn delete_directory(&self, path: &Path, recursive: bool) -> StoreResult<()> {
        if !path.is_dir() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let result = if recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        };
        result.map_err(|e| StoreError::from_io(path, e))
    }

    /// Create a directory and any missing parents; existing directories are fine
    pub fn create_directory(&self, path: &Path) -> StoreResult<()> {
        fs::create_dir_all(path).map_err(|e| StoreError::io(path, e))
    }

    pub fn rename(&self, from: &Path, to: &Path) -> StoreResult<()> {
        fs::rename(from, to).map_err(|e| StoreError::from_io(from, e))
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Names of the immediate subdirectories of `path`, in enumeration order
    pub fn list_directories(&self, path: &Path) -> StoreResult<Vec<String>> {
        self.list_entries(path, |file_type| file_type.is_dir())
    }

    /// Names of the regular files directly inside `path`, in enumeration order
    pub fn list_files(&self, path: &Path) -> StoreResult<Vec<String>> {
        self.list_entries(path, |file_type| file_type.is_file())
    }

    pub fn modified(&self, path: &Path) -> StoreResult<SystemTime> {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| StoreError::from_io(path, e))
    }

    fn list_entries(
        &self,
        path: &Path,
        keep: impl Fn(&fs::FileType) -> bool,
    ) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| StoreError::from_io(path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(path, e))?;
            let file_type = entry.file_type().map_err(|e| StoreError::io(path, e))?;
            if !keep(&file_type) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
