use std::path::{Path, PathBuf};

use crate::store::{FileStore, StoreResult};

/// Config file name inside every mock API directory
pub const MOCK_CONFIG_FILE_NAME: &str = ".config";

/// Extension of scene body files
pub const SCENE_FILE_EXTENSION: &str = "json";

/// Credential file seeded into the storage root
pub const ENV_FILE_NAME: &str = ".env";

const ENV_FILE_SEED: &str = "OPENAI_API_KEY=";
const IGNORE_FILE_NAMES: [&str; 2] = [".gitignore", ".npmignore"];

/// Prefix of directories used to assemble a new mock API before it is renamed into place
pub const STAGING_DIR_PREFIX: &str = ".staging_";

/// The storage root: `<project-root>/<mock-data-dir-name>`.
///
/// Cheap to clone; every clone points at the same directory tree.
#[derive(Debug, Clone)]
pub struct MockRoot {
    path: PathBuf,
    files: FileStore,
}

impl MockRoot {
    /// Resolve the root and make sure it exists, seeding the auxiliary files
    /// on first creation. Safe to call on an existing root.
    pub fn open(project_root: &Path, dir_name: &str) -> StoreResult<Self> {
        let root = Self {
            path: project_root.join(dir_name),
            files: FileStore::new(),
        };
        root.ensure_exists()?;
        Ok(root)
    }

    fn ensure_exists(&self) -> StoreResult<()> {
        self.files.create_directory(&self.path)?;

        let env_path = self.path.join(ENV_FILE_NAME);
        if !self.files.exists(&env_path) {
            self.files.write_text(&env_path, ENV_FILE_SEED)?;
            tracing::info!(root = %self.path.display(), "Seeded mock data root");
        }

        for name in IGNORE_FILE_NAMES {
            let ignore_path = self.path.join(name);
            if !self.files.exists(&ignore_path) {
                self.files.write_text(&ignore_path, ENV_FILE_NAME)?;
            }
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn api_dir(&self, api_id: &str) -> PathBuf {
        self.path.join(api_id)
    }

    pub fn config_path(&self, api_id: &str) -> PathBuf {
        self.api_dir(api_id).join(MOCK_CONFIG_FILE_NAME)
    }

    pub fn scene_path(&self, api_id: &str, scene: &str) -> PathBuf {
        self.api_dir(api_id)
            .join(format!("{}.{}", scene, SCENE_FILE_EXTENSION))
    }

    pub fn staging_dir(&self, api_id: &str) -> PathBuf {
        self.path.join(format!("{}{}", STAGING_DIR_PREFIX, api_id))
    }

    /// Read `OPENAI_API_KEY` from the root's `.env`. `None` when the file
    /// is missing, unreadable, or the key is empty.
    pub fn openai_api_key(&self) -> Option<String> {
        let env_path = self.path.join(ENV_FILE_NAME);
        let entries = match dotenvy::from_path_iter(&env_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %env_path.display(), error = %e, "Cannot read credential file");
                return None;
            }
        };

        entries
            .filter_map(Result::ok)
            .find(|(key, _)| key == "OPENAI_API_KEY")
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}
