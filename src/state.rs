use std::sync::Arc;

use crate::config::Config;
use crate::services::{OpenAiCompletion, TextCompletion};
use crate::store::{MockRoot, StoreError};
use crate::watcher::{ChangeWatcher, WatchError, WatchOptions};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Storage root every repository call goes through
    pub root: MockRoot,
    pub config: Config,
    pub watcher: Arc<ChangeWatcher>,
    /// Text completion for AI filling
    pub completion: Arc<dyn TextCompletion>,
}

impl AppState {
    /// Open the storage root and start watching it. Must run inside a tokio runtime.
    pub fn new(config: Config) -> Result<Self, AppStateError> {
        let root = MockRoot::open(&config.project_root, &config.mock_data_dir_name)?;
        let watcher = ChangeWatcher::start(root.path(), WatchOptions::from(&config))?;
        let completion: Arc<dyn TextCompletion> = Arc::new(OpenAiCompletion::new(root.clone(), &config));

        Ok(Self {
            root,
            config,
            watcher: Arc::new(watcher),
            completion,
        })
    }

    /// Create AppState with custom collaborators (for testing)
    #[allow(dead_code)]
    pub fn with_services(
        config: Config,
        watcher: Arc<ChangeWatcher>,
        completion: Arc<dyn TextCompletion>,
    ) -> Result<Self, AppStateError> {
        let root = MockRoot::open(&config.project_root, &config.mock_data_dir_name)?;

        Ok(Self {
            root,
            config,
            watcher,
            completion,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Storage root error: {0}")]
    Storage(#[from] StoreError),

    #[error("File watcher error: {0}")]
    Watcher(#[from] WatchError),
}
