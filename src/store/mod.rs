pub mod file_store;
pub mod root;

pub use file_store::{FileStore, StoreError, StoreResult};
pub use root::{MockRoot, MOCK_CONFIG_FILE_NAME, STAGING_DIR_PREFIX};
