pub mod mock_api;
pub mod scene;

pub use mock_api::MockApiRepository;
pub use scene::SceneRepository;

use crate::error::{AppError, AppResult};

/// Scene names become file stems, so they must stay inside the API directory
pub(crate) fn validate_scene_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("scene name is required".to_string()));
    }
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(AppError::Validation(format!("invalid scene name: {:?}", name)));
    }
    Ok(())
}
