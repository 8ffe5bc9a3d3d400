use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{normalize_scene_body, Scene};
use crate::repositories::{validate_scene_name, MockApiRepository};
use crate::store::{root::SCENE_FILE_EXTENSION, MockRoot};

/// Scene repository: one `<name>.json` file per scene inside the API directory.
///
/// Every mutation here keeps the API's `scene` selection pointing at an
/// existing scene, or clears it when none are left.
pub struct SceneRepository;

impl SceneRepository {
    /// Scene names of an API, sorted
    pub fn list(root: &MockRoot, api_id: &str) -> AppResult<Vec<String>> {
        MockApiRepository::require_config(root, api_id)?;

        let files = root
            .files()
            .list_files(&root.api_dir(api_id))
            .map_err(|e| AppError::from(e).context(format!("Mock API {}", api_id)))?;

        let mut names: Vec<String> = files
            .iter()
            .map(Path::new)
            .filter(|file| file.extension().and_then(|e| e.to_str()) == Some(SCENE_FILE_EXTENSION))
            .filter_map(|file| file.file_stem().and_then(|s| s.to_str()))
            .filter(|stem| !stem.is_empty() && !stem.starts_with('.'))
            .map(str::to_string)
            .collect();
        names.sort();

        Ok(names)
    }

    /// Raw text of a scene file. `Ok(None)` when the scene does not exist.
    pub fn read(root: &MockRoot, api_id: &str, name: &str) -> AppResult<Option<String>> {
        validate_scene_name(name)?;
        MockApiRepository::require_config(root, api_id)?;

        root.files()
            .read_text(&root.scene_path(api_id, name))
            .map_err(|e| AppError::from(e).context(scene_entity(api_id, name)))
    }

    /// Parsed scene body. `Ok(None)` when the scene does not exist.
    pub fn get(root: &MockRoot, api_id: &str, name: &str) -> AppResult<Option<Value>> {
        validate_scene_name(name)?;
        MockApiRepository::require_config(root, api_id)?;

        root.files()
            .read_json(&root.scene_path(api_id, name))
            .map_err(|e| AppError::from(e).context(scene_entity(api_id, name)))
    }

    /// Body of the currently selected scene, if any
    pub fn active(root: &MockRoot, api_id: &str) -> AppResult<Option<Value>> {
        let config = MockApiRepository::require_config(root, api_id)?;
        match config.scene {
            Some(name) => Self::get(root, api_id, &name),
            None => Ok(None),
        }
    }

    /// Write a scene body, creating or replacing the file.
    ///
    /// `body` may be a JSON value or a JSON-encoded string; either way the
    /// parsed value is what lands on disk.
    pub fn set(root: &MockRoot, api_id: &str, name: &str, body: Value) -> AppResult<Value> {
        validate_scene_name(name)?;
        MockApiRepository::require_config(root, api_id)?;

        let body = normalize_scene_body(body)
            .map_err(|e| AppError::MalformedData(format!("{}: {}", scene_entity(api_id, name), e)))?;

        root.files()
            .write_json(&root.scene_path(api_id, name), &body)
            .map_err(|e| AppError::from(e).context(scene_entity(api_id, name)))?;

        tracing::debug!(api_id = %api_id, scene = %name, "Wrote scene");
        Ok(body)
    }

    /// Create a new scene. When the API has no selected scene yet, the new
    /// one becomes selected.
    pub fn create(root: &MockRoot, api_id: &str, name: &str, body: Value) -> AppResult<Scene> {
        validate_scene_name(name)?;
        MockApiRepository::require_config(root, api_id)?;

        if root.files().exists(&root.scene_path(api_id, name)) {
            return Err(AppError::Conflict(scene_entity(api_id, name)));
        }

        let body = Self::set(root, api_id, name, body)?;
        Self::select_if_unselected(root, api_id, name)?;
        tracing::info!(api_id = %api_id, scene = %name, "Created scene");

        Ok(Scene {
            api_id: api_id.to_string(),
            name: name.to_string(),
            body,
        })
    }

    /// Replace the body of an existing scene. The selection is left alone.
    pub fn update(root: &MockRoot, api_id: &str, name: &str, body: Value) -> AppResult<Scene> {
        validate_scene_name(name)?;
        MockApiRepository::require_config(root, api_id)?;

        if !root.files().exists(&root.scene_path(api_id, name)) {
            return Err(AppError::NotFound(scene_entity(api_id, name)));
        }

        let body = Self::set(root, api_id, name, body)?;
        tracing::info!(api_id = %api_id, scene = %name, "Updated scene");

        Ok(Scene {
            api_id: api_id.to_string(),
            name: name.to_string(),
            body,
        })
    }

    /// Delete a scene and repair the selection in the same step: deleting the
    /// last scene clears it, deleting the selected one moves it to the first
    /// remaining scene.
    pub fn delete(root: &MockRoot, api_id: &str, name: &str) -> AppResult<()> {
        validate_scene_name(name)?;
        let config = MockApiRepository::require_config(root, api_id)?;

        root.files()
            .delete_file(&root.scene_path(api_id, name))
            .map_err(|e| AppError::from(e).context(scene_entity(api_id, name)))?;
        tracing::info!(api_id = %api_id, scene = %name, "Deleted scene");

        let remaining = Self::list(root, api_id)?;
        match remaining.first() {
            None => {
                MockApiRepository::select_scene(root, api_id, None)?;
            }
            Some(first) if config.scene.as_deref() == Some(name) => {
                MockApiRepository::select_scene(root, api_id, Some(first.as_str()))?;
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn select_if_unselected(root: &MockRoot, api_id: &str, name: &str) -> AppResult<()> {
        let config = MockApiRepository::require_config(root, api_id)?;
        if config.scene.is_none() {
            MockApiRepository::select_scene(root, api_id, Some(name))?;
        }
        Ok(())
    }
}

fn scene_entity(api_id: &str, name: &str) -> String {
    format!("Scene {} of mock API {}", name, api_id)
}
