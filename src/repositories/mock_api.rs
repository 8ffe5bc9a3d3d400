use std::cmp::Reverse;

use rand::Rng;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};
use crate::models::{normalize_scene_body, CreateMockApi, MockApi, MockApiConfig, UpdateMockApi};
use crate::repositories::{validate_scene_name, SceneRepository};
use crate::store::{MockRoot, StoreError};

/// Max characters of the request path kept in an id
const ID_SLUG_LEN: usize = 10;
const ID_SUFFIX_LEN: usize = 6;
const ID_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_MAX_ATTEMPTS: usize = 8;

/// Mock API repository over the storage root.
///
/// Each mock API is a directory named by its id holding a `.config` file
/// and one `<scene>.json` file per scene.
pub struct MockApiRepository;

impl MockApiRepository {
    /// Build an id of the form `http__<slug>_ID_<random>`.
    ///
    /// The id is never re-derived from the path afterwards.
    pub fn create_id(path: &str) -> String {
        let slug: String = path
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .take(ID_SLUG_LEN)
            .collect();

        let mut rng = rand::rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_SUFFIX_CHARSET[rng.random_range(0..ID_SUFFIX_CHARSET.len())] as char)
            .collect();

        format!("http__{}_ID_{}", slug, suffix)
    }

    /// Generate an id not yet used by any directory under the root
    fn generate_unique_id(root: &MockRoot, path: &str) -> AppResult<String> {
        for _ in 0..ID_MAX_ATTEMPTS {
            let id = Self::create_id(path);
            if !root.files().exists(&root.api_dir(&id))
                && !root.files().exists(&root.staging_dir(&id))
            {
                return Ok(id);
            }
            tracing::debug!(api_id = %id, "Mock API id collision, retrying");
        }
        Err(AppError::Conflict(format!(
            "Mock API id for {} (no free id after {} attempts)",
            path, ID_MAX_ATTEMPTS
        )))
    }

    /// Create a new mock API, with a first scene when `input.scene` is set.
    ///
    /// The directory is assembled under a staging name and renamed into place,
    /// so a failure at any step leaves no API directory behind.
    pub fn create(root: &MockRoot, input: &CreateMockApi) -> AppResult<MockApi> {
        if input.path.trim().is_empty() {
            return Err(AppError::Validation("path is required".to_string()));
        }

        let first_scene = match &input.scene {
            Some(name) => {
                validate_scene_name(name)?;
                let body = input
                    .response
                    .clone()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                let body = normalize_scene_body(body)
                    .map_err(|e| AppError::MalformedData(format!("response: {}", e)))?;
                Some((name.as_str(), body))
            }
            None => None,
        };

        let id = Self::generate_unique_id(root, &input.path)?;
        let now = OffsetDateTime::now_utc();
        let config = MockApiConfig {
            path: Some(input.path.clone()),
            description: input.description.clone(),
            method: Some(input.method.unwrap_or_default()),
            scene: first_scene.as_ref().map(|(name, _)| name.to_string()),
            created_at: Some(now),
            last_modified: Some(now),
            extra: Map::new(),
        };

        let files = root.files();
        let staging = root.staging_dir(&id);
        files.create_directory(&staging)?;

        let assembled = (|| -> Result<(), StoreError> {
            files.write_json(&staging.join(crate::store::MOCK_CONFIG_FILE_NAME), &config)?;
            if let Some((name, body)) = &first_scene {
                files.write_json(&staging.join(format!("{}.json", name)), body)?;
            }
            files.rename(&staging, &root.api_dir(&id))
        })();

        if let Err(e) = assembled {
            tracing::warn!(api_id = %id, error = %e, "Rolling back mock API creation");
            if let Err(cleanup) = files.delete_directory(&staging, true) {
                tracing::error!(api_id = %id, error = %cleanup, "Failed to remove staging directory");
            }
            return Err(AppError::from(e).context(format!("Mock API {}", id)));
        }

        tracing::info!(api_id = %id, path = %input.path, "Created mock API");

        Ok(MockApi {
            id,
            config,
            scene_list: first_scene
                .map(|(name, _)| vec![name.to_string()])
                .unwrap_or_default(),
        })
    }

    /// Whether the API directory exists
    pub fn exists(root: &MockRoot, api_id: &str) -> bool {
        validate_api_id(api_id).is_ok() && root.files().is_directory(&root.api_dir(api_id))
    }

    /// Find a mock API by id. Missing directory or config is `NotFound`.
    pub fn find_by_id(root: &MockRoot, api_id: &str) -> AppResult<MockApi> {
        let config = Self::require_config(root, api_id)?;
        let scene_list = SceneRepository::list(root, api_id)?;

        Ok(MockApi {
            id: api_id.to_string(),
            config,
            scene_list,
        })
    }

    /// All valid mock APIs in directory enumeration order.
    ///
    /// Directories without a readable config are skipped, not reported.
    pub fn list(root: &MockRoot) -> AppResult<Vec<MockApi>> {
        let names = root.files().list_directories(root.path())?;

        let apis = names
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .filter_map(|name| match Self::find_by_id(root, &name) {
                Ok(api) => Some(api),
                Err(e) => {
                    tracing::debug!(api_id = %name, error = %e, "Skipping invalid mock API directory");
                    None
                }
            })
            .collect();

        Ok(apis)
    }

    /// All valid mock APIs, most recently touched directory first
    pub fn list_by_recency(root: &MockRoot) -> AppResult<Vec<MockApi>> {
        let mut apis: Vec<_> = Self::list(root)?
            .into_iter()
            .map(|api| {
                let touched = root.files().modified(&root.api_dir(&api.id)).ok();
                (touched, api)
            })
            .collect();

        // stable: ties keep enumeration order
        apis.sort_by_key(|(touched, _)| Reverse(*touched));

        Ok(apis.into_iter().map(|(_, api)| api).collect())
    }

    /// All valid mock APIs, newest `lastModified` first
    pub fn list_by_last_modified(root: &MockRoot) -> AppResult<Vec<MockApi>> {
        let mut apis = Self::list(root)?;
        apis.sort_by_key(|api| Reverse(api.config.last_modified));
        Ok(apis)
    }

    /// Read the config. `Ok(None)` when the API or its config does not exist.
    pub fn get_config(root: &MockRoot, api_id: &str) -> AppResult<Option<MockApiConfig>> {
        validate_api_id(api_id)?;
        root.files()
            .read_json(&root.config_path(api_id))
            .map_err(|e| AppError::from(e).context(format!("Mock API {}", api_id)))
    }

    /// Write config fields.
    ///
    /// With `merge`, `partial` is shallow-merged over the stored object;
    /// otherwise it replaces it. `createdAt` is set once, `lastModified` is
    /// set to now unless `bump_last_modified` is false.
    pub fn set_config(
        root: &MockRoot,
        api_id: &str,
        partial: &Map<String, Value>,
        merge: bool,
        bump_last_modified: bool,
    ) -> AppResult<MockApiConfig> {
        let mut stored = if merge {
            Self::read_config_object(root, api_id)?
        } else {
            Self::require_dir(root, api_id)?;
            Map::new()
        };

        for (key, value) in partial {
            stored.insert(key.clone(), value.clone());
        }

        let now = format_timestamp(OffsetDateTime::now_utc())?;
        if !stored.contains_key("createdAt") {
            stored.insert("createdAt".to_string(), Value::String(now.clone()));
        }
        if bump_last_modified {
            stored.insert("lastModified".to_string(), Value::String(now));
        }

        Self::write_config_object(root, api_id, stored)
    }

    /// Change the selected scene without touching `lastModified`.
    ///
    /// `Some(name)` requires the scene to exist; `None` clears the selection.
    pub fn select_scene(
        root: &MockRoot,
        api_id: &str,
        scene: Option<&str>,
    ) -> AppResult<MockApiConfig> {
        match scene {
            Some(name) => {
                validate_scene_name(name)?;
                Self::require_config(root, api_id)?;
                if !root.files().exists(&root.scene_path(api_id, name)) {
                    return Err(AppError::NotFound(format!(
                        "Scene {} of mock API {}",
                        name, api_id
                    )));
                }

                let mut partial = Map::new();
                partial.insert("scene".to_string(), Value::String(name.to_string()));
                let config = Self::set_config(root, api_id, &partial, true, false)?;
                tracing::info!(api_id = %api_id, scene = %name, "Selected scene");
                Ok(config)
            }
            None => {
                let mut stored = Self::read_config_object(root, api_id)?;
                stored.remove("scene");
                let config = Self::write_config_object(root, api_id, stored)?;
                tracing::info!(api_id = %api_id, "Cleared scene selection");
                Ok(config)
            }
        }
    }

    /// Update config fields and, when given, the scene selection.
    ///
    /// Only the non-scene fields bump `lastModified`.
    pub fn update(root: &MockRoot, api_id: &str, input: &UpdateMockApi) -> AppResult<MockApi> {
        Self::require_config(root, api_id)?;

        if let Some(path) = &input.path {
            if path.trim().is_empty() {
                return Err(AppError::Validation("path must not be empty".to_string()));
            }
        }

        if let Some(scene) = &input.scene {
            Self::select_scene(root, api_id, Some(scene))?;
        }

        let fields = input.config_fields();
        if !fields.is_empty() {
            Self::set_config(root, api_id, &fields, true, true)?;
            tracing::info!(api_id = %api_id, "Updated mock API");
        }

        Self::find_by_id(root, api_id)
    }

    /// Delete the API directory and everything under it
    pub fn delete(root: &MockRoot, api_id: &str) -> AppResult<()> {
        validate_api_id(api_id)?;
        root.files()
            .delete_directory(&root.api_dir(api_id), true)
            .map_err(|e| AppError::from(e).context(format!("Mock API {}", api_id)))?;

        tracing::info!(api_id = %api_id, "Deleted mock API");
        Ok(())
    }

    /// The config, or `NotFound` when the API or its config is missing
    pub(crate) fn require_config(root: &MockRoot, api_id: &str) -> AppResult<MockApiConfig> {
        Self::get_config(root, api_id)?
            .ok_or_else(|| AppError::NotFound(format!("Mock API {}", api_id)))
    }

    fn require_dir(root: &MockRoot, api_id: &str) -> AppResult<()> {
        if Self::exists(root, api_id) {
            Ok(())
        } else {
            validate_api_id(api_id)?;
            Err(AppError::NotFound(format!("Mock API {}", api_id)))
        }
    }

    fn read_config_object(root: &MockRoot, api_id: &str) -> AppResult<Map<String, Value>> {
        validate_api_id(api_id)?;
        let stored: Option<Map<String, Value>> = root
            .files()
            .read_json(&root.config_path(api_id))
            .map_err(|e| AppError::from(e).context(format!("Mock API {}", api_id)))?;

        stored.ok_or_else(|| AppError::NotFound(format!("Mock API {}", api_id)))
    }

    fn write_config_object(
        root: &MockRoot,
        api_id: &str,
        stored: Map<String, Value>,
    ) -> AppResult<MockApiConfig> {
        let stored = Value::Object(stored);
        let config: MockApiConfig = serde_json::from_value(stored.clone())
            .map_err(|e| AppError::Validation(format!("invalid config: {}", e)))?;

        root.files()
            .write_json(&root.config_path(api_id), &stored)
            .map_err(|e| AppError::from(e).context(format!("Mock API {}", api_id)))?;

        Ok(config)
    }
}

/// Reject ids that would escape the storage root or name a hidden entry
pub(crate) fn validate_api_id(api_id: &str) -> AppResult<()> {
    if api_id.is_empty()
        || api_id.starts_with('.')
        || api_id.contains(['/', '\\'])
    {
        return Err(AppError::Validation(format!("invalid mock API id: {:?}", api_id)));
    }
    Ok(())
}

fn format_timestamp(at: OffsetDateTime) -> AppResult<String> {
    at.format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| AppError::Internal(format!("timestamp formatting failed: {}", e)))
}
