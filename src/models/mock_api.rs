use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// HTTP method a mock API answers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "delete")]
    Delete,
    /// Matches any method
    #[serde(alias = "all")]
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::All => "ALL",
        }
    }
}

/// Contents of a mock API's `.config` file.
///
/// Unknown keys are carried through `extra` so a merge never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// Selected scene name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A mock API as read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct MockApi {
    pub id: String,
    pub config: MockApiConfig,
    pub scene_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMockApi {
    pub path: String,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    /// Name of the first scene; when absent the API starts with no scenes
    pub scene: Option<String>,
    /// Body of the first scene, a JSON value or a JSON-encoded string
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMockApi {
    pub path: Option<String>,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    pub scene: Option<String>,
}

impl UpdateMockApi {
    /// Config fields other than the scene selection, as a partial config object
    pub fn config_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(path) = &self.path {
            fields.insert("path".to_string(), Value::String(path.clone()));
        }
        if let Some(description) = &self.description {
            fields.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(method) = self.method {
            fields.insert(
                "method".to_string(),
                Value::String(method.as_str().to_string()),
            );
        }
        fields
    }
}
