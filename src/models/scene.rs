use serde_json::Value;

/// A named response body belonging to one mock API
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub api_id: String,
    pub name: String,
    pub body: Value,
}

/// Normalize an incoming scene body to the value that gets written.
///
/// A string is taken to be pre-serialized JSON and is parsed, so the stored
/// file never holds a string-within-a-string. Any other value is kept as is.
pub fn normalize_scene_body(body: Value) -> Result<Value, serde_json::Error> {
    match body {
        Value::String(text) => serde_json::from_str(&text),
        other => Ok(other),
    }
}
