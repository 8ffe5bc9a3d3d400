use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::store::MockRoot;

/// External text-completion collaborator used for AI filling.
///
/// Implementations return the model's raw reply; nothing about it is trusted.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, payload: &str) -> AppResult<String>;
}

/// Result of an AI filling request after the reply has been cleaned up
#[derive(Debug, Clone, PartialEq)]
pub struct FilledScene {
    /// Pretty-printed JSON when the reply parsed, otherwise the stripped reply text
    pub response: String,
    pub valid: bool,
}

/// Ask the completion service to fill a scene body and re-validate the reply.
pub async fn fill_scene(completion: &dyn TextCompletion, payload: &str) -> AppResult<FilledScene> {
    let reply = completion.complete(payload).await?;
    Ok(clean_reply(&reply))
}

/// Strip a Markdown code fence around the reply, then check that it is JSON.
pub fn clean_reply(reply: &str) -> FilledScene {
    let text = strip_code_fence(reply.trim());

    match serde_json::from_str::<Value>(text) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => FilledScene {
                response: pretty,
                valid: true,
            },
            Err(_) => FilledScene {
                response: text.to_string(),
                valid: true,
            },
        },
        Err(e) => {
            tracing::warn!(error = %e, "Completion reply is not valid JSON");
            FilledScene {
                response: text.to_string(),
                valid: false,
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn build_prompt(payload: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         You are given a mock API response JSON data.\n\
         Fill each empty field (\"\", null) with a value of the correct type based on the field name.\n\
         Do not overwrite fields that already have a value, and do not rename any field.\n\
         For example, a field named \"name\" with value \"\" gets a person's name, and a field named \"success\" gets true or false.\n\
         If a field is an array, add more items following the pattern of the existing ones.\n\
         If the JSON data is not valid, fix it and return valid JSON.\n\
         Treat commented text (starting with //) in the JSON data as specific instructions for you.\n\
         Return only the JSON data, without any other text.\n\
         Mock API response JSON data: {}",
        payload
    )
}

// ============ OpenAI chat completions ============

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completions client. The API key is read from the storage root's
/// `.env` on every call, so it can be edited without a restart.
pub struct OpenAiCompletion {
    client: Client,
    root: MockRoot,
    base_url: String,
    model: String,
}

impl OpenAiCompletion {
    pub fn new(root: MockRoot, config: &Config) -> Self {
        Self {
            // No request timeout: a hung upstream only holds its own request
            client: Client::new(),
            root,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        }
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, payload: &str) -> AppResult<String> {
        let api_key = self
            .root
            .openai_api_key()
            .ok_or_else(|| AppError::Validation("OPENAI_API_KEY is not configured".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(payload)),
            }],
        };

        tracing::info!(model = %self.model, "Requesting AI filling");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "completion service returned {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("completion service returned no content".to_string()))
    }
}
