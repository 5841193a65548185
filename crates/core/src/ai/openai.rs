//! OpenAI GPT-3 completions and edits.

use serde::{Deserialize, Serialize};

use super::{ensure_choices, is_success, status_error, BackendConfig, BackendError};

pub const OPENAI_URL: &str = "https://api.openai.com";
pub const COMPLETIONS_ENDPOINT: &str = "v1/completions";
pub const EDITS_ENDPOINT: &str = "v1/edits";
pub const CODE_DAVINCI_V2: &str = "code-davinci-002";
pub const CODE_DAVINCI_EDIT_V1: &str = "code-davinci-edit-001";
pub const USER_AGENT: &str = "copilot-ops-cli";

/// Body of `POST /v1/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub n: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(config: &BackendConfig, prompt: &str, max_tokens: u32, n: u32) -> Self {
        Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| CODE_DAVINCI_V2.to_string()),
            prompt: prompt.to_string(),
            max_tokens,
            n,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: if config.stop.is_empty() {
                Vec::new()
            } else {
                vec![config.stop.clone()]
            },
        }
    }
}

/// Body of `POST /v1/edits`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRequest {
    pub model: String,
    pub input: String,
    pub instruction: String,
    pub n: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl EditRequest {
    pub fn new(config: &BackendConfig, input: &str, instruction: &str) -> Self {
        Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| CODE_DAVINCI_EDIT_V1.to_string()),
            input: input.to_string(),
            instruction: instruction.to_string(),
            n: config.n_completions.max(1),
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
}

/// Shared shape of completion and edit responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ApiError>,
}

/// Interpret a completions or edits exchange.
pub fn parse_response(status: u16, body: &str) -> Result<Vec<String>, BackendError> {
    if !is_success(status) {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message);
        return Err(status_error(status, message, body));
    }

    let response: Response = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

    let mut choices = response.choices;
    choices.sort_by_key(|c| c.index);
    ensure_choices(choices.into_iter().map(|c| c.text).collect())
}
