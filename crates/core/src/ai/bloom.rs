//! BigScience BLOOM through the Hugging Face inference API.

use serde::{Deserialize, Serialize};

use super::{ensure_choices, is_success, status_error, BackendConfig, BackendError};

pub const API_URL: &str = "https://api-inference.huggingface.co/models/bigscience/bloom";

/// Default `max_new_tokens` used by the hosted model.
pub const DEFAULT_TOKEN_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateParameters {
    pub seed: u64,
    pub early_stopping: bool,
    pub length_penalty: i32,
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub top_p: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub inputs: String,
    pub parameters: GenerateParameters,
}

impl GenerateRequest {
    pub fn new(config: &BackendConfig, prompt: &str, max_tokens: u32) -> Self {
        Self {
            inputs: prompt.to_string(),
            parameters: GenerateParameters {
                seed: 42,
                early_stopping: false,
                length_penalty: 0,
                max_new_tokens: if max_tokens == 0 {
                    DEFAULT_TOKEN_SIZE
                } else {
                    max_tokens
                },
                do_sample: config.temperature > 0.0,
                top_p: config.top_p.unwrap_or(0.9),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub generated_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
}

/// The inference API reports some failures as an `{"error": ...}` body on a
/// success status, so both paths check for it.
pub fn parse_response(status: u16, body: &str) -> Result<Vec<String>, BackendError> {
    let error_message = || {
        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| r.error)
    };

    if !is_success(status) {
        return Err(status_error(status, error_message(), body));
    }

    let choices: Vec<Choice> = match serde_json::from_str(body) {
        Ok(choices) => choices,
        Err(e) => {
            return Err(match error_message() {
                Some(message) => status_error(status, Some(message), body),
                None => BackendError::MalformedResponse(e.to_string()),
            })
        }
    };

    ensure_choices(choices.into_iter().map(|c| c.generated_text).collect())
}
