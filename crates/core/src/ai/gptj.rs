//! EleutherAI's hosted GPT-J.
//!
//! The endpoint returns a single completion and has no edit capability.

use serde::{Deserialize, Serialize};

use super::{ensure_choices, is_success, status_error, BackendConfig, BackendError};

pub const API_URL: &str = "https://api.eleuther.ai";
pub const COMPLETION_ENDPOINT: &str = "completion";

/// Most tokens GPT-J will generate in one call.
pub const MAX_TOKENS_GENERATE: u32 = 128;

const DEFAULT_TOP_P: f32 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub context: String,
    pub top_p: f32,
    pub temp: f32,
    pub response_length: u32,
    pub remove_input: bool,
}

impl GenerateRequest {
    pub fn new(config: &BackendConfig, prompt: &str, max_tokens: u32) -> Self {
        Self {
            context: prompt.to_string(),
            top_p: config.top_p.unwrap_or(DEFAULT_TOP_P),
            temp: config.temperature,
            response_length: max_tokens.min(MAX_TOKENS_GENERATE),
            remove_input: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub generated_text: String,
}

pub fn parse_response(status: u16, body: &str) -> Result<Vec<String>, BackendError> {
    if !is_success(status) {
        return Err(status_error(status, None, body));
    }

    let choices: Vec<Choice> = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

    ensure_choices(choices.into_iter().map(|c| c.generated_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_length_is_capped() {
        let config = BackendConfig::new(API_URL);

        assert_eq!(GenerateRequest::new(&config, "p", 512).response_length, 128);
        assert_eq!(GenerateRequest::new(&config, "p", 64).response_length, 64);
    }

    #[test]
    fn test_request_shape() {
        let config = BackendConfig::new(API_URL);
        let json = serde_json::to_value(GenerateRequest::new(&config, "## prompt", 32)).unwrap();

        assert_eq!(json["context"], "## prompt");
        assert_eq!(json["remove_input"], true);
        assert_eq!(json["response_length"], 32);
    }

    #[test]
    fn test_parse_single_completion() {
        let body = r##"[{"generated_text": "# @pod.yaml\nkind: Pod\n"}]"##;
        assert_eq!(
            parse_response(200, body).unwrap(),
            vec!["# @pod.yaml\nkind: Pod\n".to_string()]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_response(500, "Internal Server Error"),
            Err(BackendError::Status { status: 500, .. })
        ));
        assert!(matches!(
            parse_response(200, r#"{"generated_text": "not a list"}"#),
            Err(BackendError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(200, "[]"),
            Err(BackendError::EmptyChoices)
        ));
    }
}
