//! Backend catalogue and the pure half of every ModelClient variant.
//!
//! Each backend module owns its request/response schema and a
//! `parse_response(status, body)` function that turns a raw HTTP exchange
//! into completion strings or a [`BackendError`]. The transport lives in the
//! binary crate.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod bloom;
pub mod gptj;
pub mod openai;

/// Stop sequence the model is told to emit when the new YAML is complete.
pub const COMPLETION_END_OF_SEQUENCE: &str = "EOF";

/// Per-call HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_COMPLETIONS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Backend {
    #[default]
    #[serde(rename = "gpt-3")]
    Gpt3,
    #[serde(rename = "gpt-j")]
    GptJ,
    #[serde(rename = "bloom")]
    Bloom,
    #[serde(rename = "opt")]
    Opt,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Gpt3, Backend::GptJ, Backend::Bloom, Backend::Opt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gpt3 => "gpt-3",
            Backend::GptJ => "gpt-j",
            Backend::Bloom => "bloom",
            Backend::Opt => "opt",
        }
    }

    /// Where the backend is reached when configuration names no URL.
    pub fn default_url(&self) -> &'static str {
        match self {
            Backend::Gpt3 => openai::OPENAI_URL,
            Backend::GptJ => gptj::API_URL,
            Backend::Bloom => bloom::API_URL,
            Backend::Opt => "",
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Backend::Gpt3, _) | (Backend::GptJ | Backend::Bloom, Capability::Generate)
        )
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown backend '{}' (expected one of: gpt-3, gpt-j, bloom, opt)",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Generate,
    Edit,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Generate => f.write_str("generate"),
            Capability::Edit => f.write_str("edit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to backend failed: {0}")]
    Transport(String),

    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response from backend: {0}")]
    MalformedResponse(String),

    #[error("Backend returned no choices")]
    EmptyChoices,

    #[error("Backend {backend} does not implement {capability}")]
    NotImplemented {
        backend: Backend,
        capability: Capability,
    },
}

impl BackendError {
    /// True when the backend lacks the capability, as opposed to failing at runtime.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, BackendError::NotImplemented { .. })
    }

    pub fn not_implemented(backend: Backend, capability: Capability) -> Self {
        BackendError::NotImplemented {
            backend,
            capability,
        }
    }
}

/// Immutable per-call settings handed to a ModelClient.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub org_id: Option<String>,
    /// Model identifier; `None` lets the backend pick its default per capability.
    pub model: Option<String>,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_tokens: u32,
    pub n_completions: u32,
    pub stop: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            org_id: None,
            model: None,
            temperature: 0.0,
            top_p: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            n_completions: DEFAULT_COMPLETIONS,
            stop: COMPLETION_END_OF_SEQUENCE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Join `endpoint` onto the base URL with exactly one slash between them.
    pub fn endpoint(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Reject an otherwise successful call that produced nothing to decode.
pub fn ensure_choices(choices: Vec<String>) -> Result<Vec<String>, BackendError> {
    if choices.is_empty() {
        Err(BackendError::EmptyChoices)
    } else {
        Ok(choices)
    }
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Status error whose message is the raw body, or the status' reason when empty.
pub(crate) fn status_error(status: u16, message: Option<String>, body: &str) -> BackendError {
    let message = message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "no error message".to_string()
            } else {
                body.trim().to_string()
            }
        });
    BackendError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("gpt-3".parse::<Backend>().unwrap(), Backend::Gpt3);
        assert_eq!("gpt-j".parse::<Backend>().unwrap(), Backend::GptJ);
        assert_eq!("bloom".parse::<Backend>().unwrap(), Backend::Bloom);
        assert_eq!("opt".parse::<Backend>().unwrap(), Backend::Opt);
        assert!("gpt-4".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_serde_names_match_display() {
        for backend in Backend::ALL {
            let json = serde_json::to_string(&backend).unwrap();
            assert_eq!(json, format!("\"{}\"", backend));
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(Backend::Gpt3.supports(Capability::Generate));
        assert!(Backend::Gpt3.supports(Capability::Edit));
        assert!(Backend::GptJ.supports(Capability::Generate));
        assert!(!Backend::GptJ.supports(Capability::Edit));
        assert!(Backend::Bloom.supports(Capability::Generate));
        assert!(!Backend::Bloom.supports(Capability::Edit));
        assert!(!Backend::Opt.supports(Capability::Generate));
        assert!(!Backend::Opt.supports(Capability::Edit));
    }

    #[test]
    fn test_not_implemented_is_distinct() {
        let err = BackendError::not_implemented(Backend::Opt, Capability::Edit);
        assert!(err.is_not_implemented());
        assert_eq!(err.to_string(), "Backend opt does not implement edit");

        assert!(!BackendError::EmptyChoices.is_not_implemented());
        assert!(!BackendError::Transport("connection refused".to_string()).is_not_implemented());
    }

    #[test]
    fn test_ensure_choices() {
        assert!(matches!(
            ensure_choices(vec![]),
            Err(BackendError::EmptyChoices)
        ));
        assert_eq!(
            ensure_choices(vec!["a".to_string()]).unwrap(),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn test_endpoint_joining() {
        let config = BackendConfig::new("https://api.openai.com/");
        assert_eq!(
            config.endpoint("/v1/completions"),
            "https://api.openai.com/v1/completions"
        );

        let config = BackendConfig::new("http://localhost:8080");
        assert_eq!(config.endpoint("completion"), "http://localhost:8080/completion");
    }

    #[test]
    fn test_status_error_message_fallbacks() {
        match status_error(500, Some("model overloaded".to_string()), "{}") {
            BackendError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }

        match status_error(502, None, "  Bad Gateway \n") {
            BackendError::Status { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {other}"),
        }

        match status_error(404, None, "") {
            BackendError::Status { message, .. } => assert_eq!(message, "no error message"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
