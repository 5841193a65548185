//! HTTP side of the model backends.
//!
//! Request and response schemas live in `copilot_ops_core::ai`; this module
//! only builds clients, sends requests and hands `(status, body)` back to the
//! pure parsers.

use copilot_ops_core::ai::{Backend, BackendConfig, BackendError, Capability};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

mod bloom;
mod gptj;
mod openai;
mod opt;

pub use bloom::BloomClient;
pub use gptj::GptJClient;
pub use openai::OpenAiClient;
pub use opt::OptClient;

/// A language model able to propose file contents.
///
/// Backends without a capability answer with
/// [`BackendError::NotImplemented`] rather than failing at construction.
#[allow(async_fn_in_trait)]
pub trait ModelClient {
    /// Complete `prompt`, returning one string per requested completion.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        n_completions: u32,
    ) -> Result<Vec<String>, BackendError>;

    /// Rewrite `input` according to `instruction`.
    async fn edit(&self, input: &str, instruction: &str) -> Result<Vec<String>, BackendError>;
}

/// The configured backend, selected once per invocation.
#[derive(Debug)]
pub enum Client {
    Gpt3(OpenAiClient),
    GptJ(GptJClient),
    Bloom(BloomClient),
    Opt(OptClient),
}

impl Client {
    pub fn new(backend: Backend, config: BackendConfig) -> Result<Self, BackendError> {
        log::debug!("using backend {} at {}", backend, config.base_url);

        Ok(match backend {
            Backend::Gpt3 => Client::Gpt3(OpenAiClient::new(config)?),
            Backend::GptJ => Client::GptJ(GptJClient::new(config)?),
            Backend::Bloom => Client::Bloom(BloomClient::new(config)?),
            Backend::Opt => Client::Opt(OptClient),
        })
    }

    pub fn backend(&self) -> Backend {
        match self {
            Client::Gpt3(_) => Backend::Gpt3,
            Client::GptJ(_) => Backend::GptJ,
            Client::Bloom(_) => Backend::Bloom,
            Client::Opt(_) => Backend::Opt,
        }
    }

    /// Fail early when the backend can never serve `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), BackendError> {
        let backend = self.backend();
        if backend.supports(capability) {
            Ok(())
        } else {
            Err(BackendError::not_implemented(backend, capability))
        }
    }
}

impl ModelClient for Client {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        n_completions: u32,
    ) -> Result<Vec<String>, BackendError> {
        match self {
            Client::Gpt3(client) => client.generate(prompt, max_tokens, n_completions).await,
            Client::GptJ(client) => client.generate(prompt, max_tokens, n_completions).await,
            Client::Bloom(client) => client.generate(prompt, max_tokens, n_completions).await,
            Client::Opt(client) => client.generate(prompt, max_tokens, n_completions).await,
        }
    }

    async fn edit(&self, input: &str, instruction: &str) -> Result<Vec<String>, BackendError> {
        match self {
            Client::Gpt3(client) => client.edit(input, instruction).await,
            Client::GptJ(client) => client.edit(input, instruction).await,
            Client::Bloom(client) => client.edit(input, instruction).await,
            Client::Opt(client) => client.edit(input, instruction).await,
        }
    }
}

/// Build an HTTP client with the per-call timeout and `headers` on every request.
pub(crate) fn http_client(
    config: &BackendConfig,
    headers: HeaderMap,
) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()
        .map_err(|e| BackendError::Transport(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value)
        .map_err(|e| BackendError::Transport(format!("Invalid header value: {}", e)))
}

/// Insert `Authorization: Bearer <token>` when a token is configured.
pub(crate) fn insert_bearer(
    headers: &mut HeaderMap,
    token: Option<&str>,
) -> Result<(), BackendError> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
    }
    Ok(())
}

/// Send `request` and return the raw status and body.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<(u16, String), BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))?;

    log::debug!("backend answered {} with {} bytes", status, body.len());

    Ok((status, body))
}
