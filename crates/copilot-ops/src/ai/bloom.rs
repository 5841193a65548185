use copilot_ops_core::ai::bloom::{parse_response, GenerateRequest};
use copilot_ops_core::ai::{Backend, BackendConfig, BackendError, Capability};
use reqwest::header::HeaderMap;

use super::{http_client, insert_bearer, send, ModelClient};

/// BLOOM on the Hugging Face inference API. The base URL is the model endpoint.
#[derive(Debug)]
pub struct BloomClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl BloomClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        insert_bearer(&mut headers, config.api_key.as_deref())?;

        let http = http_client(&config, headers)?;
        Ok(Self { config, http })
    }
}

impl ModelClient for BloomClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        n_completions: u32,
    ) -> Result<Vec<String>, BackendError> {
        if n_completions > 1 {
            log::warn!("bloom returns a single completion, ignoring -c {}", n_completions);
        }

        let body = GenerateRequest::new(&self.config, prompt, max_tokens);
        log::info!("requesting completion from {}", self.config.base_url);

        let (status, text) = send(self.http.post(&self.config.base_url).json(&body)).await?;
        parse_response(status, &text)
    }

    async fn edit(&self, _input: &str, _instruction: &str) -> Result<Vec<String>, BackendError> {
        Err(BackendError::not_implemented(Backend::Bloom, Capability::Edit))
    }
}
