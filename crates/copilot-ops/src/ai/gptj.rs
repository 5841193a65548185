use copilot_ops_core::ai::gptj::{parse_response, GenerateRequest, COMPLETION_ENDPOINT};
use copilot_ops_core::ai::{Backend, BackendConfig, BackendError, Capability};
use reqwest::header::HeaderMap;

use super::{http_client, insert_bearer, send, ModelClient};

/// EleutherAI GPT-J; generation only, one completion per call.
#[derive(Debug)]
pub struct GptJClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl GptJClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        insert_bearer(&mut headers, config.api_key.as_deref())?;

        let http = http_client(&config, headers)?;
        Ok(Self { config, http })
    }
}

impl ModelClient for GptJClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        n_completions: u32,
    ) -> Result<Vec<String>, BackendError> {
        if n_completions > 1 {
            log::warn!("gpt-j returns a single completion, ignoring -c {}", n_completions);
        }

        let body = GenerateRequest::new(&self.config, prompt, max_tokens);
        let url = self.config.endpoint(COMPLETION_ENDPOINT);
        log::info!("requesting completion from {}", url);

        let (status, text) = send(self.http.post(url).json(&body)).await?;
        parse_response(status, &text)
    }

    async fn edit(&self, _input: &str, _instruction: &str) -> Result<Vec<String>, BackendError> {
        Err(BackendError::not_implemented(Backend::GptJ, Capability::Edit))
    }
}
