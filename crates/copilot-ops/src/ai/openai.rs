use copilot_ops_core::ai::openai::{
    parse_response, CompletionRequest, EditRequest, COMPLETIONS_ENDPOINT, EDITS_ENDPOINT,
    USER_AGENT,
};
use copilot_ops_core::ai::{BackendConfig, BackendError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use super::{header_value, http_client, insert_bearer, send, ModelClient};

/// OpenAI completions and edits.
#[derive(Debug)]
pub struct OpenAiClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        insert_bearer(&mut headers, config.api_key.as_deref())?;
        if let Some(org_id) = config.org_id.as_deref().filter(|o| !o.is_empty()) {
            headers.insert(
                HeaderName::from_static("openai-organization"),
                header_value(org_id)?,
            );
        }
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = http_client(&config, headers)?;
        Ok(Self { config, http })
    }
}

impl ModelClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        n_completions: u32,
    ) -> Result<Vec<String>, BackendError> {
        let body = CompletionRequest::new(&self.config, prompt, max_tokens, n_completions);
        let url = self.config.endpoint(COMPLETIONS_ENDPOINT);
        log::info!("requesting {} completion(s) from {}", n_completions, url);

        let (status, text) = send(self.http.post(url).json(&body)).await?;
        parse_response(status, &text)
    }

    async fn edit(&self, input: &str, instruction: &str) -> Result<Vec<String>, BackendError> {
        let body = EditRequest::new(&self.config, input, instruction);
        let url = self.config.endpoint(EDITS_ENDPOINT);
        log::info!("requesting edit from {}", url);

        let (status, text) = send(self.http.post(url).json(&body)).await?;
        parse_response(status, &text)
    }
}
