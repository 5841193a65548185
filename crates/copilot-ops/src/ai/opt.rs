use copilot_ops_core::ai::{Backend, BackendError, Capability};

use super::ModelClient;

/// Placeholder for Meta's OPT; selectable but implements no capability yet.
#[derive(Debug, Default)]
pub struct OptClient;

impl ModelClient for OptClient {
    async fn generate(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _n_completions: u32,
    ) -> Result<Vec<String>, BackendError> {
        Err(BackendError::not_implemented(Backend::Opt, Capability::Generate))
    }

    async fn edit(&self, _input: &str, _instruction: &str) -> Result<Vec<String>, BackendError> {
        Err(BackendError::not_implemented(Backend::Opt, Capability::Edit))
    }
}
