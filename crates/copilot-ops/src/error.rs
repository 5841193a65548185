use copilot_ops_core::ai::Backend;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No API key configured for {backend}: set it in .copilot-ops.yaml or {env}")]
    MissingApiKey { backend: Backend, env: &'static str },

    #[error("No files matched {0}, nothing to edit")]
    NothingToEdit(String),

    #[error("Invalid --path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
