use crate::ai::Client;
use crate::prelude::*;
use copilot_ops_core::ai::{Backend, BackendConfig};
use copilot_ops_core::config::{Config, ENV_OPENAI_API_KEY};
use copilot_ops_core::filemap::{
    decode, encode, salvage_completions, Filemap, FilemapError, OutputType, SALVAGE_PREFIX,
};
use std::path::PathBuf;

/// Flags shared by every command that sends a request to a backend.
#[derive(Debug, Clone, clap::Args)]
pub struct RequestArgs {
    /// Natural language description of the change
    #[arg(short, long)]
    pub request: String,

    /// Write the resulting files to disk instead of printing them
    #[arg(short, long, default_value = "false")]
    pub write: bool,

    /// Root of the repository; globs and config are resolved from here
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// How to print the resulting files (plain or json)
    #[arg(short, long, default_value = "json")]
    pub output: OutputType,

    /// Base URL of the backend, overriding configuration
    #[arg(long = "openai-url", visible_alias = "url")]
    pub url: Option<String>,

    /// Backend to use (gpt-3, gpt-j, bloom, opt)
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Model identifier, overriding the backend's default
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for resulting files that have no path yet
    #[arg(long, default_value = SALVAGE_PREFIX)]
    pub output_dir: PathBuf,
}

/// Everything a command needs once flags, config and files are resolved.
#[derive(Debug)]
pub struct Request {
    pub filemap: Filemap,
    pub filemap_text: String,
    pub client: Client,
}

/// Resolve configuration, load the requested files and build the backend client.
pub fn prepare(
    args: &RequestArgs,
    globs: &[String],
    filesets: &[String],
    global: &crate::Global,
) -> Result<Request> {
    log::debug!("request args: {:?}", args);

    std::env::set_current_dir(&args.path).map_err(|source| Error::InvalidPath {
        path: args.path.display().to_string(),
        source,
    })?;

    let config = crate::config::load(global)?;
    let (backend, backend_config) = resolve_backend(args, &config)?;

    let filemap = crate::filemap::load(globs, filesets, &config)?;
    if global.verbose {
        crate::filemap::dump("Loaded files", &filemap);
    }

    let filemap_text = encode(&filemap);
    log::info!(
        "packed {} files into {} bytes",
        filemap.len(),
        filemap_text.len()
    );

    let client = Client::new(backend, backend_config)?;

    Ok(Request {
        filemap,
        filemap_text,
        client,
    })
}

/// Pick the backend (flag, then config, then gpt-3) and its connection settings.
pub fn resolve_backend(args: &RequestArgs, config: &Config) -> Result<(Backend, BackendConfig)> {
    let backend = args.backend.or(config.backend).unwrap_or_default();

    let mut backend_config = config.backend_config(backend);
    if let Some(url) = &args.url {
        backend_config.base_url = url.clone();
    }
    if let Some(model) = &args.model {
        backend_config.model = Some(model.clone());
    }

    if backend == Backend::Gpt3 && backend_config.api_key.is_none() {
        return Err(Error::MissingApiKey {
            backend,
            env: ENV_OPENAI_API_KEY,
        }
        .into());
    }

    Ok((backend, backend_config))
}

/// Decode every completion into a fresh registry.
///
/// When any completion has no `# @tag` lines, the raw completions are kept
/// instead, one new file each.
pub fn decode_completions(completions: &[String]) -> Result<Filemap, FilemapError> {
    let mut filemap = Filemap::new();

    for completion in completions {
        match decode(completion, &mut filemap) {
            Ok(applied) => log::debug!("decoded {} files from completion", applied),
            Err(FilemapError::Parse { segment }) => {
                log::warn!(
                    "decoding failed near {:?}, keeping {} raw completion(s) as new files",
                    segment,
                    completions.len()
                );
                return Ok(salvage_completions(completions));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(filemap)
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use copilot_ops_core::config::OpenAiSection;

    #[derive(Debug, clap::Parser)]
    struct TestApp {
        #[clap(flatten)]
        args: RequestArgs,
    }

    fn args(flags: &[&str]) -> RequestArgs {
        let mut argv = vec!["test", "-r", "make a pod"];
        argv.extend_from_slice(flags);
        TestApp::parse_from(argv).args
    }

    fn config_with_key() -> Config {
        Config {
            openai: Some(OpenAiSection {
                api_key: Some("sk-test".to_string()),
                ..OpenAiSection::default()
            }),
            ..Config::default()
        }
    }

    #[test]
    fn test_flag_defaults() {
        let args = args(&[]);

        assert_eq!(args.request, "make a pod");
        assert!(!args.write);
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.output, OutputType::Json);
        assert_eq!(args.output_dir, PathBuf::from("generated-by-copilot-ops"));
    }

    #[test]
    fn test_invalid_output_flag() {
        let result = TestApp::try_parse_from(["test", "-r", "x", "-o", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_from_flag_wins_over_config() {
        let config = Config {
            backend: Some(Backend::Bloom),
            ..Config::default()
        };

        let (backend, _) = resolve_backend(&args(&["--backend", "gpt-j"]), &config).unwrap();
        assert_eq!(backend, Backend::GptJ);

        let (backend, _) = resolve_backend(&args(&[]), &config).unwrap();
        assert_eq!(backend, Backend::Bloom);
    }

    #[test]
    fn test_gpt3_requires_api_key() {
        let err = resolve_backend(&args(&["--backend", "gpt-3"]), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let (backend, config) = resolve_backend(&args(&[]), &config_with_key()).unwrap();
        assert_eq!(backend, Backend::Gpt3);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_url_and_model_overrides() {
        let (_, config) = resolve_backend(
            &args(&["--url", "http://localhost:8080", "--model", "davinci"]),
            &config_with_key(),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.model.as_deref(), Some("davinci"));
    }

    #[test]
    fn test_decode_completions_merges_tagged_output() {
        let completions = vec![
            "# @mysql-pod.yaml\nkind: Pod\n".to_string(),
            "# @mysql-svc.yaml\nkind: Service\n===\n".to_string(),
        ];

        let filemap = decode_completions(&completions).unwrap();

        assert_eq!(filemap.len(), 2);
        assert_eq!(filemap.get("mysql-pod.yaml").unwrap().content, "kind: Pod\n");
        assert_eq!(filemap.get("mysql-svc.yaml").unwrap().content, "kind: Service\n");
    }

    #[test]
    fn test_decode_completions_salvages_untagged_output() {
        let completions = vec![
            "apiVersion: v1\nkind: Pod\n".to_string(),
            "apiVersion: v1\nkind: Service\n".to_string(),
        ];

        let filemap = decode_completions(&completions).unwrap();

        assert_eq!(filemap.len(), 2);
        let first = filemap.get("generated-by-copilot-ops1.yaml").unwrap();
        assert_eq!(first.content, completions[0]);
        assert_eq!(first.path, None);
        let second = filemap.get("generated-by-copilot-ops2.yaml").unwrap();
        assert_eq!(second.content, completions[1]);
    }

    #[test]
    fn test_decode_completions_salvages_all_when_one_fails() {
        let completions = vec![
            "# @mysql-pod.yaml\nkind: Pod\n".to_string(),
            "kind: Service\n".to_string(),
        ];

        let filemap = decode_completions(&completions).unwrap();

        assert_eq!(
            filemap.tags().collect::<Vec<_>>(),
            vec!["generated-by-copilot-ops1.yaml", "generated-by-copilot-ops2.yaml"]
        );
    }
}
