//! The `.copilot-ops.yaml` model.
//!
//! Files are read and merged here; deciding *which* files to read (home
//! directory, working directory) is left to the caller, as is reading the
//! process environment, which reaches [`Config::apply_env`] as a closure.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{Backend, BackendConfig};

pub const CONFIG_FILE: &str = ".copilot-ops.yaml";
pub const LOCAL_CONFIG_FILE: &str = ".copilot-ops.local.yaml";

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_ORG_ID: &str = "OPENAI_ORG_ID";
pub const ENV_OPENAI_URL: &str = "OPENAI_URL";
pub const ENV_BACKEND: &str = "COPILOT_OPS_BACKEND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("{0}")]
    UnknownBackend(String),
    #[error("Fileset '{0}' not found in {file}", file = CONFIG_FILE)]
    FilesetNotFound(String),
}

/// A named group of globs selectable with `--fileset`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fileset {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Settings for the backends reached by URL and an optional token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filesets: Vec<Fileset>,
    #[serde(default, alias = "openAI", skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gptj: Option<EndpointSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom: Option<EndpointSection>,
}

fn merge_option<T>(base: Option<T>, overlay: Option<T>) -> Option<T> {
    overlay.or(base)
}

impl OpenAiSection {
    fn merge(self, overlay: Self) -> Self {
        Self {
            api_key: merge_option(self.api_key, overlay.api_key),
            org_id: merge_option(self.org_id, overlay.org_id),
            url: merge_option(self.url, overlay.url),
        }
    }
}

impl EndpointSection {
    fn merge(self, overlay: Self) -> Self {
        Self {
            url: merge_option(self.url, overlay.url),
            api_key: merge_option(self.api_key, overlay.api_key),
        }
    }
}

fn merge_section<T, F>(base: Option<T>, overlay: Option<T>, merge: F) -> Option<T>
where
    F: FnOnce(T, T) -> T,
{
    match (base, overlay) {
        (Some(base), Some(overlay)) => Some(merge(base, overlay)),
        (base, overlay) => overlay.or(base),
    }
}

impl Config {
    /// Parse a config document; an empty document is the default config.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read `path`, returning `None` when it does not exist.
    pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text, path).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load and merge every existing file in `paths`, later files winning.
    pub fn load_layered(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in paths {
            if let Some(layer) = Self::load_file(path)? {
                config = config.merge(layer);
            }
        }
        Ok(config)
    }

    /// Overlay `other` on `self`. Set scalars in `other` win, sections merge
    /// field by field, and filesets are replaced by name or appended.
    pub fn merge(self, other: Config) -> Config {
        let mut filesets = self.filesets;
        for fileset in other.filesets {
            match filesets.iter_mut().find(|f| f.name == fileset.name) {
                Some(existing) => *existing = fileset,
                None => filesets.push(fileset),
            }
        }

        Config {
            backend: merge_option(self.backend, other.backend),
            filesets,
            openai: merge_section(self.openai, other.openai, OpenAiSection::merge),
            gptj: merge_section(self.gptj, other.gptj, EndpointSection::merge),
            bloom: merge_section(self.bloom, other.bloom, EndpointSection::merge),
        }
    }

    /// Apply the environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let env_openai = OpenAiSection {
            api_key: lookup(ENV_OPENAI_API_KEY),
            org_id: lookup(ENV_OPENAI_ORG_ID),
            url: lookup(ENV_OPENAI_URL),
        };
        if env_openai != OpenAiSection::default() {
            self.openai = merge_section(self.openai, Some(env_openai), OpenAiSection::merge);
        }

        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = Some(backend.parse().map_err(ConfigError::UnknownBackend)?);
        }

        Ok(self)
    }

    pub fn find_fileset(&self, name: &str) -> Result<&Fileset, ConfigError> {
        self.filesets
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ConfigError::FilesetNotFound(name.to_string()))
    }

    /// Resolve the connection settings for `backend`.
    pub fn backend_config(&self, backend: Backend) -> BackendConfig {
        let (url, api_key, org_id) = match backend {
            Backend::Gpt3 => {
                let section = self.openai.clone().unwrap_or_default();
                (section.url, section.api_key, section.org_id)
            }
            Backend::GptJ => {
                let section = self.gptj.clone().unwrap_or_default();
                (section.url, section.api_key, None)
            }
            Backend::Bloom => {
                let section = self.bloom.clone().unwrap_or_default();
                (section.url, section.api_key, None)
            }
            Backend::Opt => (None, None, None),
        };

        let mut config =
            BackendConfig::new(url.unwrap_or_else(|| backend.default_url().to_string()));
        config.api_key = api_key;
        config.org_id = org_id;
        config
    }
}

/// Config files consulted when none is given explicitly, lowest priority first.
pub fn search_paths(home: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = vec![Path::new("/etc").join(CONFIG_FILE)];
    if let Some(home) = home {
        paths.push(home.join(CONFIG_FILE));
    }
    paths.push(cwd.join(CONFIG_FILE));
    paths.push(cwd.join(LOCAL_CONFIG_FILE));
    paths
}
