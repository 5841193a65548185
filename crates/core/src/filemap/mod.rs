//! Tag-keyed registry of the files packed into a prompt.
//!
//! Files are stored in a `BTreeMap`, so every iteration (and therefore every
//! encoding) is ordered by tag. That ordering is the canonical one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod codec;
pub mod render;

pub use codec::{concatenate_after_line, decode, encode, extract_tag, FILE_DELIMITER, FILE_TAG_PREFIX};
pub use render::{render, OutputType};

/// Name prefix given to completions that could not be decoded into files.
pub const SALVAGE_PREFIX: &str = "generated-by-copilot-ops";

/// Extension appended to inferred file names that have none.
pub const DEFAULT_EXTENSION: &str = "yaml";

#[derive(Debug, Error)]
pub enum FilemapError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid glob pattern '{pattern}': {message}")]
    Glob { pattern: String, message: String },
    #[error("Tag '{0}' is already taken")]
    TagConflict(String),
    #[error("No '# {prefix}<tag>' line found in segment: {segment}", prefix = FILE_TAG_PREFIX)]
    Parse { segment: String },
    #[error("Unknown output type '{0}' (expected 'plain' or 'json')")]
    InvalidOutputType(String),
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// A single file known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct File {
    /// Protocol-level identifier, unique within a [`Filemap`].
    pub tag: String,
    /// Base file name, empty for files that came back from a model.
    pub name: String,
    /// Where the file lives on disk, `None` until a path is known.
    pub path: Option<PathBuf>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filemap {
    files: BTreeMap<String, File>,
}

impl Filemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, tag: &str) -> Option<&File> {
        self.files.get(tag)
    }

    /// Files in canonical (tag) order.
    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Replace the content of `tag`, or insert a new pathless file under it.
    pub fn upsert(&mut self, tag: &str, content: impl Into<String>) {
        let content = content.into();
        match self.files.get_mut(tag) {
            Some(file) => file.content = content,
            None => {
                self.files.insert(
                    tag.to_string(),
                    File {
                        tag: tag.to_string(),
                        content,
                        ..File::default()
                    },
                );
            }
        }
    }

    /// Insert a file under its own tag, refusing to overwrite an existing one.
    pub fn insert(&mut self, file: File) -> Result<(), FilemapError> {
        if self.files.contains_key(&file.tag) {
            return Err(FilemapError::TagConflict(file.tag));
        }
        self.files.insert(file.tag.clone(), file);
        Ok(())
    }

    /// Register content read from `path`, deriving the tag from its base name.
    ///
    /// A base name that is already taken gets `#<registry size>` appended; if
    /// that suffixed tag is taken too the insert fails with
    /// [`FilemapError::TagConflict`].
    pub fn insert_loaded(&mut self, path: &Path, content: String) -> Result<&File, FilemapError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let mut tag = name.clone();
        if self.files.contains_key(&tag) {
            tag = format!("{}#{}", name, self.files.len());
            if self.files.contains_key(&tag) {
                return Err(FilemapError::TagConflict(tag));
            }
        }

        self.files.insert(
            tag.clone(),
            File {
                tag: tag.clone(),
                name,
                path: Some(path.to_path_buf()),
                content,
            },
        );

        Ok(&self.files[&tag])
    }

    /// Read a file from disk and register it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&File, FilemapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FilemapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.insert_loaded(path, content)
    }

    /// Expand `pattern` and load every match. The first failure aborts the call;
    /// files loaded before it stay in the registry.
    pub fn load_glob(&mut self, pattern: &str) -> Result<Vec<File>, FilemapError> {
        let entries = glob::glob(pattern).map_err(|e| FilemapError::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut loaded = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| FilemapError::Io {
                path: e.path().to_path_buf(),
                source: e.into(),
            })?;
            loaded.push(self.load_file(&path)?.clone());
        }

        Ok(loaded)
    }

    /// Give every pathless file a path under `dir`, named after the file (or
    /// its tag) with a `.yaml` extension when it has none.
    pub fn assign_missing_paths(&mut self, dir: &Path) {
        for file in self.files.values_mut().filter(|f| f.path.is_none()) {
            let mut name = if file.name.is_empty() {
                file.tag.clone()
            } else {
                file.name.clone()
            };
            if Path::new(&name).extension().is_none() {
                name = format!("{name}.{DEFAULT_EXTENSION}");
            }
            file.path = Some(dir.join(&name));
            if file.name.is_empty() {
                file.name = name;
            }
        }
    }

    /// Write every file that has a path, creating parent directories as needed.
    ///
    /// Stops at the first failure; files written before it are left in place.
    /// Returns how many files were written.
    pub fn write_all(&self) -> Result<usize, FilemapError> {
        let mut written = 0;
        for file in self.files.values() {
            let Some(path) = &file.path else {
                continue;
            };

            let io_error = |source| FilemapError::Io {
                path: path.clone(),
                source,
            };

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.exists() {
                    fs::create_dir_all(parent).map_err(io_error)?;
                }
            }
            fs::write(path, &file.content).map_err(io_error)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Turn raw completions into pathless files named
/// `generated-by-copilot-ops<i>.yaml`, one per completion, content verbatim.
pub fn salvage_completions(completions: &[String]) -> Filemap {
    let files = completions
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let name = format!("{SALVAGE_PREFIX}{}.{DEFAULT_EXTENSION}", i + 1);
            let file = File {
                tag: name.clone(),
                name: name.clone(),
                path: None,
                content: text.clone(),
            };
            (name, file)
        })
        .collect();

    Filemap { files }
}
