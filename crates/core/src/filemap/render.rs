use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::codec::encode_with;
use super::{Filemap, FilemapError};

/// How a resulting [`Filemap`] is printed when it is not written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    /// Tag headers followed by content, delimiter-joined.
    Plain,
    /// A pretty-printed array of `{name, path, content}` records.
    #[default]
    Json,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Plain => "plain",
            OutputType::Json => "json",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = FilemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(OutputType::Plain),
            "json" => Ok(OutputType::Json),
            other => Err(FilemapError::InvalidOutputType(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileOutput<'a> {
    name: &'a str,
    path: String,
    content: &'a str,
}

/// Render `filemap` for display, headers using each file's path when it has one.
pub fn render(filemap: &Filemap, output: OutputType) -> Result<String, FilemapError> {
    match output {
        OutputType::Plain => Ok(encode_with(filemap, |file| match &file.path {
            Some(path) => path.display().to_string(),
            None => file.tag.clone(),
        })),
        OutputType::Json => {
            let records: Vec<FileOutput> = filemap
                .files()
                .map(|file| FileOutput {
                    name: if file.name.is_empty() {
                        file.tag.as_str()
                    } else {
                        file.name.as_str()
                    },
                    path: file
                        .path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    content: &file.content,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&records)?)
        }
    }
}
