//! Text protocol that packs a [`Filemap`] into a prompt block and reads model
//! output back into one.
//!
//! An encoded block looks like:
//!
//! ```text
//! # @mysql-pvc.yaml
//! kind: PersistentVolumeClaim
//! ===
//! # @mysql-pod.yaml
//! kind: Pod
//! ```
//!
//! Neither the delimiter nor the tag pattern is escaped. A file whose body
//! contains a `===` line or a `# @...` line will not survive a round trip.

use std::sync::OnceLock;

use regex::Regex;

use super::{Filemap, FilemapError};

/// Marks the start of a tag name on a `# ` header line.
pub const FILE_TAG_PREFIX: &str = "@";

/// Line separating two encoded files.
pub const FILE_DELIMITER: &str = "===";

/// Longest segment excerpt carried by a [`FilemapError::Parse`].
const SEGMENT_PREVIEW_CHARS: usize = 80;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"#\s*{}(.+)", regex::escape(FILE_TAG_PREFIX)))
            .expect("tag pattern is a valid regex")
    })
}

/// Encode every file as `# @<tag>` followed by its content, with a delimiter
/// line between entries (never after the last one).
pub fn encode(filemap: &Filemap) -> String {
    encode_with(filemap, |file| file.tag.clone())
}

/// Shared by [`encode`] and the plain renderer, which differ only in the header.
pub(crate) fn encode_with<F>(filemap: &Filemap, header: F) -> String
where
    F: Fn(&super::File) -> String,
{
    filemap
        .files()
        .map(|file| format!("# {}{}\n{}\n", FILE_TAG_PREFIX, header(file), file.content))
        .collect::<Vec<_>>()
        .join(&format!("{FILE_DELIMITER}\n"))
}

/// Find the first `# @<tag>` line in `content`.
///
/// Returns the trimmed tag and the index of the line it was found on. Lines
/// whose tag is blank after trimming do not count.
pub fn extract_tag(content: &str) -> Option<(String, usize)> {
    content.split_terminator('\n').enumerate().find_map(|(i, line)| {
        let captures = tag_pattern().captures(line)?;
        let tag = captures[1].trim();
        (!tag.is_empty()).then(|| (tag.to_string(), i))
    })
}

/// Every line strictly after `line`, each terminated by a newline.
///
/// Lines are split on `\n` only, so a `\r` before it stays with the content.
pub fn concatenate_after_line(content: &str, line: usize) -> String {
    content
        .split_terminator('\n')
        .skip(line + 1)
        .map(|l| format!("{l}\n"))
        .collect()
}

/// Split `text` on lines that are exactly the delimiter (ignoring surrounding
/// whitespace). Each segment is returned as its lines.
fn segments(text: &str) -> Vec<Vec<&str>> {
    let mut segments = vec![Vec::new()];
    for line in text.split_terminator('\n') {
        if line.trim() == FILE_DELIMITER {
            segments.push(Vec::new());
        } else if let Some(current) = segments.last_mut() {
            current.push(line);
        }
    }
    segments
}

/// Decode model output into `filemap`, returning the number of files applied.
///
/// Blank segments and segments holding only a tag line are skipped. Trailing
/// blank lines of a segment are dropped; every other line is kept as is. A
/// non-blank segment without a tag line fails the whole call with
/// [`FilemapError::Parse`] before anything is applied.
pub fn decode(text: &str, filemap: &mut Filemap) -> Result<usize, FilemapError> {
    let mut decoded = Vec::new();

    for lines in segments(text) {
        let Some(last) = lines.iter().rposition(|l| !l.trim().is_empty()) else {
            continue;
        };
        let segment = lines[..=last].join("\n");

        let (tag, line) = extract_tag(&segment).ok_or_else(|| FilemapError::Parse {
            segment: segment.trim().chars().take(SEGMENT_PREVIEW_CHARS).collect(),
        })?;

        let content = concatenate_after_line(&segment, line);
        if content.trim().is_empty() {
            continue;
        }

        decoded.push((tag, content));
    }

    let applied = decoded.len();
    for (tag, content) in decoded {
        filemap.upsert(&tag, content);
    }

    Ok(applied)
}
