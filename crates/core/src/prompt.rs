//! Prompt templates sent to the completion backends.
//!
//! Every function here is a plain string template: identical inputs always
//! produce identical prompts.

use crate::ai::COMPLETION_END_OF_SEQUENCE;
use crate::filemap::{FILE_DELIMITER, FILE_TAG_PREFIX};

/// Build the full generation prompt from the user's request and the encoded
/// existing files (empty when there are none).
pub fn build_generate_prompt(request: &str, encoded_files: &str) -> String {
    let with_files = !encoded_files.trim().is_empty();

    let mut prompt = preamble(with_files).to_string();
    prompt.push_str(&instructions(with_files));
    prompt.push_str(&call_to_action(request, encoded_files));
    prompt
}

/// Opening lines, worded by whether existing YAMLs are included for context.
pub fn preamble(with_files: bool) -> &'static str {
    if with_files {
        "## This document contains instructions for a new Kubernetes YAML that needs to be created,\n\
         ## along with the relevant YAMLs for context, and the resultant YAML."
    } else {
        "## This document contains instructions for a new Kubernetes YAML that needs to be created,\n\
         ## and the resultant YAML."
    }
}

/// Numbered outline of the document sections the model should expect.
pub fn instructions(with_files: bool) -> String {
    let mut step = 1;

    let mut prompt = format!(
        "\n##\n## The structure of the document is as follows:\n## {step}. Description of the desired YAML"
    );
    step += 1;

    if with_files {
        prompt.push_str(&format!(
            "\n## {step}. The existing YAMLs, each separated by a '{FILE_DELIMITER}'"
        ));
        step += 1;
    }

    prompt.push_str(&format!(
        "\n## {step}. The new YAML, terminated by an '{COMPLETION_END_OF_SEQUENCE}'\n"
    ));
    prompt
}

/// The request itself, the existing YAMLs if any, and the cue to start writing.
pub fn call_to_action(request: &str, encoded_files: &str) -> String {
    let mut step = 1;

    let mut prompt = format!("\n## {step}. Instructions for the new Kubernetes YAML:\n{request}\n");
    step += 1;

    if !encoded_files.trim().is_empty() {
        prompt.push_str(&format!("\n## {step}. Existing YAMLs:\n{encoded_files}\n"));
        step += 1;
    }

    prompt.push_str(&format!("\n## {step}. The new YAML:\n"));
    prompt
}

/// Instruction for the edit capability: the request plus a reminder to keep
/// the tag headers intact so the result can be decoded.
pub fn build_edit_instruction(request: &str) -> String {
    format!(
        "{request}\n\nThe resulting file should preserve the '# {FILE_TAG_PREFIX}tagname' \
         format used to identify the YAML(s)."
    )
}
