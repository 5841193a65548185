//! Core library for copilot-ops
//!
//! This crate implements the **Functional Core** of the copilot-ops application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The copilot-ops project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`copilot_ops_core`** (this crate): the file-packing codec, prompt templates,
//!   backend wire schemas and configuration model
//! - **`copilot-ops`**: CLI, configuration discovery, HTTP transport and orchestration
//!   (the Imperative Shell)
//!
//! The only I/O performed here is the FileRegistry's own disk load and write-back,
//! which is kept next to the registry so tag assignment stays in one place.
//!
//! # Module Organization
//!
//! - [`filemap`]: the tag-keyed file registry, its text codec and output renderers
//! - [`prompt`]: prompt templates for generation and edit requests
//! - [`ai`]: backend catalogue, request/response schemas and response interpretation
//! - [`config`]: the `.copilot-ops.yaml` model, merging and environment overrides
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use copilot_ops_core::filemap::{decode, encode, Filemap};
//!
//! let mut filemap = Filemap::new();
//! filemap.upsert("a", "foo");
//! filemap.upsert("b", "bar");
//!
//! let text = encode(&filemap);
//! assert_eq!(text, "# @a\nfoo\n===\n# @b\nbar\n");
//!
//! let mut decoded = Filemap::new();
//! decode(&text, &mut decoded).unwrap();
//! assert_eq!(decoded.get("a").unwrap().content, "foo\n");
//! ```

pub mod ai;
pub mod config;
pub mod filemap;
pub mod prompt;
