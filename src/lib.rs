#![forbid(unsafe_code)]

//! @acp:module "Ruleforge Library"
//! @acp:summary "Compose tagged engineering-rule fragments into AI assistant instruction files"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability experimental
//!
//! # Ruleforge
//!
//! Selects, merges and renders small tagged rule fragments into the files
//! AI coding assistants read (`CLAUDE.md`, `.cursor/rules/*.mdc`,
//! `AGENTS.md`, ...).
//!
//! ## Pipeline
//!
//! - **Loader** ([`registry::load_fragment_sources`]): per-tag fragment sets
//!   from the built-in directory plus additive extra directories
//! - **Composer** ([`registry::compose`]): one ordered, deduplicated,
//!   tier-filtered sequence per category
//! - **Renderer** ([`render`]): placeholders, `{{#if}}` blocks and
//!   target-specific documents
//! - **Merge engine** ([`sync::merge`]): keeps user-added sections when a
//!   file is regenerated
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ruleforge::registry::{compose, load_fragment_sources, ComposeOptions, Tag};
//! use ruleforge::render::{render_instruction_document, Language, RenderContext, Target};
//!
//! fn main() -> ruleforge::Result<()> {
//!     let sets = load_fragment_sources(Path::new("templates"), &[])?;
//!     let tags = vec![Tag::new("api")];
//!     let composed = compose(&tags, &sets, &ComposeOptions::default())?;
//!
//!     let ctx = RenderContext::new("billing", Language::Rust).with_tags(tags);
//!     print!("{}", render_instruction_document(&composed, &ctx, Target::ClaudeCode));
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod registry;
pub mod render;
pub mod sync;

// Re-exports
pub use config::Config;
pub use error::{ForgeError, Result};
pub use registry::{compose, load_fragment_sources, ComposeOptions, ComposedResult, Tag, Tier};
pub use render::{render_template, RenderContext, Target};
pub use sync::merge::merge;
pub use sync::{SyncExecutor, WriteMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
