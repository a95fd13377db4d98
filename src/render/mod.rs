//! @acp:module "Renderer"
//! @acp:summary "Template substitution, conditional blocks and target serialization"
//! @acp:domain render
//! @acp:layer feature
//!
//! Rendering never fails for well-formed input. An unresolved placeholder
//! is passed through verbatim as a signal that something needs filling in.

pub mod bundle;
pub mod condition;
pub mod context;
pub mod document;
pub mod target;
pub mod template;

pub use bundle::{render_bundle, BundleOptions, FileKind, RenderedFile};
pub use condition::{evaluate_predicate, parse_predicate, Predicate};
pub use context::{normalize_key, Language, RenderContext};
pub use document::{render_fragments, render_instruction_document, Skeleton, GENERATED_MARKER};
pub use target::{detect_targets, OutputFormat, Target, TargetConfig};
pub use template::{render_template, unresolved_placeholders};
