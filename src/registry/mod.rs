//! @acp:module "Template Registry"
//! @acp:summary "Load, cache and compose tagged rule fragments"
//! @acp:domain registry
//! @acp:layer feature

pub mod cache;
pub mod composer;
pub mod discovery;
pub mod loader;
pub mod types;

pub use cache::FragmentCache;
pub use composer::{compose, effective_tags, ComposeOptions, ComposedResult, OverridePolicy};
pub use discovery::{apply_discovery, merge_discovered, IntegrationCatalog, JsonCatalog};
pub use loader::{load_fragment_file, load_fragment_sources, parse_fragments};
pub use types::*;
