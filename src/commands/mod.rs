//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is in its own submodule and exposes an `execute_*` function
//! taking an options struct.

pub mod compose;
pub mod generate;
pub mod merge;
pub mod pipeline;
pub mod render;
pub mod tags;
pub mod targets;

pub use compose::{execute_compose, ComposeCommandOptions};
pub use generate::{execute_generate, GenerateOptions};
pub use merge::{execute_merge, MergeOptions};
pub use pipeline::{Pipeline, Selection};
pub use render::{execute_render, RenderOptions};
pub use tags::{execute_tags, TagsOptions};
pub use targets::{execute_targets, TargetsOptions};
