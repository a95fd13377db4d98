//! @acp:module "Errors"
//! @acp:summary "Error taxonomy for loading, composition, rendering and sync"
//! @acp:domain cli
//! @acp:layer types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the ruleforge library
#[derive(Debug, Error)]
pub enum ForgeError {
    /// A fragment source file could not be read or parsed
    #[error("failed to load templates from {}: {message}", path.display())]
    TemplateLoad { path: PathBuf, message: String },

    /// A requested tag has no loaded template set
    #[error("unknown tag '{0}': no templates loaded for it")]
    UnknownTag(String),

    /// An output target name did not match any known target
    #[error("unknown output target '{0}'")]
    UnknownTarget(String),

    /// A remote integration catalog returned an invalid response
    #[error("discovery source '{source_name}' failed: {message}")]
    Discovery {
        source_name: String,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ForgeError {
    pub(crate) fn template_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ForgeError::TemplateLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
