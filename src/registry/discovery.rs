//! @acp:module "Integration Discovery"
//! @acp:summary "Merge MCP integration entries from external catalogs, local entries first"
//! @acp:domain registry
//! @acp:layer service
//!
//! Catalogs are external collaborators. A failing or invalid catalog never
//! fails composition: it is logged and the result degrades to local entries.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::composer::ComposedResult;
use super::types::*;
use crate::error::{ForgeError, Result};

/// Upper bound a catalog may spend fetching entries
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Source of additional MCP server entries
pub trait IntegrationCatalog {
    /// Name used in log lines and errors
    fn name(&self) -> &str;

    /// Fetch entries, giving up after `timeout`
    fn fetch(&self, timeout: Duration) -> Result<Vec<Fragment>>;
}

/// Catalog backed by a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    servers: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn discovery_error(&self, message: impl Into<String>) -> ForgeError {
        ForgeError::Discovery {
            source_name: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

impl IntegrationCatalog for JsonCatalog {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("catalog")
    }

    fn fetch(&self, _timeout: Duration) -> Result<Vec<Fragment>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| self.discovery_error(e.to_string()))?;
        let doc: CatalogDocument =
            serde_json::from_str(&content).map_err(|e| self.discovery_error(e.to_string()))?;

        doc.servers
            .into_iter()
            .map(|entry| {
                if entry.id.trim().is_empty() || entry.command.trim().is_empty() {
                    return Err(self.discovery_error("catalog entry without id or command"));
                }
                Ok(catalog_fragment(entry, &self.path))
            })
            .collect()
    }
}

fn catalog_fragment(entry: CatalogEntry, source: &Path) -> Fragment {
    Fragment {
        title: entry.title.unwrap_or_else(|| entry.id.clone()),
        id: entry.id,
        tier: Tier::Optional,
        body: String::new(),
        tag: Tag::universal(),
        category: Category::McpServer,
        attributes: FragmentAttributes {
            description: entry.description,
            command: Some(entry.command),
            args: entry.args,
            env: entry.env,
            ..Default::default()
        },
        source: source.to_path_buf(),
    }
}

/// Local entries first, then each catalog's new ids in catalog order.
///
/// Local curation is trusted over remote input, so a remote entry never
/// replaces a local one with the same id.
pub fn merge_discovered(local: &[Fragment], catalogs: &[&dyn IntegrationCatalog]) -> Vec<Fragment> {
    let mut merged: Vec<Fragment> = local.to_vec();
    let mut seen: HashSet<String> = local.iter().map(|f| f.id.clone()).collect();

    for catalog in catalogs {
        let fetched = match catalog.fetch(DISCOVERY_TIMEOUT) {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Integration catalog '{}' unavailable: {}", catalog.name(), e);
                continue;
            }
        };

        let mut added = 0usize;
        for fragment in fetched {
            if fragment.category != Category::McpServer {
                tracing::warn!(
                    "Ignoring non-integration entry '{}' from catalog '{}'",
                    fragment.id,
                    catalog.name()
                );
                continue;
            }
            if seen.insert(fragment.id.clone()) {
                merged.push(fragment);
                added += 1;
            }
        }
        tracing::debug!("Catalog '{}' contributed {} entries", catalog.name(), added);
    }

    merged
}

/// Fold catalog entries into a composed result's MCP server sequence
pub fn apply_discovery(result: &mut ComposedResult, catalogs: &[&dyn IntegrationCatalog]) {
    if catalogs.is_empty() {
        return;
    }
    let merged = merge_discovered(result.mcp_servers(), catalogs);
    *result.sequence_mut(Category::McpServer) = merged;
}
