//! @acp:module "Fragment Cache"
//! @acp:summary "Read-through memoization of loaded template sets per resolved source list"
//! @acp:domain registry
//! @acp:layer cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::loader::load_fragment_sources;
use super::types::TemplateSets;
use crate::error::Result;

/// Process-lifetime cache of loader results.
///
/// The key is the full resolved directory list (built-in first), so two
/// calls with different extra directories never share an entry. Concurrent
/// misses on the same key may both load; the first insert wins and the
/// results are identical.
#[derive(Debug, Default)]
pub struct FragmentCache {
    entries: RwLock<HashMap<Vec<PathBuf>, Arc<TemplateSets>>>,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached sets for these directories, loading them on a miss
    pub fn load(&self, builtin_dir: &Path, extra_dirs: &[PathBuf]) -> Result<Arc<TemplateSets>> {
        let key = cache_key(builtin_dir, extra_dirs);

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = entries.get(&key) {
                tracing::debug!("Template cache hit ({} dirs)", key.len());
                return Ok(Arc::clone(hit));
            }
        }

        let sets = Arc::new(load_fragment_sources(builtin_dir, extra_dirs)?);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(entries.entry(key).or_insert(sets)))
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(builtin_dir: &Path, extra_dirs: &[PathBuf]) -> Vec<PathBuf> {
    std::iter::once(builtin_dir)
        .chain(extra_dirs.iter().map(PathBuf::as_path))
        .map(resolve)
        .collect()
}

fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}
