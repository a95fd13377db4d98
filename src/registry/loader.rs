//! @acp:module "Fragment Loader"
//! @acp:summary "Load tagged fragment files from built-in and additive source directories"
//! @acp:domain registry
//! @acp:layer io
//!
//! Source layout: `<source>/<tag-dir>/<category>.yaml`. The built-in directory
//! is read first, then each extra directory in the order supplied. Fragments
//! for the same tag and category are concatenated across sources; identifier
//! deduplication is left to the composer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;
use walkdir::WalkDir;

use super::types::*;
use crate::error::{ForgeError, Result};

/// On-disk shape of one `<category>.yaml` file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FragmentFile {
    #[serde(default)]
    fragments: Vec<FragmentEntry>,
}

#[derive(Debug, Deserialize)]
struct FragmentEntry {
    id: String,
    title: String,
    #[serde(default)]
    tier: Tier,
    #[serde(default)]
    body: Option<String>,
    #[serde(flatten)]
    attributes: FragmentAttributes,
}

/// One file scheduled for parsing
#[derive(Debug)]
struct LoadJob {
    tag: Tag,
    category: Category,
    path: PathBuf,
}

/// Load fragment sets from the built-in directory followed by `extra_dirs`.
///
/// A missing built-in directory is an error; a missing extra directory is
/// skipped with a warning so optional user directories can be listed
/// unconditionally.
pub fn load_fragment_sources(builtin_dir: &Path, extra_dirs: &[PathBuf]) -> Result<TemplateSets> {
    if !builtin_dir.is_dir() {
        return Err(ForgeError::template_load(
            builtin_dir,
            "built-in template directory does not exist",
        ));
    }

    let mut sources = vec![builtin_dir.to_path_buf()];
    for dir in extra_dirs {
        if dir.is_dir() {
            sources.push(dir.clone());
        } else {
            tracing::warn!("Skipping missing template directory: {}", dir.display());
        }
    }

    let jobs: Vec<LoadJob> = sources
        .iter()
        .map(|source| plan_source(source))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    // Parse in parallel; collect preserves job order, which is source order
    let parsed: Vec<(Tag, Category, Vec<Fragment>)> = jobs
        .par_iter()
        .map(|job| {
            let fragments = load_fragment_file(&job.path, &job.tag, job.category)?;
            Ok((job.tag.clone(), job.category, fragments))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sets = TemplateSets::new(sources);
    for (tag, category, fragments) in parsed {
        sets.entry(tag).extend(category, fragments);
    }

    tracing::debug!(
        "Loaded {} tags from {} source(s)",
        sets.len(),
        sets.sources().len()
    );
    Ok(sets)
}

/// List the fragment files of one source directory in deterministic order
fn plan_source(source: &Path) -> Result<Vec<LoadJob>> {
    tracing::debug!("Scanning template source {}", source.display());

    let mut tag_dirs: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ForgeError::template_load(source, e.to_string()))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_dir() && !hidden {
            tag_dirs.push(entry.into_path());
        }
    }
    tag_dirs.sort();

    let mut jobs = Vec::new();
    for dir in tag_dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tag: Tag = name
            .parse()
            .map_err(|_| ForgeError::template_load(&dir, format!("invalid tag directory '{}'", name)))?;

        for category in Category::all() {
            if let Some(path) = category_file(&dir, *category)? {
                jobs.push(LoadJob {
                    tag: tag.clone(),
                    category: *category,
                    path,
                });
            }
        }
    }
    Ok(jobs)
}

/// The `.yaml` or `.yml` file for a category; having both is an error
fn category_file(tag_dir: &Path, category: Category) -> Result<Option<PathBuf>> {
    let mut found = ["yaml", "yml"]
        .iter()
        .map(|ext| tag_dir.join(format!("{}.{}", category.file_stem(), ext)))
        .filter(|p| p.is_file());

    match (found.next(), found.next()) {
        (Some(yaml), Some(_)) => Err(ForgeError::template_load(
            yaml,
            format!(
                "both {0}.yaml and {0}.yml exist; keep one",
                category.file_stem()
            ),
        )),
        (path, _) => Ok(path),
    }
}

/// Parse and validate a single fragment file
pub fn load_fragment_file(path: &Path, tag: &Tag, category: Category) -> Result<Vec<Fragment>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ForgeError::template_load(path, e.to_string()))?;
    let fragments = parse_fragments(&content, path, tag, category)?;
    tracing::debug!(
        "Read {} {} fragment(s) for {} from {}",
        fragments.len(),
        category,
        tag,
        short_path(path)
    );
    Ok(fragments)
}

/// Parse fragment YAML; `path` is only used for error reporting and provenance
pub fn parse_fragments(
    content: &str,
    path: &Path,
    tag: &Tag,
    category: Category,
) -> Result<Vec<Fragment>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let file: FragmentFile = serde_yaml::from_str(content)
        .map_err(|e| ForgeError::template_load(path, e.to_string()))?;

    let mut seen = HashSet::new();
    let mut fragments = Vec::with_capacity(file.fragments.len());

    for entry in file.fragments {
        let fragment = validate_entry(entry, path, tag, category)?;
        if !seen.insert(fragment.id.clone()) {
            return Err(ForgeError::template_load(
                path,
                format!("duplicate fragment id '{}'", fragment.id),
            ));
        }
        fragments.push(fragment);
    }

    Ok(fragments)
}

fn validate_entry(
    entry: FragmentEntry,
    path: &Path,
    tag: &Tag,
    category: Category,
) -> Result<Fragment> {
    let id = entry.id.trim().to_string();
    if id.is_empty() {
        return Err(ForgeError::template_load(path, "fragment with empty id"));
    }
    let title = entry.title.trim().to_string();
    if title.is_empty() {
        return Err(ForgeError::template_load(
            path,
            format!("fragment '{}' has an empty title", id),
        ));
    }

    let body = entry.body.unwrap_or_default();
    if category.requires_body() && body.trim().is_empty() {
        return Err(ForgeError::template_load(
            path,
            format!("fragment '{}' has no body", id),
        ));
    }

    let mut attributes = entry.attributes;
    match category {
        Category::Structure if attributes.path.is_none() => {
            return Err(ForgeError::template_load(
                path,
                format!("structure entry '{}' is missing 'path'", id),
            ));
        }
        Category::McpServer if attributes.command.is_none() => {
            return Err(ForgeError::template_load(
                path,
                format!("MCP server '{}' is missing 'command'", id),
            ));
        }
        Category::Hook if attributes.path.is_none() => {
            attributes.path = Some(format!("{}.sh", id));
        }
        _ => {}
    }

    Ok(Fragment {
        id,
        title,
        tier: entry.tier,
        body,
        tag: tag.clone(),
        category,
        attributes,
        source: path.to_path_buf(),
    })
}
