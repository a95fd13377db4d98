//! @acp:module "Command Pipeline"
//! @acp:summary "Shared load → compose → context steps for CLI commands"
//! @acp:domain cli
//! @acp:layer handler

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::registry::{
    apply_discovery, compose, ComposeOptions, ComposedResult, FragmentCache, IntegrationCatalog,
    JsonCatalog, OverridePolicy, Tag, TemplateSets, Tier,
};
use crate::render::{Language, RenderContext};

/// Tag/tier/source selection shared by commands that compose
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub project_dir: PathBuf,
    /// Overrides configured tags when non-empty
    pub tags: Vec<String>,
    pub tier: Option<Tier>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub policy: Option<OverridePolicy>,
    /// Replaces the built-in template directory
    pub templates: Option<PathBuf>,
    /// Appended after configured extra directories
    pub extra_dirs: Vec<PathBuf>,
    pub max_per_category: Option<usize>,
}

/// Everything a command needs after configuration and loading
pub struct Pipeline {
    pub project_dir: PathBuf,
    pub config: Config,
    pub sets: Arc<TemplateSets>,
    pub tags: Vec<Tag>,
    pub options: ComposeOptions,
}

impl Pipeline {
    /// Layer flags over `.ruleforge.json` and load template sources
    pub fn prepare(selection: &Selection, cache: &FragmentCache) -> Result<Self> {
        let project_dir = selection.project_dir.clone();
        let config = Config::load_from_project(&project_dir)
            .with_context(|| format!("Failed to load config in {}", project_dir.display()))?;

        let builtin = match &selection.templates {
            Some(dir) => dir.clone(),
            None => config.builtin_dir(&project_dir),
        };
        let mut extra = config.extra_dirs(&project_dir);
        extra.extend(selection.extra_dirs.iter().cloned());

        let sets = cache.load(&builtin, &extra)?;

        let tags = if selection.tags.is_empty() {
            config.parsed_tags()?
        } else {
            selection
                .tags
                .iter()
                .map(|t| t.parse::<Tag>())
                .collect::<crate::Result<Vec<_>>>()?
        };

        let mut options = config.compose_options();
        if let Some(tier) = selection.tier {
            options.tier = tier;
        }
        if let Some(policy) = selection.policy {
            options.policy = policy;
        }
        if selection.max_per_category.is_some() {
            options.max_per_category = selection.max_per_category;
        }
        options.include_ids.extend(selection.include.iter().cloned());
        options.exclude_ids.extend(selection.exclude.iter().cloned());

        Ok(Self {
            project_dir,
            config,
            sets,
            tags,
            options,
        })
    }

    /// Compose, then fold in configured integration catalogs
    pub fn compose(&self) -> Result<ComposedResult> {
        let mut composed = compose(&self.tags, &self.sets, &self.options)?;

        let catalogs: Vec<JsonCatalog> = self
            .config
            .catalog_paths(&self.project_dir)
            .into_iter()
            .map(JsonCatalog::new)
            .collect();
        let catalog_refs: Vec<&dyn IntegrationCatalog> =
            catalogs.iter().map(|c| c as &dyn IntegrationCatalog).collect();
        apply_discovery(&mut composed, &catalog_refs);

        Ok(composed)
    }

    /// Render context from config, falling back to project markers
    pub fn render_context(&self) -> RenderContext {
        let project = &self.config.project;
        let name = project
            .name
            .clone()
            .unwrap_or_else(|| project_name(&self.project_dir));
        let language = project
            .language
            .unwrap_or_else(|| detect_language(&self.project_dir));

        let mut ctx = RenderContext::new(name, language)
            .with_tags(self.tags.clone())
            .with_sensitive_data(self.config.sensitive_data(&self.tags));
        if let Some(framework) = &project.framework {
            ctx = ctx.with_framework(framework.clone());
        }
        if let Some(domain) = &project.domain {
            ctx = ctx.with_domain(domain.clone());
        }
        for (key, value) in &self.config.variables {
            ctx = ctx.with_variable(key.clone(), value.clone());
        }
        ctx
    }
}

/// Directory name of the project, canonicalized so `.` works
pub fn project_name(project_dir: &Path) -> String {
    project_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "project".to_string())
}

/// Guess the language from well-known manifest files
pub fn detect_language(project_dir: &Path) -> Language {
    let has = |name: &str| project_dir.join(name).exists();
    if has("Cargo.toml") {
        Language::Rust
    } else if has("tsconfig.json") {
        Language::TypeScript
    } else if has("package.json") {
        Language::JavaScript
    } else if has("pyproject.toml") || has("requirements.txt") || has("setup.py") {
        Language::Python
    } else if has("go.mod") {
        Language::Go
    } else if has("pom.xml") || has("build.gradle") || has("build.gradle.kts") {
        Language::Java
    } else {
        Language::Unknown
    }
}

/// Parse `key=value` pairs from the command line
pub fn parse_variables(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .with_context(|| format!("Invalid variable '{}', expected key=value", pair))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_language() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_language(temp.path()), Language::Unknown);
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();
        assert_eq!(detect_language(temp.path()), Language::JavaScript);
        std::fs::write(temp.path().join("tsconfig.json"), "{}").unwrap();
        assert_eq!(detect_language(temp.path()), Language::TypeScript);
    }

    #[test]
    fn test_parse_variables() {
        let vars = parse_variables(&["team=core".to_string(), "url=a=b".to_string()]).unwrap();
        assert_eq!(vars[1], ("url".to_string(), "a=b".to_string()));
        assert!(parse_variables(&["nope".to_string()]).is_err());
        assert!(parse_variables(&["=x".to_string()]).is_err());
    }
}
