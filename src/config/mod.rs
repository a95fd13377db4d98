//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults (.ruleforge.json)"
//! @acp:domain cli
//! @acp:layer config
//!
//! Precedence is command-line flags, then `.ruleforge.json`, then the
//! defaults below. Relative paths in the file resolve against the project
//! directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ForgeError, Result};
use crate::registry::{ComposeOptions, OverridePolicy, Tag, Tier};
use crate::render::{Language, Skeleton, Target};

/// Config file name, looked up in the project directory
pub const CONFIG_FILE: &str = ".ruleforge.json";

fn default_true() -> bool {
    true
}

fn default_sensitive_tags() -> Vec<String> {
    ["HEALTHCARE", "FINTECH", "PII", "HIPAA", "GDPR", "PCI"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_skeletons() -> Vec<Skeleton> {
    Skeleton::all().to_vec()
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Project facts normally supplied by introspection
    #[serde(default)]
    pub project: ProjectConfig,

    /// Active tags (universal is implied)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Maximum tier to include
    #[serde(default)]
    pub tier: Tier,

    /// Output targets; empty means detect from the project
    #[serde(default)]
    pub targets: Vec<Target>,

    /// Fragment ids forced in regardless of tier
    #[serde(default)]
    pub include: Vec<String>,

    /// Fragment ids always removed
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub override_policy: OverridePolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_category: Option<usize>,

    /// Extra render variables; these shadow built-in context fields
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// Tags that imply the project handles sensitive data
    #[serde(default = "default_sensitive_tags")]
    pub sensitive_tags: Vec<String>,

    /// Skeleton documents written by `generate`
    #[serde(default = "default_skeletons")]
    pub skeletons: Vec<Skeleton>,

    /// JSON integration catalogs merged after local MCP entries
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates: TemplatesConfig::default(),
            project: ProjectConfig::default(),
            tags: Vec::new(),
            tier: Tier::default(),
            targets: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            override_policy: OverridePolicy::default(),
            max_per_category: None,
            variables: BTreeMap::new(),
            sensitive_tags: default_sensitive_tags(),
            skeletons: default_skeletons(),
            catalogs: Vec::new(),
        }
    }
}

/// Template source directories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesConfig {
    /// Replaces the bundled template directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_dir: Option<PathBuf>,

    /// Additive directories, loaded after the built-in one in this order
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,

    /// Also load `~/.config/ruleforge/templates` when it exists
    #[serde(default = "default_true")]
    pub user_dir: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            builtin_dir: None,
            extra_dirs: Vec::new(),
            user_dir: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Explicit flag; otherwise derived from `sensitiveTags`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_data: Option<bool>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `<project_dir>/.ruleforge.json`, or defaults when it is absent
    pub fn load_from_project(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, project_dir.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Like `load_from_project`, but an unreadable file falls back to defaults
    pub fn load_or_default(project_dir: &Path) -> Self {
        Self::load_from_project(project_dir).unwrap_or_else(|e| {
            tracing::warn!("Ignoring config: {}", e);
            Self::default()
        })
    }

    /// Parse configured tag names
    pub fn parsed_tags(&self) -> Result<Vec<Tag>> {
        self.tags.iter().map(|t| t.parse()).collect()
    }

    /// Built-in directory, resolved against the project directory
    pub fn builtin_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.templates.builtin_dir {
            Some(dir) => resolve(project_dir, dir),
            None => default_builtin_dir(),
        }
    }

    /// Extra directories in load order, user directory last
    pub fn extra_dirs(&self, project_dir: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .templates
            .extra_dirs
            .iter()
            .map(|d| resolve(project_dir, d))
            .collect();
        if self.templates.user_dir {
            if let Some(user) = user_template_dir().filter(|d| d.is_dir()) {
                dirs.push(user);
            }
        }
        dirs
    }

    pub fn catalog_paths(&self, project_dir: &Path) -> Vec<PathBuf> {
        self.catalogs.iter().map(|c| resolve(project_dir, c)).collect()
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            tier: self.tier,
            include_ids: self.include.clone(),
            exclude_ids: self.exclude.clone(),
            policy: self.override_policy,
            max_per_category: self.max_per_category,
        }
    }

    /// Whether any active tag implies sensitive data, unless set explicitly
    pub fn sensitive_data(&self, tags: &[Tag]) -> bool {
        if let Some(explicit) = self.project.sensitive_data {
            return explicit;
        }
        let sensitive: Vec<Tag> = self.sensitive_tags.iter().map(|t| Tag::new(t)).collect();
        tags.iter().any(|t| sensitive.contains(t))
    }
}

/// Templates shipped with the crate
pub fn default_builtin_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// `~/.config/ruleforge/templates`
pub fn user_template_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("ruleforge").join("templates"))
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from_project(temp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.templates.user_dir);
        assert_eq!(config.skeletons.len(), 3);
    }

    #[test]
    fn test_load_camel_case_fields() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{
                "templates": {"extraDirs": ["team-rules"], "userDir": false},
                "project": {"name": "Foo", "language": "rust"},
                "tags": ["api", "fintech"],
                "tier": "core",
                "targets": ["claude-code", "cursor"],
                "overridePolicy": "last-wins",
                "maxPerCategory": 5
            }"#,
        )
        .unwrap();

        let config = Config::load_from_project(temp.path()).unwrap();
        assert_eq!(config.tier, Tier::Core);
        assert_eq!(config.targets, vec![Target::ClaudeCode, Target::Cursor]);
        assert_eq!(config.override_policy, OverridePolicy::LastWins);
        assert_eq!(config.project.language, Some(Language::Rust));
        assert_eq!(
            config.extra_dirs(temp.path()),
            vec![temp.path().join("team-rules")]
        );

        let tags = config.parsed_tags().unwrap();
        assert_eq!(tags, vec![Tag::new("API"), Tag::new("FINTECH")]);
        assert!(config.sensitive_data(&tags));
        assert_eq!(config.compose_options().max_per_category, Some(5));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), r#"{"tier": "everything"}"#).unwrap();
        assert!(matches!(
            Config::load_from_project(temp.path()),
            Err(ForgeError::Config(_))
        ));
        assert_eq!(Config::load_or_default(temp.path()), Config::default());
    }

    #[test]
    fn test_save_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.tags = vec!["WEB".to_string()];
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_explicit_sensitive_flag_wins() {
        let mut config = Config::default();
        assert!(!config.sensitive_data(&[Tag::new("api")]));
        assert!(config.sensitive_data(&[Tag::new("pii")]));
        config.project.sensitive_data = Some(false);
        assert!(!config.sensitive_data(&[Tag::new("pii")]));
    }
}
