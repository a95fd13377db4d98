//! @acp:module "Render Context"
//! @acp:summary "Substitution values supplied per render call"
//! @acp:domain render
//! @acp:layer types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;
use crate::registry::Tag;

/// Detected project language (closed set supplied by project introspection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
    Java,
    #[default]
    Unknown,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::TypeScript,
            Language::JavaScript,
            Language::Python,
            Language::Rust,
            Language::Go,
            Language::Java,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::Go => "Go",
            Language::Java => "Java",
            Language::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Language::Unknown
    }
}

impl FromStr for Language {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "typescript" | "ts" => Ok(Language::TypeScript),
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            "rust" | "rs" => Ok(Language::Rust),
            "go" | "golang" => Ok(Language::Go),
            "java" => Ok(Language::Java),
            "unknown" | "" => Ok(Language::Unknown),
            _ => Err(ForgeError::Config(format!("unknown language '{}'", s))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Flat record of substitution values. Never mutated by rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderContext {
    pub project_name: String,
    pub language: Language,
    pub tags: Vec<Tag>,
    pub framework: Option<String>,
    pub domain: Option<String>,
    pub sensitive_data: Option<bool>,
    /// ISO date used by skeleton documents
    pub date: Option<String>,
    /// Arbitrary overrides; these shadow the built-in fields
    pub variables: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new(project_name: impl Into<String>, language: Language) -> Self {
        Self {
            project_name: project_name.into(),
            language,
            date: Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_sensitive_data(mut self, sensitive: bool) -> Self {
        self.sensitive_data = Some(sensitive);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Tags as a space-joined list of bracketed names: `` `[API]` `[WEB]` ``
    pub fn tags_display(&self) -> String {
        self.tags
            .iter()
            .map(|t| format!("`[{}]`", t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolve a placeholder name. `projectName`, `project-name`,
    /// `project_name` and `PROJECT_NAME` all resolve to the same field.
    pub fn lookup(&self, name: &str) -> Option<String> {
        let key = normalize_key(name);

        if let Some(value) = self
            .variables
            .iter()
            .find(|(k, _)| normalize_key(k) == key)
            .map(|(_, v)| v.clone())
        {
            return Some(value);
        }

        match key.as_str() {
            "projectname" | "project" | "name" => {
                Some(self.project_name.clone()).filter(|n| !n.is_empty())
            }
            "language" | "lang" => self
                .language
                .is_known()
                .then(|| self.language.display_name().to_string()),
            "tags" => (!self.tags.is_empty()).then(|| self.tags_display()),
            "framework" => self.framework.clone(),
            "domain" => self.domain.clone(),
            "sensitivedata" | "hassensitivedata" => self.sensitive_data.map(|s| s.to_string()),
            "date" => self.date.clone(),
            _ => None,
        }
    }
}

/// Case-insensitive key with word separators removed
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::new("Foo", Language::Rust)
            .with_tags(vec![Tag::new("api"), Tag::new("web")])
            .with_framework("axum")
    }

    #[test]
    fn test_alternate_spellings_resolve() {
        let ctx = ctx();
        for name in ["projectName", "project-name", "project_name", "PROJECT_NAME"] {
            assert_eq!(ctx.lookup(name).as_deref(), Some("Foo"), "{name}");
        }
    }

    #[test]
    fn test_tags_render_bracketed() {
        assert_eq!(ctx().lookup("tags").as_deref(), Some("`[API]` `[WEB]`"));
    }

    #[test]
    fn test_missing_optional_fields_unresolved() {
        let ctx = RenderContext::new("Foo", Language::Unknown);
        assert_eq!(ctx.lookup("framework"), None);
        assert_eq!(ctx.lookup("language"), None);
        assert_eq!(ctx.lookup("sensitiveData"), None);
        assert_eq!(ctx.lookup("tags"), None);
    }

    #[test]
    fn test_variables_shadow_fields() {
        let ctx = ctx().with_variable("project-name", "Bar").with_variable("team", "core");
        assert_eq!(ctx.lookup("projectName").as_deref(), Some("Bar"));
        assert_eq!(ctx.lookup("TEAM").as_deref(), Some("core"));
    }

    #[test]
    fn test_language_parse_aliases() {
        assert_eq!("TS".parse::<Language>().unwrap(), Language::TypeScript);
        assert_eq!("golang".parse::<Language>().unwrap(), Language::Go);
        assert!("cobol".parse::<Language>().is_err());
    }
}
