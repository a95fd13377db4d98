//! @acp:module "Registry Types"
//! @acp:summary "Tags, tiers, categories and fragments shared by loader, composer and renderer"
//! @acp:domain registry
//! @acp:layer types

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;

/// Classification label selecting which fragments apply to a project.
///
/// Tags are stored upper-case with `_` separators, so `api`, `Api` and
/// `API` name the same tag and `ml-pipeline` becomes `ML_PIPELINE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub const UNIVERSAL: &'static str = "UNIVERSAL";

    /// Create a tag from any spelling of its name
    pub fn new(name: &str) -> Self {
        Tag(
            name.trim()
                .chars()
                .map(|c| match c {
                    '-' | ' ' | '.' => '_',
                    c => c.to_ascii_uppercase(),
                })
                .collect(),
        )
    }

    /// The implicit tag that is always active
    pub fn universal() -> Self {
        Tag(Self::UNIVERSAL.to_string())
    }

    pub fn is_universal(&self) -> bool {
        self.0 == Self::UNIVERSAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name holding this tag's fragment files
    pub fn dir_name(&self) -> String {
        self.0.to_ascii_lowercase().replace('_', "-")
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::new(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl FromStr for Tag {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = Tag::new(s);
        if tag.0.is_empty() || !tag.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ForgeError::Config(format!("invalid tag name '{}'", s)));
        }
        Ok(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Importance of a fragment. Ordered `Core < Recommended < Optional`:
/// a fragment passes a tier filter when its tier is `<=` the maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    #[default]
    Recommended,
    Optional,
}

impl Tier {
    pub fn all() -> &'static [Tier] {
        &[Tier::Core, Tier::Recommended, Tier::Optional]
    }

    /// Whether a fragment of this tier is kept under `max`
    pub fn within(self, max: Tier) -> bool {
        self <= max
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Recommended => "recommended",
            Tier::Optional => "optional",
        }
    }
}

impl FromStr for Tier {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(Tier::Core),
            "recommended" | "default" => Ok(Tier::Recommended),
            "optional" | "all" => Ok(Tier::Optional),
            other => Err(ForgeError::Config(format!("unknown tier '{}'", other))),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output category a fragment contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Instruction,
    Nfr,
    Reference,
    Structure,
    Hook,
    Skill,
    McpServer,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Instruction,
            Category::Nfr,
            Category::Reference,
            Category::Structure,
            Category::Hook,
            Category::Skill,
            Category::McpServer,
        ]
    }

    /// File stem of the per-tag source file for this category
    pub fn file_stem(&self) -> &'static str {
        match self {
            Category::Instruction => "instructions",
            Category::Nfr => "nfr",
            Category::Reference => "references",
            Category::Structure => "structure",
            Category::Hook => "hooks",
            Category::Skill => "skills",
            Category::McpServer => "mcp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Instruction => "Instructions",
            Category::Nfr => "Non-Functional Requirements",
            Category::Reference => "References",
            Category::Structure => "Project Structure",
            Category::Hook => "Hooks",
            Category::Skill => "Skills",
            Category::McpServer => "MCP Servers",
        }
    }

    /// Structure entries and MCP servers are fully described by attributes
    pub fn requires_body(&self) -> bool {
        !matches!(self, Category::Structure | Category::McpServer)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Category-specific attributes carried alongside a fragment body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentAttributes {
    /// Structure entry path or hook script filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Hook event name (e.g. `PreToolUse`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Hook tool matcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,

    /// Skill description shown in the skill front matter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// MCP server launch command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Atomic unit of content, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub id: String,
    pub title: String,
    pub tier: Tier,
    pub body: String,
    pub tag: Tag,
    pub category: Category,
    #[serde(flatten)]
    pub attributes: FragmentAttributes,
    /// File the fragment was loaded from
    pub source: PathBuf,
}

/// All fragments owned by one tag, per category, in source-load order
#[derive(Debug, Clone, PartialEq)]
pub struct TagTemplateSet {
    pub tag: Tag,
    fragments: BTreeMap<Category, Vec<Fragment>>,
}

impl TagTemplateSet {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            fragments: BTreeMap::new(),
        }
    }

    pub fn get(&self, category: Category) -> &[Fragment] {
        self.fragments
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn extend(&mut self, category: Category, fragments: Vec<Fragment>) {
        self.fragments.entry(category).or_default().extend(fragments);
    }

    pub fn len(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> CategoryCounts {
        Category::all()
            .iter()
            .map(|c| (*c, self.get(*c).len()))
            .collect()
    }
}

/// Per-category fragment counts
pub type CategoryCounts = BTreeMap<Category, usize>;

/// Loader output: every tag's template set plus the directories read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSets {
    sets: BTreeMap<Tag, TagTemplateSet>,
    sources: Vec<PathBuf>,
}

impl TemplateSets {
    pub(crate) fn new(sources: Vec<PathBuf>) -> Self {
        Self {
            sets: BTreeMap::new(),
            sources,
        }
    }

    pub fn get(&self, tag: &Tag) -> Option<&TagTemplateSet> {
        self.sets.get(tag)
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.sets.contains_key(tag)
    }

    /// Loaded tags, sorted by name
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.sets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagTemplateSet> {
        self.sets.values()
    }

    /// Source directories in load order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub(crate) fn entry(&mut self, tag: Tag) -> &mut TagTemplateSet {
        self.sets
            .entry(tag.clone())
            .or_insert_with(|| TagTemplateSet::new(tag))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Display helper for source paths in log lines
pub(crate) fn short_path(path: &Path) -> String {
    let parts: Vec<_> = path.components().rev().take(3).collect();
    let mut rev: Vec<_> = parts
        .into_iter()
        .rev()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if rev.is_empty() {
        rev.push(path.display().to_string());
    }
    rev.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_normalization() {
        assert_eq!(Tag::new("api"), Tag::new("API"));
        assert_eq!(Tag::new("ml-pipeline").as_str(), "ML_PIPELINE");
        assert_eq!(Tag::new("ML_PIPELINE").dir_name(), "ml-pipeline");
        assert!(Tag::new("universal").is_universal());
    }

    #[test]
    fn test_tag_parse_rejects_garbage() {
        assert!("".parse::<Tag>().is_err());
        assert!("a/b".parse::<Tag>().is_err());
        assert_eq!("web-app".parse::<Tag>().unwrap().as_str(), "WEB_APP");
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Core < Tier::Recommended);
        assert!(Tier::Recommended < Tier::Optional);
        assert!(Tier::Core.within(Tier::Core));
        assert!(Tier::Recommended.within(Tier::Optional));
        assert!(!Tier::Optional.within(Tier::Recommended));
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("CORE".parse::<Tier>().unwrap(), Tier::Core);
        assert_eq!("all".parse::<Tier>().unwrap(), Tier::Optional);
        assert!("critical".parse::<Tier>().is_err());
    }

    #[test]
    fn test_category_file_stems_unique() {
        let mut stems: Vec<_> = Category::all().iter().map(|c| c.file_stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), Category::all().len());
    }

    #[test]
    fn test_empty_set_returns_empty_slices() {
        let set = TagTemplateSet::new(Tag::universal());
        assert!(set.get(Category::Hook).is_empty());
        assert!(set.is_empty());
        assert_eq!(set.counts().values().sum::<usize>(), 0);
    }
}
