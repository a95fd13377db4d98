//! @acp:module "Fragment Composer"
//! @acp:summary "Select, deduplicate and order fragments for an active tag set"
//! @acp:domain registry
//! @acp:layer logic

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::types::*;
use crate::error::{ForgeError, Result};

/// Which copy survives when two sources define the same fragment id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverridePolicy {
    /// Keep the first-loaded fragment (built-in beats extra directories)
    #[default]
    FirstWins,
    /// A later fragment replaces the earlier one, keeping the earlier position
    LastWins,
}

/// Composition options layered on top of the tag set
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Maximum tier to include (inclusive)
    pub tier: Tier,
    /// Ids forced in regardless of tier
    pub include_ids: Vec<String>,
    /// Ids removed regardless of tier or include list
    pub exclude_ids: Vec<String>,
    pub policy: OverridePolicy,
    /// Cap per category; lower-priority tiers are dropped first
    pub max_per_category: Option<usize>,
}

impl ComposeOptions {
    pub fn with_tier(tier: Tier) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }
}

/// Deduplicated, tier-filtered, ordered fragments per category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedResult {
    tags: Vec<Tag>,
    sequences: BTreeMap<Category, Vec<Fragment>>,
}

impl ComposedResult {
    /// Effective tags in composition order (universal first)
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get(&self, category: Category) -> &[Fragment] {
        self.sequences
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn instructions(&self) -> &[Fragment] {
        self.get(Category::Instruction)
    }

    pub fn nfrs(&self) -> &[Fragment] {
        self.get(Category::Nfr)
    }

    pub fn references(&self) -> &[Fragment] {
        self.get(Category::Reference)
    }

    pub fn structure(&self) -> &[Fragment] {
        self.get(Category::Structure)
    }

    pub fn hooks(&self) -> &[Fragment] {
        self.get(Category::Hook)
    }

    pub fn skills(&self) -> &[Fragment] {
        self.get(Category::Skill)
    }

    pub fn mcp_servers(&self) -> &[Fragment] {
        self.get(Category::McpServer)
    }

    pub fn ids(&self, category: Category) -> Vec<&str> {
        self.get(category).iter().map(|f| f.id.as_str()).collect()
    }

    pub fn counts(&self) -> CategoryCounts {
        Category::all()
            .iter()
            .map(|c| (*c, self.get(*c).len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.sequences.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub(crate) fn sequence_mut(&mut self, category: Category) -> &mut Vec<Fragment> {
        self.sequences.entry(category).or_default()
    }
}

/// Universal first, then requested tags in order, without duplicates
pub fn effective_tags(tags: &[Tag]) -> Vec<Tag> {
    let mut result = vec![Tag::universal()];
    for tag in tags {
        if !result.contains(tag) {
            result.push(tag.clone());
        }
    }
    result
}

/// Compose fragments for `tags` out of the loaded `sets`.
///
/// Order: tag-request order (universal first), then source-load order within
/// a tag. A fragment is kept when its tier passes `options.tier` or its id is
/// in `include_ids`, and its id is not in `exclude_ids`.
pub fn compose(tags: &[Tag], sets: &TemplateSets, options: &ComposeOptions) -> Result<ComposedResult> {
    let tags = effective_tags(tags);

    // Universal is implicit and may legitimately have no templates
    if let Some(unknown) = tags.iter().find(|t| !t.is_universal() && !sets.contains(t)) {
        return Err(ForgeError::UnknownTag(unknown.to_string()));
    }

    let include: HashSet<&str> = options.include_ids.iter().map(String::as_str).collect();
    let exclude: HashSet<&str> = options.exclude_ids.iter().map(String::as_str).collect();

    let mut sequences = BTreeMap::new();
    for category in Category::all() {
        let mut sequence: Vec<Fragment> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        let candidates = tags
            .iter()
            .filter_map(|tag| sets.get(tag))
            .flat_map(|set| set.get(*category));

        for fragment in candidates {
            let id = fragment.id.as_str();
            if exclude.contains(id) {
                continue;
            }
            if !fragment.tier.within(options.tier) && !include.contains(id) {
                continue;
            }

            match positions.get(id) {
                None => {
                    positions.insert(fragment.id.clone(), sequence.len());
                    sequence.push(fragment.clone());
                }
                Some(&pos) => match options.policy {
                    OverridePolicy::FirstWins => {
                        tracing::debug!(
                            "Dropping duplicate {} fragment '{}' from {}",
                            category,
                            id,
                            short_path(&fragment.source)
                        );
                    }
                    OverridePolicy::LastWins => {
                        tracing::debug!(
                            "Overriding {} fragment '{}' with {}",
                            category,
                            id,
                            short_path(&fragment.source)
                        );
                        sequence[pos] = fragment.clone();
                    }
                },
            }
        }

        if let Some(max) = options.max_per_category {
            sequence = truncate_by_tier(sequence, max);
        }
        sequences.insert(*category, sequence);
    }

    Ok(ComposedResult { tags, sequences })
}

/// Keep at most `max` fragments, core first, then recommended, then
/// optional, preserving the relative order of the survivors.
fn truncate_by_tier(sequence: Vec<Fragment>, max: usize) -> Vec<Fragment> {
    if sequence.len() <= max {
        return sequence;
    }

    let mut ranked: Vec<(Tier, usize)> = sequence
        .iter()
        .enumerate()
        .map(|(pos, f)| (f.tier, pos))
        .collect();
    ranked.sort();

    let keep: HashSet<usize> = ranked.into_iter().take(max).map(|(_, pos)| pos).collect();
    sequence
        .into_iter()
        .enumerate()
        .filter(|(pos, _)| keep.contains(pos))
        .map(|(_, f)| f)
        .collect()
}
