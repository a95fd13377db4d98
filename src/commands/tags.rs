//! @acp:module "Tags Command"
//! @acp:summary "List loaded tags with fragment counts per category"
//! @acp:domain cli
//! @acp:layer handler

use std::collections::BTreeMap;

use anyhow::Result;
use console::style;
use serde::Serialize;

use super::pipeline::{Pipeline, Selection};
use crate::registry::{Category, CategoryCounts, FragmentCache};

/// Options for the tags command
#[derive(Debug, Clone, Default)]
pub struct TagsOptions {
    pub selection: Selection,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TagsReport {
    sources: Vec<String>,
    tags: BTreeMap<String, CategoryCounts>,
}

/// Execute the tags command
pub fn execute_tags(options: TagsOptions) -> Result<()> {
    let cache = FragmentCache::new();
    let pipeline = Pipeline::prepare(&options.selection, &cache)?;
    let sets = &pipeline.sets;

    if options.json {
        let report = TagsReport {
            sources: sets.sources().iter().map(|p| p.display().to_string()).collect(),
            tags: sets
                .iter()
                .map(|set| (set.tag.to_string(), set.counts()))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", style("Template sources:").bold());
    for source in sets.sources() {
        println!("  {}", source.display());
    }
    println!();

    println!("{} ({})", style("Tags:").bold(), sets.len());
    for set in sets.iter() {
        let active = set.tag.is_universal() || pipeline.tags.contains(&set.tag);
        let marker = if active {
            style("●").green()
        } else {
            style("○").dim()
        };
        let counts: Vec<String> = Category::all()
            .iter()
            .map(|c| (c, set.get(*c).len()))
            .filter(|(_, n)| *n > 0)
            .map(|(c, n)| format!("{} {}", n, c))
            .collect();
        println!("  {} {:<20} {}", marker, set.tag, counts.join(", "));
    }
    Ok(())
}
