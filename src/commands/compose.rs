//! @acp:module "Compose Command"
//! @acp:summary "Show which fragments a tag set selects, per category"
//! @acp:domain cli
//! @acp:layer handler

use std::collections::BTreeMap;

use anyhow::Result;
use console::style;
use serde::Serialize;

use super::pipeline::{Pipeline, Selection};
use crate::registry::{Category, CategoryCounts, FragmentCache, Tier};
use crate::render::{render_fragments, render_instruction_document, Target};

/// Options for the compose command
#[derive(Debug, Clone, Default)]
pub struct ComposeCommandOptions {
    pub selection: Selection,
    pub json: bool,
    /// Print the rendered instruction document for this target instead
    pub render: Option<String>,
    /// Restrict output to one category
    pub category: Option<Category>,
}

#[derive(Debug, Serialize)]
struct ComposeReport {
    tags: Vec<String>,
    tier: Tier,
    counts: CategoryCounts,
    total: usize,
    fragments: BTreeMap<Category, Vec<FragmentSummary>>,
}

#[derive(Debug, Serialize)]
struct FragmentSummary {
    id: String,
    title: String,
    tag: String,
    tier: Tier,
}

/// Execute the compose command
pub fn execute_compose(options: ComposeCommandOptions) -> Result<()> {
    let cache = FragmentCache::new();
    let pipeline = Pipeline::prepare(&options.selection, &cache)?;
    let composed = pipeline.compose()?;

    if let Some(target) = &options.render {
        let target: Target = target.parse()?;
        let ctx = pipeline.render_context();
        let text = match options.category {
            Some(category) => render_fragments(composed.get(category), &ctx, Some(target)),
            None => render_instruction_document(&composed, &ctx, target),
        };
        print!("{}", text);
        return Ok(());
    }

    let categories: Vec<Category> = match options.category {
        Some(category) => vec![category],
        None => Category::all().to_vec(),
    };

    if options.json {
        let fragments = categories
            .iter()
            .map(|category| {
                let summaries = composed
                    .get(*category)
                    .iter()
                    .map(|f| FragmentSummary {
                        id: f.id.clone(),
                        title: f.title.clone(),
                        tag: f.tag.to_string(),
                        tier: f.tier,
                    })
                    .collect();
                (*category, summaries)
            })
            .collect();
        let report = ComposeReport {
            tags: composed.tags().iter().map(|t| t.to_string()).collect(),
            tier: pipeline.options.tier,
            counts: composed.counts(),
            total: composed.total(),
            fragments,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let tags: Vec<String> = composed.tags().iter().map(|t| t.to_string()).collect();
    println!(
        "{} {} (tier: {})\n",
        style("Tags:").bold(),
        tags.join(", "),
        pipeline.options.tier
    );

    for category in categories {
        let fragments = composed.get(category);
        if fragments.is_empty() {
            continue;
        }
        println!("{} ({})", style(category.label()).bold(), fragments.len());
        for fragment in fragments {
            println!(
                "  {:<32} {:<12} {}",
                fragment.id,
                style(fragment.tier).dim(),
                fragment.tag
            );
        }
        println!();
    }

    println!("{} {} fragments", style("Total:").bold(), composed.total());
    Ok(())
}
