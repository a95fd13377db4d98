//! @acp:module "Generate Command"
//! @acp:summary "Compose, render and write instruction files for AI assistants"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use super::pipeline::{Pipeline, Selection};
use crate::registry::{CategoryCounts, FragmentCache};
use crate::render::{
    detect_targets, render_bundle, unresolved_placeholders, BundleOptions, FileKind, Target,
};
use crate::sync::{FileAction, SyncExecutor, SyncResult, WriteMode};

/// Options for the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub selection: Selection,
    /// Target names; empty means configured targets, then detection
    pub targets: Vec<String>,
    pub force: bool,
    pub merge: bool,
    /// Print diffs instead of writing
    pub dry_run: bool,
    pub json: bool,
    pub no_skeletons: bool,
}

#[derive(Debug, Serialize)]
struct GenerateReport {
    tags: Vec<String>,
    targets: Vec<Target>,
    counts: CategoryCounts,
    dry_run: bool,
    files: Vec<SyncResult>,
}

/// Execute the generate command
pub fn execute_generate(options: GenerateOptions) -> Result<()> {
    let cache = FragmentCache::new();
    let pipeline = Pipeline::prepare(&options.selection, &cache)?;
    let composed = pipeline.compose()?;
    let ctx = pipeline.render_context();

    let targets = resolve_targets(&options, &pipeline)?;
    let bundle_options = BundleOptions {
        targets: targets.clone(),
        skeletons: if options.no_skeletons {
            Vec::new()
        } else {
            pipeline.config.skeletons.clone()
        },
    };
    let files = render_bundle(&composed, &ctx, &bundle_options)?;

    let executor = SyncExecutor::new(
        &pipeline.project_dir,
        WriteMode::from_flags(options.force, options.merge),
    );
    let plan = executor.plan(&files).context("Failed to prepare output files")?;

    let results = if options.dry_run {
        if !options.json {
            for planned in plan.iter().filter(|p| p.action.writes()) {
                print!("{}", planned.diff());
            }
        }
        plan.iter().map(SyncResult::from).collect()
    } else {
        executor.apply(&plan).context("Failed to write output files")?
    };

    if options.json {
        let report = GenerateReport {
            tags: composed.tags().iter().map(|t| t.to_string()).collect(),
            targets,
            counts: composed.counts(),
            dry_run: options.dry_run,
            files: results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let tags: Vec<String> = composed.tags().iter().map(|t| t.to_string()).collect();
    println!(
        "{} Composed {} fragments for {}",
        style("✓").green(),
        composed.total(),
        tags.join(", ")
    );
    for (category, count) in composed.counts() {
        if count > 0 {
            println!("  {:<28} {}", category.label(), count);
        }
    }
    println!();

    for result in &results {
        let marker = match result.action {
            FileAction::Created | FileAction::Overwritten | FileAction::Merged => {
                style("✓").green()
            }
            FileAction::Unchanged => style("=").dim(),
            FileAction::Skipped => style("-").yellow(),
        };
        let verb = if options.dry_run && result.action.writes() {
            format!("would be {}", result.action.as_str())
        } else {
            result.action.as_str().to_string()
        };
        println!("{} {} ({})", marker, result.path, verb);
    }

    let skipped = results
        .iter()
        .filter(|r| r.action == FileAction::Skipped)
        .count();
    if skipped > 0 && !options.force && !options.merge {
        println!(
            "\n{} {} existing files left alone; use --merge to keep custom sections or --force to overwrite",
            style("!").yellow(),
            skipped
        );
    }

    let documents = files
        .iter()
        .filter(|f| matches!(f.kind, FileKind::Markdown | FileKind::Skeleton));
    for file in documents {
        let unresolved = unresolved_placeholders(&file.content);
        if !unresolved.is_empty() {
            tracing::info!("{} leaves placeholders to fill in: {}", file.path, unresolved.join(", "));
        }
    }

    Ok(())
}

fn resolve_targets(options: &GenerateOptions, pipeline: &Pipeline) -> Result<Vec<Target>> {
    if !options.targets.is_empty() {
        return options
            .targets
            .iter()
            .map(|t| t.parse::<Target>().map_err(anyhow::Error::from))
            .collect();
    }
    if !pipeline.config.targets.is_empty() {
        return Ok(pipeline.config.targets.clone());
    }
    let detected = detect_targets(&pipeline.project_dir);
    tracing::debug!("Detected targets: {:?}", detected);
    Ok(detected)
}
