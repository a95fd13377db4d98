//! @acp:module "Targets Command"
//! @acp:summary "List supported AI assistant targets"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::render::Target;

/// Options for the targets command
#[derive(Debug, Clone)]
pub struct TargetsOptions {
    pub project_dir: PathBuf,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TargetInfo {
    id: &'static str,
    name: &'static str,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mcp_config: Option<&'static str>,
    hooks: bool,
    detected: bool,
}

/// Execute the targets command
pub fn execute_targets(options: TargetsOptions) -> Result<()> {
    let targets: Vec<TargetInfo> = Target::all()
        .iter()
        .map(|t| TargetInfo {
            id: t.id(),
            name: t.name(),
            path: t.output_path(),
            mcp_config: t.mcp_config_path(),
            hooks: t.supports_hooks(),
            detected: t.detect(&options.project_dir),
        })
        .collect();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    println!("{}\n", style("Output targets:").bold());
    for info in &targets {
        let marker = if info.detected {
            style("✓").green()
        } else {
            style(" ").dim()
        };
        let mut extras = Vec::new();
        if let Some(mcp) = info.mcp_config {
            extras.push(format!("mcp: {}", mcp));
        }
        if info.hooks {
            extras.push("hooks, skills".to_string());
        }
        println!(
            "  {} {:<12} {:<34} {}",
            marker,
            info.id,
            info.path,
            style(extras.join("; ")).dim()
        );
    }
    println!("\n{} = already in use in this project", style("✓").green());
    Ok(())
}
