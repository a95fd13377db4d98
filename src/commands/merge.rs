//! @acp:module "Merge Command"
//! @acp:summary "Merge a regenerated instruction file with an existing one"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::sync::merge::{custom_sections, merge};

/// Options for the merge command
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub existing: PathBuf,
    pub generated: PathBuf,
    /// Write here instead of stdout
    pub output: Option<PathBuf>,
}

/// Execute the merge command
pub fn execute_merge(options: MergeOptions) -> Result<()> {
    let existing = std::fs::read_to_string(&options.existing)
        .with_context(|| format!("Failed to read {}", options.existing.display()))?;
    let generated = std::fs::read_to_string(&options.generated)
        .with_context(|| format!("Failed to read {}", options.generated.display()))?;

    let preserved = custom_sections(&existing, &generated).len();
    let merged = merge(&existing, &generated);

    match options.output {
        Some(path) => {
            std::fs::write(&path, &merged)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} ({} custom sections preserved)",
                style("✓").green(),
                path.display(),
                preserved
            );
        }
        None => print!("{}", merged),
    }
    Ok(())
}
