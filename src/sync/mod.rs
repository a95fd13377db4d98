//! @acp:module "Output Sync"
//! @acp:summary "Write rendered bundles to a project directory"
//! @acp:domain sync
//! @acp:layer service
//!
//! Writing happens in two phases. `plan` reads every existing file and
//! computes the final content for all of them; only once every file has been
//! planned does `apply` touch the filesystem. A merge failure in one file
//! therefore leaves every other file untouched.
//!
//! ## Write modes
//!
//! - `CreateOnly`: write missing files, skip existing ones
//! - `Force`: overwrite existing files
//! - `Merge`: markdown through the section merge, JSON through the typed
//!   settings merge; existing hook scripts are left alone

pub mod merge;
pub mod settings;

use std::path::{Path, PathBuf};

use serde::Serialize;
use similar::TextDiff;

use crate::error::{ForgeError, Result};
use crate::render::{FileKind, RenderedFile};

/// How existing files are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    #[default]
    CreateOnly,
    Force,
    Merge,
}

impl WriteMode {
    pub fn from_flags(force: bool, merge: bool) -> Self {
        if merge {
            WriteMode::Merge
        } else if force {
            WriteMode::Force
        } else {
            WriteMode::CreateOnly
        }
    }
}

/// What happened (or would happen) to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileAction {
    Created,
    Overwritten,
    Merged,
    /// Final content equals what is already on disk
    Unchanged,
    /// Exists and the write mode leaves it alone
    Skipped,
}

impl FileAction {
    pub fn writes(&self) -> bool {
        matches!(self, FileAction::Created | FileAction::Overwritten | FileAction::Merged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Created => "created",
            FileAction::Overwritten => "overwritten",
            FileAction::Merged => "merged",
            FileAction::Unchanged => "unchanged",
            FileAction::Skipped => "skipped",
        }
    }
}

/// A file whose final content has been computed but not yet written
#[derive(Debug, Clone)]
pub struct PlannedWrite {
    /// Path relative to the project root
    pub relative: String,
    pub path: PathBuf,
    pub kind: FileKind,
    pub action: FileAction,
    pub previous: Option<String>,
    pub content: String,
}

impl PlannedWrite {
    /// Unified diff between the file on disk and the planned content
    pub fn diff(&self) -> String {
        let old = self.previous.as_deref().unwrap_or("");
        let a = format!("a/{}", self.relative);
        let b = format!("b/{}", self.relative);
        let diff = TextDiff::from_lines(old, self.content.as_str());
        let mut unified = diff.unified_diff();
        unified.context_radius(3).header(&a, &b);
        unified.to_string()
    }
}

/// Outcome of one file, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub path: String,
    pub kind: FileKind,
    pub action: FileAction,
}

impl From<&PlannedWrite> for SyncResult {
    fn from(planned: &PlannedWrite) -> Self {
        Self {
            path: planned.relative.clone(),
            kind: planned.kind,
            action: planned.action,
        }
    }
}

/// Writes rendered files under a project root
pub struct SyncExecutor {
    root: PathBuf,
    mode: WriteMode,
}

impl SyncExecutor {
    pub fn new(root: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Compute the final content of every file without writing anything
    pub fn plan(&self, files: &[RenderedFile]) -> Result<Vec<PlannedWrite>> {
        files.iter().map(|file| self.plan_file(file)).collect()
    }

    fn plan_file(&self, file: &RenderedFile) -> Result<PlannedWrite> {
        let path = self.root.join(&file.path);
        if path.is_dir() {
            return Err(ForgeError::Config(format!(
                "cannot write {}: a directory is in the way",
                file.path
            )));
        }

        let previous = if path.is_file() {
            Some(std::fs::read_to_string(&path)?)
        } else {
            None
        };

        let (action, content) = match (&previous, self.mode) {
            (None, _) => (FileAction::Created, file.content.clone()),
            (Some(prev), WriteMode::CreateOnly) => (FileAction::Skipped, prev.clone()),
            (Some(prev), WriteMode::Force) => {
                let action = if *prev == file.content {
                    FileAction::Unchanged
                } else {
                    FileAction::Overwritten
                };
                (action, file.content.clone())
            }
            (Some(prev), WriteMode::Merge) => match merge_existing(file, prev)? {
                Some(merged) if merged == *prev => (FileAction::Unchanged, merged),
                Some(merged) => (FileAction::Merged, merged),
                None => (FileAction::Skipped, prev.clone()),
            },
        };

        Ok(PlannedWrite {
            relative: file.path.clone(),
            path,
            kind: file.kind,
            action,
            previous,
            content,
        })
    }

    /// Write every planned file that changes
    pub fn apply(&self, plan: &[PlannedWrite]) -> Result<Vec<SyncResult>> {
        for planned in plan.iter().filter(|p| p.action.writes()) {
            if let Some(parent) = planned.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&planned.path, &planned.content)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if planned.kind == FileKind::Script {
                    let mut perms = std::fs::metadata(&planned.path)?.permissions();
                    perms.set_mode(0o755);
                    std::fs::set_permissions(&planned.path, perms)?;
                }
            }

            tracing::info!("{} {}", planned.action.as_str(), planned.relative);
        }

        Ok(plan.iter().map(SyncResult::from).collect())
    }

    /// Plan then apply
    pub fn sync(&self, files: &[RenderedFile]) -> Result<Vec<SyncResult>> {
        let plan = self.plan(files)?;
        self.apply(&plan)
    }
}

/// Merged content for an existing file, or `None` to leave it as is
fn merge_existing(file: &RenderedFile, existing: &str) -> Result<Option<String>> {
    let merged = match file.kind {
        FileKind::Markdown => merge::merge(existing, &file.content),
        FileKind::Settings => settings::merge_settings_json(existing, &file.content)?,
        FileKind::McpConfig => settings::merge_mcp_json(existing, &file.content)?,
        FileKind::Script | FileKind::Skeleton => return Ok(None),
    };
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn file(path: &str, content: &str, kind: FileKind) -> RenderedFile {
        RenderedFile {
            path: path.to_string(),
            content: content.to_string(),
            kind,
        }
    }

    #[test]
    fn test_create_only_skips_existing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("CLAUDE.md"), "mine\n").unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::CreateOnly);
        let results = executor
            .sync(&[
                file("CLAUDE.md", "## New\n", FileKind::Markdown),
                file("docs/TECH_SPEC.md", "# Spec\n", FileKind::Markdown),
            ])
            .unwrap();

        assert_eq!(results[0].action, FileAction::Skipped);
        assert_eq!(results[1].action, FileAction::Created);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("CLAUDE.md")).unwrap(),
            "mine\n"
        );
        assert!(temp.path().join("docs/TECH_SPEC.md").exists());
    }

    #[test]
    fn test_force_overwrites_and_detects_unchanged() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "old\n").unwrap();
        std::fs::write(temp.path().join("b.md"), "same\n").unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Force);
        let results = executor
            .sync(&[
                file("a.md", "new\n", FileKind::Markdown),
                file("b.md", "same\n", FileKind::Markdown),
            ])
            .unwrap();

        assert_eq!(results[0].action, FileAction::Overwritten);
        assert_eq!(results[1].action, FileAction::Unchanged);
        assert_eq!(std::fs::read_to_string(temp.path().join("a.md")).unwrap(), "new\n");
    }

    #[test]
    fn test_merge_preserves_custom_sections() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("CLAUDE.md"),
            "## Testing\n\nold\n\n## Team\n\nours\n",
        )
        .unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Merge);
        let results = executor
            .sync(&[file("CLAUDE.md", "## Testing\n\nnew\n", FileKind::Markdown)])
            .unwrap();

        assert_eq!(results[0].action, FileAction::Merged);
        let content = std::fs::read_to_string(temp.path().join("CLAUDE.md")).unwrap();
        assert!(content.starts_with("## Testing\n\nnew"));
        assert!(content.ends_with("## Team\n\nours\n"));
    }

    #[test]
    fn test_failed_merge_writes_nothing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".mcp.json"), "{broken").unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Merge);
        let result = executor.sync(&[
            file("CLAUDE.md", "## A\n", FileKind::Markdown),
            file(".mcp.json", r#"{"mcpServers": {}}"#, FileKind::McpConfig),
        ]);

        assert!(result.is_err());
        assert!(!temp.path().join("CLAUDE.md").exists());
    }

    #[test]
    fn test_merge_leaves_existing_scripts() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".claude/hooks")).unwrap();
        std::fs::write(temp.path().join(".claude/hooks/fmt.sh"), "custom\n").unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Merge);
        let results = executor
            .sync(&[file(".claude/hooks/fmt.sh", "#!/bin/sh\n", FileKind::Script)])
            .unwrap();
        assert_eq!(results[0].action, FileAction::Skipped);
    }

    #[test]
    fn test_merge_leaves_filled_in_skeletons() {
        let temp = TempDir::new().unwrap();
        let filled = "# Foo Status\n\n## In Progress\n\n- Ship the loader\n\n## Done\n";
        std::fs::write(temp.path().join("STATUS.md"), filled).unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Merge);
        let results = executor
            .sync(&[
                file(
                    "STATUS.md",
                    "# Foo Status\n\n## In Progress\n\n## Done\n",
                    FileKind::Skeleton,
                ),
                file("docs/TECH_SPEC.md", "# Spec\n", FileKind::Skeleton),
            ])
            .unwrap();

        assert_eq!(results[0].action, FileAction::Skipped);
        assert_eq!(results[1].action, FileAction::Created);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("STATUS.md")).unwrap(),
            filled
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let executor = SyncExecutor::new(temp.path(), WriteMode::CreateOnly);
        executor
            .sync(&[file(".claude/hooks/fmt.sh", "#!/bin/sh\n", FileKind::Script)])
            .unwrap();

        let mode = std::fs::metadata(temp.path().join(".claude/hooks/fmt.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_plan_diff() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "one\ntwo\n").unwrap();

        let executor = SyncExecutor::new(temp.path(), WriteMode::Force);
        let plan = executor
            .plan(&[file("a.md", "one\nthree\n", FileKind::Markdown)])
            .unwrap();
        let diff = plan[0].diff();

        assert!(diff.contains("--- a/a.md"));
        assert!(diff.contains("+++ b/a.md"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+three"));
        // Planning never writes
        assert_eq!(std::fs::read_to_string(temp.path().join("a.md")).unwrap(), "one\ntwo\n");
    }
}
