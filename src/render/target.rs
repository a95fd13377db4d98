//! @acp:module "Output Targets"
//! @acp:summary "Supported AI assistant targets and their output file layout"
//! @acp:domain render
//! @acp:layer model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ForgeError;

/// Supported AI coding assistants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    ClaudeCode,
    Cursor,
    Copilot,
    Windsurf,
    Cline,
    Gemini,
    Agents,
}

/// Output location and naming for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetConfig {
    /// Directory relative to the project root, empty for the root itself
    pub dir: &'static str,
    pub filename: &'static str,
    pub display_name: &'static str,
}

/// Instruction file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    /// Markdown with a YAML front matter block
    Mdc,
}

impl Target {
    pub fn all() -> &'static [Target] {
        &[
            Target::ClaudeCode,
            Target::Cursor,
            Target::Copilot,
            Target::Windsurf,
            Target::Cline,
            Target::Gemini,
            Target::Agents,
        ]
    }

    pub fn config(&self) -> TargetConfig {
        match self {
            Target::ClaudeCode => TargetConfig {
                dir: "",
                filename: "CLAUDE.md",
                display_name: "Claude Code",
            },
            Target::Cursor => TargetConfig {
                dir: ".cursor/rules",
                filename: "project.mdc",
                display_name: "Cursor",
            },
            Target::Copilot => TargetConfig {
                dir: ".github",
                filename: "copilot-instructions.md",
                display_name: "GitHub Copilot",
            },
            Target::Windsurf => TargetConfig {
                dir: "",
                filename: ".windsurfrules",
                display_name: "Windsurf",
            },
            Target::Cline => TargetConfig {
                dir: "",
                filename: ".clinerules",
                display_name: "Cline",
            },
            Target::Gemini => TargetConfig {
                dir: "",
                filename: "GEMINI.md",
                display_name: "Gemini CLI",
            },
            Target::Agents => TargetConfig {
                dir: "",
                filename: "AGENTS.md",
                display_name: "Codex / generic (AGENTS.md)",
            },
        }
    }

    /// Instruction file path relative to the project root
    pub fn output_path(&self) -> String {
        let config = self.config();
        if config.dir.is_empty() {
            config.filename.to_string()
        } else {
            format!("{}/{}", config.dir, config.filename)
        }
    }

    pub fn name(&self) -> &'static str {
        self.config().display_name
    }

    /// Identifier accepted on the command line and in config files
    pub fn id(&self) -> &'static str {
        match self {
            Target::ClaudeCode => "claude-code",
            Target::Cursor => "cursor",
            Target::Copilot => "copilot",
            Target::Windsurf => "windsurf",
            Target::Cline => "cline",
            Target::Gemini => "gemini",
            Target::Agents => "agents",
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            Target::Cursor => OutputFormat::Mdc,
            _ => OutputFormat::Markdown,
        }
    }

    pub fn supports_mcp(&self) -> bool {
        self.mcp_config_path().is_some()
    }

    /// Project-level MCP server config file
    pub fn mcp_config_path(&self) -> Option<&'static str> {
        match self {
            Target::ClaudeCode => Some(".mcp.json"),
            Target::Cursor => Some(".cursor/mcp.json"),
            _ => None,
        }
    }

    /// Hook scripts and skills are only wired up for Claude Code
    pub fn supports_hooks(&self) -> bool {
        matches!(self, Target::ClaudeCode)
    }

    pub fn supports_skills(&self) -> bool {
        matches!(self, Target::ClaudeCode)
    }

    /// Check whether the assistant already leaves traces in the project
    pub fn detect(&self, project_root: &Path) -> bool {
        let markers: &[&str] = match self {
            Target::ClaudeCode => &["CLAUDE.md", ".claude"],
            Target::Cursor => &[".cursor", ".cursorrules"],
            Target::Copilot => &[".github/copilot-instructions.md"],
            Target::Windsurf => &[".windsurfrules", ".windsurf"],
            Target::Cline => &[".clinerules"],
            Target::Gemini => &["GEMINI.md", ".gemini"],
            Target::Agents => &["AGENTS.md"],
        };
        markers.iter().any(|m| project_root.join(m).exists())
    }

    pub fn from_name(name: &str) -> Option<Target> {
        match name.trim().to_lowercase().as_str() {
            "claude-code" | "claudecode" | "claude" => Some(Target::ClaudeCode),
            "cursor" => Some(Target::Cursor),
            "copilot" | "github-copilot" => Some(Target::Copilot),
            "windsurf" => Some(Target::Windsurf),
            "cline" => Some(Target::Cline),
            "gemini" | "gemini-cli" => Some(Target::Gemini),
            "agents" | "codex" | "generic" => Some(Target::Agents),
            _ => None,
        }
    }
}

impl FromStr for Target {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::from_name(s).ok_or_else(|| ForgeError::UnknownTarget(s.to_string()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Targets whose assistants are already in use, falling back to AGENTS.md
pub fn detect_targets(project_root: &Path) -> Vec<Target> {
    let detected: Vec<Target> = Target::all()
        .iter()
        .copied()
        .filter(|t| t.detect(project_root))
        .collect();
    if detected.is_empty() {
        vec![Target::Agents]
    } else {
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_target_output_paths() {
        assert_eq!(Target::ClaudeCode.output_path(), "CLAUDE.md");
        assert_eq!(Target::Cursor.output_path(), ".cursor/rules/project.mdc");
        assert_eq!(
            Target::Copilot.output_path(),
            ".github/copilot-instructions.md"
        );
        assert_eq!(Target::Agents.output_path(), "AGENTS.md");
    }

    #[test]
    fn test_target_from_name() {
        assert_eq!(Target::from_name("cursor"), Some(Target::Cursor));
        assert_eq!(Target::from_name("Claude-Code"), Some(Target::ClaudeCode));
        assert_eq!(Target::from_name("unknown"), None);
        assert!(matches!(
            "vim".parse::<Target>(),
            Err(ForgeError::UnknownTarget(name)) if name == "vim"
        ));
    }

    #[test]
    fn test_ids_round_trip() {
        for target in Target::all() {
            assert_eq!(Target::from_name(target.id()), Some(*target));
        }
    }

    #[test]
    fn test_target_mcp_support() {
        assert!(Target::ClaudeCode.supports_mcp());
        assert!(Target::Cursor.supports_mcp());
        assert!(!Target::Copilot.supports_mcp());
        assert_eq!(Target::Cursor.mcp_config_path(), Some(".cursor/mcp.json"));
    }

    #[test]
    fn test_detect_targets_falls_back_to_agents() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_targets(temp.path()), vec![Target::Agents]);

        std::fs::create_dir(temp.path().join(".cursor")).unwrap();
        std::fs::write(temp.path().join("CLAUDE.md"), "").unwrap();
        assert_eq!(
            detect_targets(temp.path()),
            vec![Target::ClaudeCode, Target::Cursor]
        );
    }
}
