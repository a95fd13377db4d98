//! @acp:module "Settings Merge"
//! @acp:summary "Typed merge of assistant settings and MCP server configs"
//! @acp:domain sync
//! @acp:layer service
//!
//! Field-by-field precedence:
//! - unknown top-level keys: the new value wins per key
//! - permission rule lists: union, existing entries first, no duplicates
//! - hook registrations: union per event and matcher, deduplicated by command
//! - MCP servers: merged per server name, the new definition wins

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// `.claude/settings.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default, skip_serializing_if = "Permissions::is_empty")]
    pub permissions: Permissions,

    /// Hook registrations keyed by event name (`PreToolUse`, `Stop`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hooks: BTreeMap<String, Vec<HookMatcher>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Permissions {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookMatcher {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub matcher: String,

    #[serde(default)]
    pub hooks: Vec<HookCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(rename = "type", default = "default_hook_type")]
    pub kind: String,

    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_hook_type() -> String {
    "command".to_string()
}

impl HookCommand {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            kind: default_hook_type(),
            command: command.into(),
            timeout: None,
        }
    }
}

/// `.mcp.json` / `.cursor/mcp.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, McpServer>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Merge freshly generated settings into existing ones
pub fn merge_settings(existing: AssistantSettings, generated: AssistantSettings) -> AssistantSettings {
    let mut merged = existing;

    union_into(&mut merged.permissions.allow, generated.permissions.allow);
    union_into(&mut merged.permissions.deny, generated.permissions.deny);
    merged.permissions.extra.extend(generated.permissions.extra);

    for (event, matchers) in generated.hooks {
        let slot = merged.hooks.entry(event).or_default();
        for matcher in matchers {
            match slot.iter_mut().find(|m| m.matcher == matcher.matcher) {
                Some(existing) => {
                    for hook in matcher.hooks {
                        if !existing.hooks.iter().any(|h| h.command == hook.command) {
                            existing.hooks.push(hook);
                        }
                    }
                }
                None => slot.push(matcher),
            }
        }
    }

    merged.extra.extend(generated.extra);
    merged
}

/// Merge MCP server configs; a server defined in both takes the new definition
pub fn merge_mcp_config(existing: McpConfig, generated: McpConfig) -> McpConfig {
    let mut merged = existing;
    merged.mcp_servers.extend(generated.mcp_servers);
    merged.extra.extend(generated.extra);
    merged
}

/// Text-level wrapper around [`merge_settings`]
pub fn merge_settings_json(existing: &str, generated: &str) -> Result<String> {
    let existing: AssistantSettings = parse_or_default(existing)?;
    let generated: AssistantSettings = serde_json::from_str(generated)?;
    to_json(&merge_settings(existing, generated))
}

/// Text-level wrapper around [`merge_mcp_config`]
pub fn merge_mcp_json(existing: &str, generated: &str) -> Result<String> {
    let existing: McpConfig = parse_or_default(existing)?;
    let generated: McpConfig = serde_json::from_str(generated)?;
    to_json(&merge_mcp_config(existing, generated))
}

/// Pretty JSON with a trailing newline
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn parse_or_default<T: Default + for<'de> Deserialize<'de>>(content: &str) -> Result<T> {
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(content)?)
}

fn union_into(target: &mut Vec<String>, additions: Vec<String>) {
    for item in additions {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permissions_union_without_duplicates() {
        let existing = r#"{"permissions": {"allow": ["Bash(ls:*)", "Read"], "deny": ["Bash(rm:*)"]}}"#;
        let generated = r#"{"permissions": {"allow": ["Read", "Bash(cargo test:*)"]}}"#;

        let merged: AssistantSettings =
            serde_json::from_str(&merge_settings_json(existing, generated).unwrap()).unwrap();
        assert_eq!(
            merged.permissions.allow,
            vec!["Bash(ls:*)", "Read", "Bash(cargo test:*)"]
        );
        assert_eq!(merged.permissions.deny, vec!["Bash(rm:*)"]);
    }

    #[test]
    fn test_new_top_level_keys_win() {
        let existing = r#"{"model": "old", "env": {"A": "1"}, "custom": true}"#;
        let generated = r#"{"model": "new"}"#;

        let merged: Value =
            serde_json::from_str(&merge_settings_json(existing, generated).unwrap()).unwrap();
        assert_eq!(merged["model"], "new");
        assert_eq!(merged["custom"], true);
        assert_eq!(merged["env"]["A"], "1");
    }

    #[test]
    fn test_hooks_union_per_matcher() {
        let mut existing = AssistantSettings::default();
        existing.hooks.insert(
            "PostToolUse".to_string(),
            vec![HookMatcher {
                matcher: "Edit|Write".to_string(),
                hooks: vec![HookCommand::command("mine.sh")],
            }],
        );
        let mut generated = AssistantSettings::default();
        generated.hooks.insert(
            "PostToolUse".to_string(),
            vec![
                HookMatcher {
                    matcher: "Edit|Write".to_string(),
                    hooks: vec![HookCommand::command("mine.sh"), HookCommand::command("fmt.sh")],
                },
                HookMatcher {
                    matcher: "Bash".to_string(),
                    hooks: vec![HookCommand::command("audit.sh")],
                },
            ],
        );

        let merged = merge_settings(existing, generated);
        let post = &merged.hooks["PostToolUse"];
        assert_eq!(post.len(), 2);
        let commands: Vec<_> = post[0].hooks.iter().map(|h| h.command.as_str()).collect();
        assert_eq!(commands, vec!["mine.sh", "fmt.sh"]);
    }

    #[test]
    fn test_mcp_servers_merge_by_name() {
        let existing = r#"{"mcpServers": {
            "github": {"command": "old"},
            "mine": {"command": "mine", "disabled": true}
        }}"#;
        let generated = r#"{"mcpServers": {"github": {"command": "npx", "args": ["-y", "gh"]}}}"#;

        let merged: McpConfig =
            serde_json::from_str(&merge_mcp_json(existing, generated).unwrap()).unwrap();
        assert_eq!(merged.mcp_servers["github"].command, "npx");
        assert_eq!(merged.mcp_servers["mine"].extra["disabled"], true);
    }

    #[test]
    fn test_empty_existing_and_invalid_json() {
        let generated = r#"{"mcpServers": {"a": {"command": "x"}}}"#;
        let merged = merge_mcp_json("", generated).unwrap();
        assert!(merged.ends_with("}\n"));
        assert!(merge_mcp_json("{not json", generated).is_err());
    }
}
