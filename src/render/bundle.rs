//! @acp:module "Bundle Renderer"
//! @acp:summary "Render every output file for a set of targets in memory"
//! @acp:domain render
//! @acp:layer service
//!
//! Nothing here touches the filesystem. A bundle is either produced in full
//! or not at all, so the writer never sees a partially rendered set.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use serde::Serialize;

use super::context::RenderContext;
use super::document::{render_instruction_document, Skeleton};
use super::target::Target;
use super::template::render_template;
use crate::error::{ForgeError, Result};
use crate::registry::{ComposedResult, Fragment};
use crate::sync::settings::{to_json, AssistantSettings, HookCommand, HookMatcher, McpConfig, McpServer};

/// Event used for hooks that don't name one
pub const DEFAULT_HOOK_EVENT: &str = "PostToolUse";

const HOOK_DIR: &str = ".claude/hooks";
const SKILL_DIR: &str = ".claude/skills";
const SETTINGS_PATH: &str = ".claude/settings.json";

/// How the writer treats an existing copy of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// Merged with the section merge engine
    Markdown,
    /// Executable; never merged
    Script,
    /// `.claude/settings.json`
    Settings,
    /// `.mcp.json` and friends
    McpConfig,
    /// Fill-in document; only written when missing, even when merging
    Skeleton,
}

/// One rendered output file, path relative to the project root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

impl RenderedFile {
    fn new(path: impl Into<String>, content: String, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            content,
            kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub targets: Vec<Target>,
    pub skeletons: Vec<Skeleton>,
}

/// Render instruction files, hooks, skills, MCP configs and skeletons
pub fn render_bundle(
    composed: &ComposedResult,
    ctx: &RenderContext,
    options: &BundleOptions,
) -> Result<Vec<RenderedFile>> {
    let mut targets: Vec<Target> = Vec::new();
    for target in &options.targets {
        if !targets.contains(target) {
            targets.push(*target);
        }
    }

    let mut files: Vec<RenderedFile> = targets
        .iter()
        .map(|t| {
            RenderedFile::new(
                t.output_path(),
                render_instruction_document(composed, ctx, *t),
                FileKind::Markdown,
            )
        })
        .collect();

    if targets.iter().any(Target::supports_hooks) && !composed.hooks().is_empty() {
        files.extend(render_hooks(composed.hooks(), ctx)?);
    }

    if targets.iter().any(Target::supports_skills) {
        for skill in composed.skills() {
            files.push(render_skill(skill, ctx)?);
        }
    }

    if !composed.mcp_servers().is_empty() {
        let config = mcp_config(composed.mcp_servers(), ctx);
        for path in targets.iter().filter_map(Target::mcp_config_path) {
            files.push(RenderedFile::new(path, to_json(&config)?, FileKind::McpConfig));
        }
    }

    for skeleton in &options.skeletons {
        files.push(RenderedFile::new(
            skeleton.output_path(),
            skeleton.render(ctx),
            FileKind::Skeleton,
        ));
    }

    tracing::debug!("Rendered {} files for {} targets", files.len(), targets.len());
    Ok(files)
}

/// Hook scripts plus the settings file that registers them
fn render_hooks(hooks: &[Fragment], ctx: &RenderContext) -> Result<Vec<RenderedFile>> {
    let mut files = Vec::new();
    let mut registrations: BTreeMap<String, Vec<HookMatcher>> = BTreeMap::new();

    for hook in hooks {
        let script = hook
            .attributes
            .path
            .clone()
            .unwrap_or_else(|| format!("{}.sh", hook.id));
        check_relative(hook, &script)?;

        let mut body = render_template(&hook.body, ctx);
        if !body.starts_with("#!") {
            body.insert_str(0, "#!/usr/bin/env bash\n");
        }
        if !body.ends_with('\n') {
            body.push('\n');
        }
        files.push(RenderedFile::new(
            format!("{}/{}", HOOK_DIR, script),
            body,
            FileKind::Script,
        ));

        let event = hook
            .attributes
            .event
            .clone()
            .unwrap_or_else(|| DEFAULT_HOOK_EVENT.to_string());
        let matcher = hook.attributes.matcher.clone().unwrap_or_default();
        let command = HookCommand::command(format!(
            "\"$CLAUDE_PROJECT_DIR\"/{}/{}",
            HOOK_DIR, script
        ));

        let slot = registrations.entry(event).or_default();
        match slot.iter_mut().find(|m| m.matcher == matcher) {
            Some(existing) => existing.hooks.push(command),
            None => slot.push(HookMatcher {
                matcher,
                hooks: vec![command],
            }),
        }
    }

    let settings = AssistantSettings {
        hooks: registrations,
        ..Default::default()
    };
    files.push(RenderedFile::new(SETTINGS_PATH, to_json(&settings)?, FileKind::Settings));
    Ok(files)
}

fn render_skill(skill: &Fragment, ctx: &RenderContext) -> Result<RenderedFile> {
    check_relative(skill, &skill.id)?;
    let title = render_template(&skill.title, ctx);
    let description = skill
        .attributes
        .description
        .as_deref()
        .map(|d| render_template(d, ctx))
        .unwrap_or_else(|| title.clone());
    let content = format!(
        "---\nname: {}\ndescription: {}\n---\n\n# {}\n\n{}\n",
        skill.id,
        description.trim(),
        title.trim(),
        render_template(&skill.body, ctx).trim()
    );
    Ok(RenderedFile::new(
        format!("{}/{}/SKILL.md", SKILL_DIR, skill.id),
        content,
        FileKind::Markdown,
    ))
}

fn mcp_config(servers: &[Fragment], ctx: &RenderContext) -> McpConfig {
    let mut config = McpConfig::default();
    for server in servers {
        let Some(command) = server.attributes.command.as_deref() else {
            tracing::warn!("Skipping MCP server '{}' without a command", server.id);
            continue;
        };
        config.mcp_servers.insert(
            server.id.clone(),
            McpServer {
                command: render_template(command, ctx),
                args: server
                    .attributes
                    .args
                    .iter()
                    .map(|a| render_template(a, ctx))
                    .collect(),
                env: server
                    .attributes
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), render_template(v, ctx)))
                    .collect(),
                ..Default::default()
            },
        );
    }
    config
}

/// Fragment-supplied paths must stay inside the output directory
fn check_relative(fragment: &Fragment, path: &str) -> Result<()> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if path.is_empty() || escapes {
        return Err(ForgeError::Config(format!(
            "fragment '{}' ({}) has an invalid output path '{}'",
            fragment.id,
            fragment.source.display(),
            path
        )));
    }
    Ok(())
}
