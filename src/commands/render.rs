//! @acp:module "Render Command"
//! @acp:summary "Render an arbitrary template file with a project context"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use super::pipeline::{detect_language, parse_variables, project_name};
use crate::config::Config;
use crate::registry::Tag;
use crate::render::{render_template, unresolved_placeholders, Language, RenderContext, Skeleton};

/// Options for the render command
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Template file; ignored when `skeleton` is set
    pub file: Option<PathBuf>,
    pub skeleton: Option<Skeleton>,
    pub project_dir: PathBuf,
    pub name: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub domain: Option<String>,
    pub tags: Vec<String>,
    pub sensitive: bool,
    /// `key=value` overrides
    pub vars: Vec<String>,
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute_render(options: RenderOptions) -> Result<()> {
    let config = Config::load_or_default(&options.project_dir);
    let ctx = build_context(&options, &config)?;

    let rendered = match (&options.skeleton, &options.file) {
        (Some(skeleton), _) => skeleton.render(&ctx),
        (None, Some(file)) => {
            let template = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read template {}", file.display()))?;
            render_template(&template, &ctx)
        }
        (None, None) => anyhow::bail!("Nothing to render: pass a template file or --skeleton"),
    };

    let unresolved = unresolved_placeholders(&rendered);
    if !unresolved.is_empty() {
        eprintln!(
            "{} Unresolved placeholders: {}",
            style("!").yellow(),
            unresolved.join(", ")
        );
    }

    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", style("✓").green(), path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn build_context(options: &RenderOptions, config: &Config) -> Result<RenderContext> {
    let name = options
        .name
        .clone()
        .or_else(|| config.project.name.clone())
        .unwrap_or_else(|| project_name(&options.project_dir));

    let language = match &options.language {
        Some(lang) => lang.parse::<Language>()?,
        None => config
            .project
            .language
            .unwrap_or_else(|| detect_language(&options.project_dir)),
    };

    let tags = if options.tags.is_empty() {
        config.parsed_tags()?
    } else {
        options
            .tags
            .iter()
            .map(|t| t.parse::<Tag>())
            .collect::<crate::Result<Vec<_>>>()?
    };
    let sensitive = options.sensitive || config.sensitive_data(&tags);

    let mut ctx = RenderContext::new(name, language)
        .with_tags(tags)
        .with_sensitive_data(sensitive);
    if let Some(framework) = options.framework.clone().or_else(|| config.project.framework.clone()) {
        ctx = ctx.with_framework(framework);
    }
    if let Some(domain) = options.domain.clone().or_else(|| config.project.domain.clone()) {
        ctx = ctx.with_domain(domain);
    }
    for (key, value) in &config.variables {
        ctx = ctx.with_variable(key.clone(), value.clone());
    }
    for (key, value) in parse_variables(&options.vars)? {
        ctx = ctx.with_variable(key, value);
    }
    Ok(ctx)
}
