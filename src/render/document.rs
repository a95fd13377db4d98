//! @acp:module "Document Renderer"
//! @acp:summary "Composite instruction documents and skeleton documents"
//! @acp:domain render
//! @acp:layer service
//!
//! Rendering is a pure function of (fragments, context, target). Every piece
//! of fixed boilerplate goes through the same template engine as fragment
//! bodies, so placeholders and `{{#if}}` blocks work everywhere.

use serde::{Deserialize, Serialize};

use super::context::RenderContext;
use super::target::{OutputFormat, Target};
use super::template::render_template;
use crate::registry::{ComposedResult, Fragment};

/// Marker comment placed under the document title
pub const GENERATED_MARKER: &str =
    "<!-- Generated by ruleforge. Sections you add are preserved on merge. -->";

const MDC_FRONT_MATTER: &str = "---
description: Project rules for {{projectName}}
globs:
alwaysApply: true
---";

const PROJECT_SUMMARY: &str = "## Project

- **Name**: {{projectName}}
- **Language**: {{language | default: not detected}}
- **Tags**: {{tags | default: none}}
{{#if hasFramework}}- **Framework**: {{framework}}
{{/if}}{{#if hasDomain}}- **Domain**: {{domain}}
{{/if}}{{#if hasSensitiveData}}
> This project handles sensitive data. Never log secrets or personal data, and keep credentials out of source control.
{{/if}}";

/// Render fragments as `## title` sections, optionally under a target header
pub fn render_fragments(fragments: &[Fragment], ctx: &RenderContext, target: Option<Target>) -> String {
    let mut sections = Vec::new();
    if let Some(target) = target {
        sections.push(document_header(target, ctx));
    }
    sections.extend(fragments.iter().map(|f| fragment_section(f, ctx, "##")));
    join_sections(sections)
}

/// Render the single composite instruction file for one assistant
pub fn render_instruction_document(
    composed: &ComposedResult,
    ctx: &RenderContext,
    target: Target,
) -> String {
    let mut sections = vec![
        document_header(target, ctx),
        render_template(PROJECT_SUMMARY, ctx).trim_end().to_string(),
    ];

    sections.extend(
        composed
            .instructions()
            .iter()
            .map(|f| fragment_section(f, ctx, "##")),
    );

    if !composed.nfrs().is_empty() {
        sections.push("## Non-Functional Requirements".to_string());
        sections.extend(composed.nfrs().iter().map(|f| fragment_section(f, ctx, "###")));
    }

    if !composed.references().is_empty() {
        sections.push("## References".to_string());
        sections.extend(
            composed
                .references()
                .iter()
                .map(|f| fragment_section(f, ctx, "###")),
        );
    }

    if !composed.structure().is_empty() {
        let entries: Vec<String> = composed
            .structure()
            .iter()
            .map(|f| structure_entry(f, ctx))
            .collect();
        sections.push(format!("## Project Structure\n\n{}", entries.join("\n")));
    }

    join_sections(sections)
}

fn document_header(target: Target, ctx: &RenderContext) -> String {
    let title = format!(
        "# {{{{projectName}}}}: {} Instructions\n\n{}",
        target.name(),
        GENERATED_MARKER
    );
    let header = match target.format() {
        OutputFormat::Mdc => format!("{}\n\n{}", MDC_FRONT_MATTER, title),
        OutputFormat::Markdown => title,
    };
    render_template(&header, ctx)
}

fn fragment_section(fragment: &Fragment, ctx: &RenderContext, marker: &str) -> String {
    let title = render_template(&fragment.title, ctx);
    let body = render_template(&fragment.body, ctx);
    let body = body.trim();
    if body.is_empty() {
        format!("{} {}", marker, title.trim())
    } else {
        format!("{} {}\n\n{}", marker, title.trim(), body)
    }
}

fn structure_entry(fragment: &Fragment, ctx: &RenderContext) -> String {
    let path = fragment.attributes.path.as_deref().unwrap_or(&fragment.id);
    let mut line = format!("- `{}`: {}", path, render_template(&fragment.title, ctx).trim());
    let body = render_template(&fragment.body, ctx);
    if !body.trim().is_empty() {
        line.push_str(" (");
        line.push_str(body.trim());
        line.push(')');
    }
    line
}

fn join_sections(sections: Vec<String>) -> String {
    let mut out = sections
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Auxiliary documents with fixed boilerplate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skeleton {
    StatusTracker,
    Requirements,
    TechSpec,
}

impl Skeleton {
    pub fn all() -> &'static [Skeleton] {
        &[Skeleton::StatusTracker, Skeleton::Requirements, Skeleton::TechSpec]
    }

    /// Path relative to the project root
    pub fn output_path(&self) -> &'static str {
        match self {
            Skeleton::StatusTracker => "STATUS.md",
            Skeleton::Requirements => "docs/REQUIREMENTS.md",
            Skeleton::TechSpec => "docs/TECH_SPEC.md",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skeleton::StatusTracker => "status tracker",
            Skeleton::Requirements => "requirements",
            Skeleton::TechSpec => "technical specification",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Skeleton::StatusTracker => STATUS_TEMPLATE,
            Skeleton::Requirements => REQUIREMENTS_TEMPLATE,
            Skeleton::TechSpec => TECH_SPEC_TEMPLATE,
        }
    }

    pub fn render(&self, ctx: &RenderContext) -> String {
        render_template(self.template(), ctx)
    }
}

const STATUS_TEMPLATE: &str = "# {{projectName}} Status

_Last updated: {{date}}_

## Current Focus

- {{currentFocus | default: Define the first milestone}}

## In Progress

## Done

## Blocked

## Notes
";

const REQUIREMENTS_TEMPLATE: &str = "# {{projectName}} Requirements

| Field | Value |
|---|---|
| Owner | {{owner}} |
| Updated | {{date}} |
| Tags | {{tags | default: none}} |

## Problem Statement

## Goals

## Non-Goals

## Functional Requirements

### FR-1: {{firstRequirement | default: Describe the first requirement}}

## Non-Functional Requirements
{{#if hasSensitiveData}}
### Data Protection

Sensitive data is in scope. Record classification, retention and access rules here.
{{/if}}
## Open Questions
";

const TECH_SPEC_TEMPLATE: &str = "# {{projectName}} Technical Specification

_Status: Draft ({{date}})_

## Overview

## Architecture
{{#if hasFramework}}
Built on {{framework}}.
{{/if}}
## Language and Tooling

- Language: {{language | default: not detected}}
{{#if isRust}}- Build with cargo; lint with clippy and format with rustfmt
{{/if}}{{#if isTypeScript}}- Type-check with tsc in strict mode; lint with eslint
{{/if}}{{#if isPython}}- Manage dependencies with a lock file; type-check with mypy
{{/if}}{{#if isGo}}- Format with gofmt; vet with go vet
{{/if}}
## Data Model

## Interfaces

## Testing Strategy

## Rollout
";
