//! Rendering integration tests
//!
//! Bundled templates composed and rendered into documents and file bundles.

use ruleforge::config::default_builtin_dir;
use ruleforge::registry::{compose, load_fragment_sources, ComposeOptions, ComposedResult, Tag, Tier};
use ruleforge::render::{
    render_bundle, render_instruction_document, render_template, unresolved_placeholders,
    BundleOptions, FileKind, Language, RenderContext, Skeleton, Target, GENERATED_MARKER,
};

fn composed(tags: &[&str], tier: Tier) -> ComposedResult {
    let sets = load_fragment_sources(&default_builtin_dir(), &[]).unwrap();
    let tags: Vec<Tag> = tags.iter().map(|t| Tag::new(t)).collect();
    compose(&tags, &sets, &ComposeOptions::with_tier(tier)).unwrap()
}

fn context() -> RenderContext {
    RenderContext::new("billing", Language::Rust)
        .with_tags(vec![Tag::new("api")])
        .with_date("2026-01-02")
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing {:?} in:\n{}", needle, haystack))
}

// =============================================================================
// Instruction documents
// =============================================================================

mod document_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_claude_document_layout() {
        let composed = composed(&["api"], Tier::Recommended);
        let doc = render_instruction_document(&composed, &context(), Target::ClaudeCode);

        assert!(doc.starts_with("# billing: Claude Code Instructions\n\n"));
        assert!(doc.contains(GENERATED_MARKER));
        assert!(doc.contains("- **Language**: Rust"));

        let order = [
            "## Project",
            "## Working Agreement",
            "## Testing",
            "## API Design",
            "## Request Validation",
            "## Non-Functional Requirements",
            "### Security",
            "### Rate Limiting",
            "## References",
            "## Project Structure",
        ];
        let positions: Vec<usize> = order.iter().map(|h| position(&doc, h)).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);

        assert!(doc.contains("- `api/openapi.yaml`: OpenAPI specification"));
        // Optional fragments stay out at the recommended tier
        assert!(!doc.contains("## Commit Messages"));
        assert!(!doc.contains("## Pagination"));
        assert!(doc.ends_with('\n') && !doc.ends_with("\n\n"));
    }

    #[test]
    fn test_cursor_document_has_front_matter() {
        let composed = composed(&["web"], Tier::Core);
        let doc = render_instruction_document(&composed, &context(), Target::Cursor);

        assert!(doc.starts_with("---\ndescription: Project rules for billing\n"));
        assert!(doc.contains("alwaysApply: true"));
        assert!(doc.contains("# billing: Cursor Instructions"));
    }

    #[test]
    fn test_sensitive_notice_follows_context() {
        let composed = composed(&["fintech"], Tier::Core);
        let plain = render_instruction_document(&composed, &context(), Target::Agents);
        let sensitive = render_instruction_document(
            &composed,
            &context().with_sensitive_data(true),
            Target::Agents,
        );

        assert!(!plain.contains("handles sensitive data"));
        assert!(sensitive.contains("handles sensitive data"));
        assert!(sensitive.contains("## Money Handling"));
    }

    #[test]
    fn test_no_conditional_markers_survive() {
        let composed = composed(&["api", "web", "cli", "fintech"], Tier::Optional);
        for target in Target::all() {
            let doc = render_instruction_document(&composed, &context(), *target);
            assert!(!doc.contains("{{#if"), "{:?}", target);
            assert!(!doc.contains("{{/if}}"), "{:?}", target);
            assert!(!doc.contains("{{projectName}}"), "{:?}", target);
        }
    }

    #[test]
    fn test_rendering_is_pure() {
        let composed = composed(&["api"], Tier::Optional);
        let ctx = context();
        let before = ctx.clone();

        let first = render_instruction_document(&composed, &ctx, Target::Copilot);
        let second = render_instruction_document(&composed, &ctx, Target::Copilot);
        assert_eq!(first, second);
        assert_eq!(ctx, before);
    }
}

// =============================================================================
// Templates and skeletons
// =============================================================================

mod template_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_values_replace_placeholders() {
        let ctx = context().with_framework("axum");
        let out = render_template(
            "{{projectName}} uses {{framework}} ({{language}}) on {{date}}",
            &ctx,
        );
        assert_eq!(out, "billing uses axum (Rust) on 2026-01-02");
    }

    #[test]
    fn test_unknown_placeholder_left_for_reader() {
        let ctx = context();
        let out = render_template("Owner: {{owner}}, team {{team | default: platform}}", &ctx);
        assert_eq!(out, "Owner: {{owner}}, team platform");
        assert_eq!(unresolved_placeholders(&out), vec!["owner".to_string()]);
    }

    #[test]
    fn test_status_skeleton() {
        let status = Skeleton::StatusTracker.render(&context());
        assert!(status.starts_with("# billing Status\n"));
        assert!(status.contains("_Last updated: 2026-01-02_"));
        assert!(status.contains("## In Progress"));
    }

    #[test]
    fn test_requirements_skeleton_data_protection() {
        let plain = Skeleton::Requirements.render(&context());
        let sensitive = Skeleton::Requirements.render(&context().with_sensitive_data(true));

        assert!(!plain.contains("### Data Protection"));
        assert!(sensitive.contains("### Data Protection"));
        assert_eq!(unresolved_placeholders(&plain), vec!["owner".to_string()]);
    }
}

// =============================================================================
// Bundles
// =============================================================================

mod bundle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_bundle_paths() {
        let composed = composed(&["api"], Tier::Optional);
        let options = BundleOptions {
            targets: vec![Target::ClaudeCode, Target::Cursor, Target::ClaudeCode],
            skeletons: Skeleton::all().to_vec(),
        };
        let files = render_bundle(&composed, &context(), &options).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                "CLAUDE.md",
                ".cursor/rules/project.mdc",
                ".claude/hooks/block-secrets.sh",
                ".claude/hooks/format-on-save.sh",
                ".claude/settings.json",
                ".claude/skills/update-status/SKILL.md",
                ".mcp.json",
                ".cursor/mcp.json",
                "STATUS.md",
                "docs/REQUIREMENTS.md",
                "docs/TECH_SPEC.md",
            ]
        );
    }

    #[test]
    fn test_hook_scripts_and_registration() {
        let composed = composed(&["api"], Tier::Optional);
        let options = BundleOptions {
            targets: vec![Target::ClaudeCode],
            skeletons: vec![],
        };
        let files = render_bundle(&composed, &context(), &options).unwrap();

        let format = files
            .iter()
            .find(|f| f.path == ".claude/hooks/format-on-save.sh")
            .unwrap();
        assert_eq!(format.kind, FileKind::Script);
        assert!(format.content.starts_with("#!/usr/bin/env bash\n"));
        assert!(format.content.contains("cargo fmt"));
        assert!(!format.content.contains("prettier"));

        let settings = files.iter().find(|f| f.kind == FileKind::Settings).unwrap();
        let json: serde_json::Value = serde_json::from_str(&settings.content).unwrap();
        let pre = &json["hooks"]["PreToolUse"][0];
        assert_eq!(pre["matcher"], "Edit|Write");
        assert_eq!(
            pre["hooks"][0]["command"],
            "\"$CLAUDE_PROJECT_DIR\"/.claude/hooks/block-secrets.sh"
        );
        assert!(json["hooks"]["PostToolUse"].is_array());
    }

    #[test]
    fn test_targets_without_hooks_get_instruction_file_only() {
        let composed = composed(&["web"], Tier::Recommended);
        let options = BundleOptions {
            targets: vec![Target::Copilot, Target::Agents],
            skeletons: vec![],
        };
        let files = render_bundle(&composed, &context(), &options).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec![".github/copilot-instructions.md", "AGENTS.md"]);
    }

    #[test]
    fn test_mcp_config_lists_selected_servers() {
        let composed = composed(&["api"], Tier::Optional);
        let options = BundleOptions {
            targets: vec![Target::ClaudeCode],
            skeletons: vec![],
        };
        let files = render_bundle(&composed, &context(), &options).unwrap();
        let mcp = files.iter().find(|f| f.path == ".mcp.json").unwrap();
        let json: serde_json::Value = serde_json::from_str(&mcp.content).unwrap();

        assert_eq!(json["mcpServers"]["filesystem"]["command"], "npx");
        assert!(json["mcpServers"]["github"].is_object());
    }
}
