//! @acp:module "Template Engine"
//! @acp:summary "Placeholder substitution and conditional blocks for fragment bodies"
//! @acp:domain render
//! @acp:layer logic
//!
//! Deliberately small: `{{name}}`, `{{name | default: value}}` and
//! `{{#if predicate}}...{{/if}}`. No loops, no expressions.
//!
//! Unresolved placeholders without a default are left untouched so that the
//! reader of the generated document can see what still needs filling in.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::condition::{evaluate_predicate, unquote};
use super::context::RenderContext;

/// `{{ name }}` or `{{ name | default: value }}`
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z][A-Za-z0-9_.-]*)\s*(?:\|\s*default\s*:\s*(.*?)\s*)?\}\}").unwrap()
});

/// `{{#if predicate}}` or `{{/if}}`
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?:#if\s+(?P<pred>[^}]*?)|(?P<close>/if))\s*\}\}").unwrap()
});

/// Render template text: evaluate conditional blocks, then substitute
/// placeholders. Substituted values are never re-scanned.
pub fn render_template(text: &str, ctx: &RenderContext) -> String {
    substitute(&evaluate_blocks(text, ctx), ctx)
}

/// Replace placeholders with context values or defaults
pub fn substitute(text: &str, ctx: &RenderContext) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            match (ctx.lookup(name), caps.get(2)) {
                (Some(value), _) => value,
                (None, Some(default)) => unquote(default.as_str()).to_string(),
                (None, None) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve `{{#if}}` blocks.
///
/// A false block is removed together with its delimiters; a true block keeps
/// its inner text verbatim. Blocks nest, and a block inside a false block is
/// removed without evaluating its predicate. A stray `{{/if}}` is dropped and
/// an unclosed `{{#if}}` runs to the end of the text.
pub fn evaluate_blocks(text: &str, ctx: &RenderContext) -> String {
    let mut output = String::with_capacity(text.len());
    // Effective visibility of each open block (parent && own predicate)
    let mut stack: Vec<bool> = Vec::new();
    let mut last = 0;

    for caps in BLOCK_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let visible = stack.last().copied().unwrap_or(true);
        if visible {
            output.push_str(&text[last..whole.start()]);
        }

        if let Some(predicate) = caps.name("pred") {
            stack.push(visible && evaluate_predicate(predicate.as_str(), ctx));
        } else if stack.pop().is_none() {
            tracing::debug!("Dropping unmatched {{{{/if}}}} at byte {}", whole.start());
        }

        last = whole.end();
    }

    if stack.last().copied().unwrap_or(true) {
        output.push_str(&text[last..]);
    }
    output
}

/// Names of placeholders still present in rendered text, in first-seen order
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_PATTERN.captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
