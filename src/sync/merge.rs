//! @acp:module "Section Merge"
//! @acp:summary "Preserve user-authored sections when regenerating instruction files"
//! @acp:domain sync
//! @acp:layer logic
//!
//! A section starts at a `##` or `###` heading and runs until the next heading
//! of the same or a higher level. Sections of the existing file whose heading
//! line does not appear in the generated text are appended after it.
//!
//! Matching is by trimmed heading text only. A renamed heading is treated as a
//! removed section plus a new one, and bodies are never compared.

use std::collections::HashSet;

/// Line placed between generated content and preserved sections
pub const CUSTOM_SECTIONS_SEPARATOR: &str = "<!-- Custom sections preserved from the previous version -->";

/// A heading-delimited span of lines
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    heading: String,
    start: usize,
    end: usize,
}

/// Merge `generated` with the custom sections of `existing`.
///
/// Returns `generated` unchanged, byte for byte, when there is nothing to keep.
pub fn merge(existing: &str, generated: &str) -> String {
    let custom = custom_sections(existing, generated);
    if custom.is_empty() {
        return generated.to_string();
    }

    tracing::debug!("Preserving {} custom sections", custom.len());
    format!(
        "{}\n\n{}\n\n{}\n",
        generated.trim_end(),
        CUSTOM_SECTIONS_SEPARATOR,
        custom.join("\n\n")
    )
}

/// Sections of `existing` whose heading is absent from `generated`, in order
pub fn custom_sections(existing: &str, generated: &str) -> Vec<String> {
    let known: HashSet<String> = split_sections(generated)
        .into_iter()
        .map(|s| s.heading)
        .collect();

    let lines: Vec<&str> = existing.lines().collect();
    let mut captured = Vec::new();
    // Children of a captured section are already part of its text
    let mut covered_until = 0;

    for section in split_sections(existing) {
        if section.start < covered_until || known.contains(&section.heading) {
            continue;
        }
        let text = lines[section.start..section.end]
            .iter()
            .filter(|l| l.trim() != CUSTOM_SECTIONS_SEPARATOR)
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        captured.push(text.trim_end().to_string());
        covered_until = section.end;
    }

    captured
}

/// Trimmed `##`/`###` heading lines of a document
pub fn section_headings(text: &str) -> Vec<String> {
    split_sections(text).into_iter().map(|s| s.heading).collect()
}

fn split_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();
    // (line index, level) of every heading, level-1 titles included as boundaries
    let mut headings: Vec<(usize, usize)> = Vec::new();
    let mut in_fence = false;

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(level) = heading_level(line) {
            headings.push((index, level));
        }
    }

    headings
        .iter()
        .enumerate()
        .filter(|(_, (_, level))| matches!(level, 2 | 3))
        .map(|(position, &(start, level))| {
            let end = headings[position + 1..]
                .iter()
                .find(|(_, next)| *next <= level)
                .map(|(line, _)| *line)
                .unwrap_or(lines.len());
            Section {
                heading: lines[start].trim().to_string(),
                start,
                end,
            }
        })
        .collect()
}

/// ATX heading level (1-6) of a line, if it is a heading
fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    (rest.is_empty() || rest.starts_with(' ')).then_some(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GENERATED: &str = "# Foo\n\n## Code Style\n\nUse rustfmt.\n\n## Testing\n\nWrite tests.\n";

    #[test]
    fn test_merge_with_itself_is_identity() {
        assert_eq!(merge(GENERATED, GENERATED), GENERATED);
    }

    #[test]
    fn test_custom_section_appended_after_generated() {
        let existing = "# Foo\n\n## Code Style\n\nOld rules.\n\n## Custom\n\nKeep me.\nAnd me.\n\n## Testing\n\nOld tests.\n";
        let merged = merge(existing, GENERATED);
        assert_eq!(
            merged,
            format!(
                "{}\n\n{}\n\n## Custom\n\nKeep me.\nAnd me.\n",
                GENERATED.trim_end(),
                CUSTOM_SECTIONS_SEPARATOR
            )
        );
    }

    #[test]
    fn test_no_custom_sections_is_byte_identical() {
        let existing = "## Testing\n\nsomething else entirely\n";
        let generated = "## Testing\n\nWrite tests.";
        assert_eq!(merge(existing, generated), generated);
    }

    #[test]
    fn test_heading_match_ignores_surrounding_whitespace() {
        let existing = "  ## Testing  \n\nbody\n";
        assert_eq!(merge(existing, GENERATED), GENERATED);
    }

    #[test]
    fn test_renamed_heading_is_a_custom_section() {
        let existing = "## Code style\n\nlowercase s\n";
        let merged = merge(existing, GENERATED);
        assert!(merged.ends_with("## Code style\n\nlowercase s\n"));
    }

    #[test]
    fn test_nested_custom_sections() {
        // A custom parent carries its children along
        let existing = "## Team Notes\n\nintro\n\n### On Call\n\nrotation\n\n## Testing\n\nx\n";
        assert_eq!(
            custom_sections(existing, GENERATED),
            vec!["## Team Notes\n\nintro\n\n### On Call\n\nrotation"]
        );

        // A custom child under a generated parent is kept on its own
        let existing = "## Testing\n\nx\n\n### Fixtures\n\nuse tempfile\n";
        assert_eq!(
            custom_sections(existing, GENERATED),
            vec!["### Fixtures\n\nuse tempfile"]
        );
    }

    #[test]
    fn test_headings_inside_code_fences_ignored() {
        let existing = "## Custom\n\n```md\n## Testing\n```\n\nafter\n";
        assert_eq!(
            custom_sections(existing, GENERATED),
            vec!["## Custom\n\n```md\n## Testing\n```\n\nafter"]
        );
    }

    #[test]
    fn test_merge_is_stable_across_regenerations() {
        let existing = "## Code Style\n\nx\n\n## Custom\n\nmine\n";
        let once = merge(existing, GENERATED);
        let twice = merge(&once, GENERATED);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_section_headings() {
        assert_eq!(
            section_headings("# Title\n## A\n#### deep\n### B\n#nospace\n"),
            vec!["## A", "### B"]
        );
    }
}
