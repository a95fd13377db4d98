//! @acp:module "Block Conditions"
//! @acp:summary "Parse and evaluate {{#if}} predicates against a render context"
//! @acp:domain render
//! @acp:layer logic

use super::context::{normalize_key, Language, RenderContext};
use crate::registry::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
}

/// Context field a comparison predicate reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Language,
    Framework,
    Domain,
    ProjectName,
}

/// A parsed `{{#if ...}}` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    HasFramework,
    HasDomain,
    HasSensitiveData,
    IsLanguage(Language),
    HasTag(Tag),
    Compare {
        field: Field,
        negated: bool,
        value: String,
    },
}

/// Evaluate a predicate expression. Unknown or malformed predicates are false.
///
/// Supported forms:
/// - `hasFramework`, `hasDomain`, `hasSensitiveData`
/// - `isRust`, `isTypeScript`, `is-python`, ...
/// - `hasTag API`
/// - `language == rust`, `framework != django`, `projectName == "Foo"`
pub fn evaluate_predicate(expr: &str, ctx: &RenderContext) -> bool {
    match parse_predicate(expr) {
        Some(predicate) => predicate.evaluate(ctx),
        None => {
            tracing::debug!("Unknown template predicate '{}', treating as false", expr);
            false
        }
    }
}

pub fn parse_predicate(expr: &str) -> Option<Predicate> {
    // Split on the operator so quoted values may contain spaces
    for op in ["!=", "==", "="] {
        if let Some((field, value)) = expr.split_once(op) {
            return parse_comparison(field.trim(), op, value.trim());
        }
    }

    let parts: Vec<&str> = expr.split_whitespace().collect();
    match parts.as_slice() {
        [flag] => parse_flag(flag),
        [keyword, tag] if matches!(normalize_key(keyword).as_str(), "hastag" | "tag") => {
            tag.parse::<Tag>().ok().map(Predicate::HasTag)
        }
        _ => None,
    }
}

fn parse_flag(flag: &str) -> Option<Predicate> {
    let key = normalize_key(flag);
    match key.as_str() {
        "hasframework" | "framework" => Some(Predicate::HasFramework),
        "hasdomain" | "domain" => Some(Predicate::HasDomain),
        "hassensitivedata" | "sensitivedata" => Some(Predicate::HasSensitiveData),
        _ => {
            let language = key.strip_prefix("is")?.parse::<Language>().ok()?;
            language.is_known().then_some(Predicate::IsLanguage(language))
        }
    }
}

fn parse_comparison(field: &str, op: &str, value: &str) -> Option<Predicate> {
    let field = match normalize_key(field).as_str() {
        "language" | "lang" => Field::Language,
        "framework" => Field::Framework,
        "domain" => Field::Domain,
        "projectname" | "project" | "name" => Field::ProjectName,
        _ => return None,
    };
    let operator = match op {
        "==" | "=" => Operator::Eq,
        "!=" => Operator::Ne,
        _ => return None,
    };
    let value = unquote(value).to_string();

    // Language comparisons must name a real language
    if field == Field::Language && value.parse::<Language>().is_err() {
        return None;
    }

    Some(Predicate::Compare {
        field,
        negated: operator == Operator::Ne,
        value,
    })
}

/// Strip one pair of matching single or double quotes
pub(crate) fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl Predicate {
    pub fn evaluate(&self, ctx: &RenderContext) -> bool {
        match self {
            Predicate::HasFramework => ctx.framework.as_deref().is_some_and(|f| !f.is_empty()),
            Predicate::HasDomain => ctx.domain.as_deref().is_some_and(|d| !d.is_empty()),
            Predicate::HasSensitiveData => ctx.sensitive_data.unwrap_or(false),
            Predicate::IsLanguage(language) => ctx.language == *language,
            Predicate::HasTag(tag) => tag.is_universal() || ctx.has_tag(tag),
            Predicate::Compare {
                field,
                negated,
                value,
            } => {
                let equal = match field {
                    Field::Language => value
                        .parse::<Language>()
                        .map(|l| l == ctx.language)
                        .unwrap_or(false),
                    Field::Framework => eq_opt(ctx.framework.as_deref(), value),
                    Field::Domain => eq_opt(ctx.domain.as_deref(), value),
                    Field::ProjectName => ctx.project_name.eq_ignore_ascii_case(value),
                };
                equal != *negated
            }
        }
    }
}

fn eq_opt(actual: Option<&str>, expected: &str) -> bool {
    actual.is_some_and(|a| a.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::new("Foo", Language::Python)
            .with_tags(vec![Tag::new("api")])
            .with_framework("Django")
    }

    #[test]
    fn test_flags() {
        let ctx = ctx();
        assert!(evaluate_predicate("hasFramework", &ctx));
        assert!(evaluate_predicate("has-framework", &ctx));
        assert!(!evaluate_predicate("hasDomain", &ctx));
        assert!(!evaluate_predicate("hasSensitiveData", &ctx));
        assert!(evaluate_predicate("isPython", &ctx));
        assert!(evaluate_predicate("is_python", &ctx));
        assert!(!evaluate_predicate("isRust", &ctx));
    }

    #[test]
    fn test_comparisons() {
        let ctx = ctx();
        assert!(evaluate_predicate("language == python", &ctx));
        assert!(evaluate_predicate("language == \"py\"", &ctx));
        assert!(evaluate_predicate("language != rust", &ctx));
        assert!(evaluate_predicate("framework == django", &ctx));
        assert!(!evaluate_predicate("domain == fintech", &ctx));
        assert!(evaluate_predicate("domain != fintech", &ctx));
        assert!(evaluate_predicate("framework==django", &ctx));
    }

    #[test]
    fn test_quoted_values_with_spaces() {
        let ctx = RenderContext::new("My App", Language::Rust).with_domain("online payments");
        assert!(evaluate_predicate("projectName == \"My App\"", &ctx));
        assert!(evaluate_predicate("project-name == 'my app'", &ctx));
        assert!(!evaluate_predicate("projectName != \"My App\"", &ctx));
        assert!(evaluate_predicate("domain == \"online payments\"", &ctx));
        assert!(!evaluate_predicate("projectName == \"My\"", &ctx));
    }

    #[test]
    fn test_has_tag() {
        let ctx = ctx();
        assert!(evaluate_predicate("hasTag API", &ctx));
        assert!(evaluate_predicate("hasTag universal", &ctx));
        assert!(!evaluate_predicate("hasTag WEB", &ctx));
    }

    #[test]
    fn test_unknown_predicates_fail_closed() {
        let ctx = ctx();
        assert!(!evaluate_predicate("isCobol", &ctx));
        assert!(!evaluate_predicate("language == cobol", &ctx));
        assert!(!evaluate_predicate("frobnicate", &ctx));
        assert!(!evaluate_predicate("language > python", &ctx));
        assert!(!evaluate_predicate("", &ctx));
    }
}
