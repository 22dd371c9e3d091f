//! Whitelisting of user-supplied filter expressions.
//!
//! Only a single equality between a column and a double-quoted word literal
//! is accepted, e.g. `crop="maize"`. Words are ASCII letters, digits and `_`. Anything else is downgraded to `TRUE`
//! so the request still runs, bounded only by its row limit.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Predicate substituted for conditions that fail validation.
pub const PERMISSIVE_CONDITION: &str = "TRUE";

fn simple_filter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^[A-Za-z0-9_]*="[A-Za-z0-9_]*"$"#).unwrap())
}

/// Returns true if `condition` is a simple column/value filter.
pub fn is_simple_filter(condition: &str) -> bool {
    simple_filter_pattern().is_match(condition)
}

/// Returns the condition unchanged if it is a simple filter, `TRUE` otherwise.
pub fn sanitize_condition(condition: &str) -> String {
    if is_simple_filter(condition) {
        condition.to_string()
    } else {
        if !condition.is_empty() {
            debug!(condition, "Replacing unsupported condition with TRUE");
        }
        PERMISSIVE_CONDITION.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_filter() {
        assert!(is_simple_filter(r#"crop="maize""#));
        assert!(is_simple_filter(r#"crop_name="Quinoa_2""#));
    }

    #[test]
    fn test_accepts_empty_identifier_and_literal() {
        assert!(is_simple_filter(r#"="""#));
    }

    #[test]
    fn test_rejects_unquoted_literal() {
        assert!(!is_simple_filter("crop=maize"));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(!is_simple_filter(""));
    }

    #[test]
    fn test_rejects_injection() {
        assert!(!is_simple_filter("1=1 OR 1=1"));
        assert!(!is_simple_filter(r#"crop="maize" OR 1=1"#));
        assert!(!is_simple_filter(r#"crop="maize"; DROP TABLE x"#));
        assert!(!is_simple_filter(r#"crop="ma ize""#));
        assert!(!is_simple_filter(r#"x crop="maize""#));
    }

    #[test]
    fn test_rejects_non_ascii_words() {
        assert!(!is_simple_filter(r#"crop="maïze""#));
        assert!(!is_simple_filter(r#"année="2005""#));
        assert_eq!(sanitize_condition(r#"crop="maïze""#), "TRUE");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_condition(r#"crop="maize""#), r#"crop="maize""#);
        assert_eq!(sanitize_condition("crop=maize"), "TRUE");
        assert_eq!(sanitize_condition(""), "TRUE");
    }
}
