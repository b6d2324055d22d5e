//! Guarded regex compilation
//!
//! User-authored patterns are compiled once at save time with hard limits on
//! pattern length and automaton size, so a single rule cannot balloon the
//! worker's memory.

use crate::error::InterceptorError;
use regex::Regex;

/// Maximum regex pattern length
const MAX_REGEX_PATTERN_LENGTH: usize = 1000;

/// Maximum DFA size limit (2 MB)
const MAX_DFA_SIZE: usize = 2 * 1024 * 1024;

/// Maximum NFA size limit (10 MB)
const MAX_NFA_SIZE: usize = 10 * 1024 * 1024;

/// Validate and compile a regex pattern for the given rule dimension
pub fn safe_regex_compile(dimension: &str, pattern: &str) -> Result<Regex, InterceptorError> {
    compile_guarded(dimension, pattern, false)
}

/// Like [`safe_regex_compile`], ignoring case (used for channel names)
pub fn safe_regex_compile_case_insensitive(
    dimension: &str,
    pattern: &str,
) -> Result<Regex, InterceptorError> {
    compile_guarded(dimension, pattern, true)
}

fn compile_guarded(
    dimension: &str,
    pattern: &str,
    case_insensitive: bool,
) -> Result<Regex, InterceptorError> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(InterceptorError::invalid_pattern(
            dimension,
            pattern,
            format!(
                "Pattern too long: {} characters (max: {})",
                pattern.len(),
                MAX_REGEX_PATTERN_LENGTH
            ),
        ));
    }

    regex::RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .dfa_size_limit(MAX_DFA_SIZE)
        .size_limit(MAX_NFA_SIZE)
        .build()
        .map_err(|e| {
            InterceptorError::invalid_pattern(
                dimension,
                pattern,
                format!("Regex compilation failed: {}", e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_patterns() {
        let safe_patterns = [
            r"(damn|heck)",
            r"^start",
            r"end$",
            r"[a-zA-Z]+",
            r"(?i)case_insensitive",
        ];

        for pattern in &safe_patterns {
            assert!(
                safe_regex_compile("message", pattern).is_ok(),
                "pattern should compile: {}",
                pattern
            );
        }
    }

    #[test]
    fn test_invalid_pattern_is_descriptive() {
        let err = safe_regex_compile("nick", "(unclosed").unwrap_err();
        match err {
            InterceptorError::InvalidPattern {
                dimension,
                pattern,
                reason,
            } => {
                assert_eq!(dimension, "nick");
                assert_eq!(pattern, "(unclosed");
                assert!(reason.contains("Regex compilation failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_case_insensitive_variant() {
        let re = safe_regex_compile_case_insensitive("channel", "^#ops").unwrap();
        assert!(re.is_match("#OPS-team"));
        let re = safe_regex_compile("channel", "^#ops").unwrap();
        assert!(!re.is_match("#OPS-team"));
    }

    #[test]
    fn test_pattern_length_limit() {
        let long_pattern = "a".repeat(MAX_REGEX_PATTERN_LENGTH + 1);
        let err = safe_regex_compile("message", &long_pattern).unwrap_err();
        assert!(err.to_string().contains("Pattern too long"));
    }
}
