//! Pattern matching for interceptor rule dimensions

pub mod escape;
pub mod factory;
pub mod security;
pub mod string_matcher;
pub mod traits;

pub use escape::escape_for_glob;
pub use factory::*;
pub use security::{safe_regex_compile, safe_regex_compile_case_insensitive};
pub use string_matcher::*;
pub use traits::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Matching strategy applied to one rule dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMode {
    /// Always matches, pattern ignored
    #[default]
    All,
    /// Never matches, pattern ignored
    None,
    /// Case-insensitive substring
    Like,
    /// Whole-string wildcard (`*`, `?`)
    Glob,
    /// Regular expression, unanchored
    Regex,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "ALL",
            Self::None => "NONE",
            Self::Like => "LIKE",
            Self::Glob => "GLOB",
            Self::Regex => "REGEX",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_mode_serde() {
        assert_eq!(serde_json::to_string(&MatchMode::Regex).unwrap(), "\"REGEX\"");
        let mode: MatchMode = serde_json::from_str("\"GLOB\"").unwrap();
        assert_eq!(mode, MatchMode::Glob);
        assert_eq!(MatchMode::default(), MatchMode::All);
    }
}
