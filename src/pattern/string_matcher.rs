//! String pattern matching implementations

use crate::error::InterceptorError;
use crate::pattern::escape::escape_for_glob_cow;
use crate::pattern::traits::StringMatcher;
use glob::{MatchOptions, Pattern as GlobPattern};
use regex::Regex;
use std::sync::Arc;

/// Case-insensitive substring pattern (`LIKE`)
#[derive(Debug, Clone)]
pub struct LikePattern {
    /// The lower-cased token to look for
    pub token: Arc<str>,
}

impl LikePattern {
    /// Create a new substring pattern
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::from(token.to_lowercase()),
        }
    }
}

impl StringMatcher for LikePattern {
    fn string_match(&self, value: &str) -> bool {
        if self.token.is_empty() {
            return true;
        }
        if value.is_ascii() && self.token.is_ascii() {
            // Avoid allocating for the common ASCII case
            let needle = self.token.as_bytes();
            return value
                .as_bytes()
                .windows(needle.len())
                .any(|w| w.eq_ignore_ascii_case(needle));
        }
        value.to_lowercase().contains(&*self.token)
    }
}

/// Pattern for regular expression matching (`REGEX`, unanchored find)
#[derive(Debug, Clone)]
pub struct RegexPattern {
    /// The compiled regular expression
    pub regex: Regex,
}

impl StringMatcher for RegexPattern {
    fn string_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Pattern for whole-string wildcard matching (`GLOB`)
#[derive(Debug, Clone)]
pub struct GlobPatternMatcher {
    /// The compiled glob pattern
    pub glob: GlobPattern,
    /// Whether literal characters compare case-sensitively
    pub case_sensitive: bool,
}

impl GlobPatternMatcher {
    /// Compile an interceptor glob (`*` and `?` wildcards only)
    ///
    /// Case-insensitive globs are lower-cased here and compared against the
    /// lower-cased candidate, since the glob crate only folds ASCII.
    pub fn new(
        dimension: &str,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Self, InterceptorError> {
        let folded;
        let source = if case_sensitive {
            pattern
        } else {
            folded = pattern.to_lowercase();
            folded.as_str()
        };
        let escaped = escape_for_glob_cow(source);
        let glob = GlobPattern::new(&escaped).map_err(|e| {
            InterceptorError::invalid_pattern(
                dimension,
                pattern,
                format!("Invalid glob pattern: {}", e),
            )
        })?;
        Ok(Self {
            glob,
            case_sensitive,
        })
    }

    fn options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        }
    }
}

impl StringMatcher for GlobPatternMatcher {
    fn string_match(&self, value: &str) -> bool {
        if self.case_sensitive || value.is_ascii() {
            return self.glob.matches_with(value, self.options());
        }
        self.glob.matches_with(&value.to_lowercase(), self.options())
    }
}

/// Comma-separated glob list (OR logic), case-insensitive
///
/// Used for channel scope. Blank tokens are ignored, so an all-blank list is
/// empty; callers decide what an empty list means.
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    matchers: Vec<GlobPatternMatcher>,
}

impl GlobList {
    /// Parse a comma-separated list of globs
    pub fn parse(dimension: &str, csv: &str) -> Result<Self, InterceptorError> {
        let matchers = split_csv(csv)
            .map(|token| GlobPatternMatcher::new(dimension, token, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    /// Whether the list has no usable tokens
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Number of tokens in the list
    pub fn len(&self) -> usize {
        self.matchers.len()
    }
}

impl StringMatcher for GlobList {
    fn string_match(&self, value: &str) -> bool {
        self.matchers.iter().any(|m| m.string_match(value))
    }
}

/// Split a comma-separated list into trimmed, non-blank tokens
pub fn split_csv(csv: &str) -> impl Iterator<Item = &str> {
    csv.split(',').map(str::trim).filter(|t| !t.is_empty())
}
