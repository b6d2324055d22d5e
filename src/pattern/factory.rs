//! Factory functions for compiling `(mode, pattern)` pairs

use crate::error::InterceptorError;
use crate::pattern::{
    security::safe_regex_compile,
    string_matcher::{GlobPatternMatcher, LikePattern, RegexPattern},
    traits::StringMatcher,
    MatchMode,
};
use tracing::warn;

/// A validated, ready-to-run matcher for one rule dimension
///
/// Only constructible through [`compile_matcher`], so a `Regex` variant always
/// holds a compiled expression.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// Always matches
    All,
    /// Never matches
    None,
    /// Case-insensitive substring
    Like(LikePattern),
    /// Case-sensitive whole-string wildcard
    Glob(GlobPatternMatcher),
    /// Unanchored regular expression
    Regex(RegexPattern),
}

impl PatternMatcher {
    /// The mode this matcher was compiled from
    ///
    /// Blank `LIKE`/`GLOB`/`REGEX` patterns compile down to `All`.
    pub fn mode(&self) -> MatchMode {
        match self {
            Self::All => MatchMode::All,
            Self::None => MatchMode::None,
            Self::Like(_) => MatchMode::Like,
            Self::Glob(_) => MatchMode::Glob,
            Self::Regex(_) => MatchMode::Regex,
        }
    }
}

impl StringMatcher for PatternMatcher {
    fn string_match(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Like(p) => p.string_match(value),
            Self::Glob(p) => p.string_match(value),
            Self::Regex(p) => p.string_match(value),
        }
    }
}

/// Compile a `(mode, pattern)` pair for the named rule dimension
///
/// A blank pattern under `LIKE`, `GLOB` or `REGEX` yields [`PatternMatcher::All`];
/// `NONE` ignores the pattern entirely. A non-blank pattern is compiled as
/// given, surrounding whitespace included.
pub fn compile_matcher(
    dimension: &str,
    mode: MatchMode,
    pattern: &str,
) -> Result<PatternMatcher, InterceptorError> {
    let blank = pattern.trim().is_empty();
    let matcher = match mode {
        MatchMode::All => PatternMatcher::All,
        MatchMode::None => PatternMatcher::None,
        _ if blank => PatternMatcher::All,
        MatchMode::Like => PatternMatcher::Like(LikePattern::new(pattern)),
        MatchMode::Glob => {
            PatternMatcher::Glob(GlobPatternMatcher::new(dimension, pattern, true)?)
        }
        MatchMode::Regex => PatternMatcher::Regex(RegexPattern {
            regex: safe_regex_compile(dimension, pattern)?,
        }),
    };
    Ok(matcher)
}

/// One-shot match of `candidate` against `(mode, pattern)`
///
/// Compiles on every call; rule evaluation uses the compiled form instead.
/// An uncompilable pattern never matches.
pub fn matches(mode: MatchMode, pattern: &str, candidate: &str) -> bool {
    match compile_matcher("pattern", mode, pattern) {
        Ok(matcher) => matcher.string_match(candidate),
        Err(e) => {
            warn!(error = %e, "Ignoring invalid pattern");
            false
        }
    }
}
