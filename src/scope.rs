//! Scope resolution: which events an interceptor considers at all

use crate::error::Result;
use crate::event::ChatEvent;
use crate::pattern::{
    safe_regex_compile_case_insensitive, split_csv, GlobList, LikePattern, MatchMode, RegexPattern,
    StringMatcher,
};
use crate::rule::{CompiledInterceptor, InterceptorDefinition};

/// One side (include or exclude) of a channel scope
#[derive(Debug, Clone)]
pub enum ChannelFilter {
    /// Every channel
    Any,
    /// No channel
    Nothing,
    /// Comma-separated globs, case-insensitive, OR across tokens
    Globs(GlobList),
    /// Comma-separated substrings, case-insensitive, OR across tokens
    Like(Vec<LikePattern>),
    /// Case-insensitive regex, unanchored
    Regex(RegexPattern),
}

impl ChannelFilter {
    /// Compile a filter; `blank` is what an empty pattern list stands for
    fn compile(
        dimension: &str,
        mode: MatchMode,
        pattern: &str,
        blank: ChannelFilter,
    ) -> Result<Self> {
        let filter = match mode {
            MatchMode::All => ChannelFilter::Any,
            MatchMode::None => ChannelFilter::Nothing,
            MatchMode::Glob => {
                let globs = GlobList::parse(dimension, pattern)?;
                if globs.is_empty() {
                    blank
                } else {
                    ChannelFilter::Globs(globs)
                }
            }
            MatchMode::Like => {
                let tokens: Vec<LikePattern> = split_csv(pattern).map(LikePattern::new).collect();
                if tokens.is_empty() {
                    blank
                } else {
                    ChannelFilter::Like(tokens)
                }
            }
            MatchMode::Regex => {
                if pattern.trim().is_empty() {
                    blank
                } else {
                    ChannelFilter::Regex(RegexPattern {
                        regex: safe_regex_compile_case_insensitive(dimension, pattern)?,
                    })
                }
            }
        };
        Ok(filter)
    }

    /// Whether the channel is selected by this filter
    pub fn matches(&self, channel: &str) -> bool {
        match self {
            ChannelFilter::Any => true,
            ChannelFilter::Nothing => false,
            ChannelFilter::Globs(globs) => globs.string_match(channel),
            ChannelFilter::Like(tokens) => tokens.iter().any(|t| t.string_match(channel)),
            ChannelFilter::Regex(re) => re.string_match(channel),
        }
    }
}

/// Compiled channel include/exclude pair of a definition
#[derive(Debug, Clone)]
pub struct ChannelScope {
    include: ChannelFilter,
    exclude: ChannelFilter,
}

impl ChannelScope {
    /// Compile the channel scope of a definition
    ///
    /// A blank include list selects every channel; a blank exclude list
    /// removes none.
    pub fn compile(definition: &InterceptorDefinition) -> Result<Self> {
        Ok(Self {
            include: ChannelFilter::compile(
                "channel include",
                definition.channel_include_mode,
                &definition.channel_include_pattern,
                ChannelFilter::Any,
            )?,
            exclude: ChannelFilter::compile(
                "channel exclude",
                definition.channel_exclude_mode,
                &definition.channel_exclude_pattern,
                ChannelFilter::Nothing,
            )?,
        })
    }

    /// Scope selecting every channel
    pub fn unrestricted() -> Self {
        Self {
            include: ChannelFilter::Any,
            exclude: ChannelFilter::Nothing,
        }
    }

    /// Include filter
    pub fn include(&self) -> &ChannelFilter {
        &self.include
    }

    /// Exclude filter
    pub fn exclude(&self) -> &ChannelFilter {
        &self.exclude
    }

    /// Included and not excluded; exclude wins when both select the channel
    pub fn contains(&self, channel: &str) -> bool {
        self.include.matches(channel) && !self.exclude.matches(channel)
    }
}

/// Whether the definition listens to events from `server_id`
pub fn server_in_scope(definition: &InterceptorDefinition, server_id: &str) -> bool {
    definition.is_any_server() || definition.server_id == server_id
}

/// Whether an event falls within an interceptor's scope
///
/// Disabled interceptors are never in scope.
pub fn in_scope(interceptor: &CompiledInterceptor, event: &ChatEvent) -> bool {
    let definition = interceptor.definition();
    definition.enabled
        && server_in_scope(definition, &event.server_id)
        && interceptor.channels().contains(&event.channel)
}
