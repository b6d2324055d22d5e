//! Escape handling for interceptor glob patterns
//!
//! Interceptor globs only know two wildcards: `*` (any run, including empty)
//! and `?` (exactly one character). Everything else, including the glob
//! crate's bracket classes, has to match literally.

use std::borrow::Cow;

const GLOB_WILDCARD: char = '*';
const GLOB_SINGLE: char = '?';
const GLOB_SQR_BRKT_LEFT: char = '[';
const GLOB_SQR_BRKT_RIGHT: char = ']';

/// Escape an interceptor glob for the `glob` crate (zero-copy when no escaping needed)
///
/// Runs of `*` are collapsed to one, since `**` has a path-recursive meaning
/// in the glob crate and is rejected when it is not a whole path component.
pub fn escape_for_glob_cow(s: &str) -> Cow<'_, str> {
    let needs_escaping = s.contains([GLOB_SQR_BRKT_LEFT, GLOB_SQR_BRKT_RIGHT]) || s.contains("**");
    if !needs_escaping {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    let mut prev_wildcard = false;
    for ch in s.chars() {
        match ch {
            GLOB_WILDCARD => {
                if !prev_wildcard {
                    out.push(ch);
                }
                prev_wildcard = true;
                continue;
            }
            GLOB_SQR_BRKT_LEFT => out.push_str("[[]"),
            GLOB_SQR_BRKT_RIGHT => out.push_str("[]]"),
            _ => out.push(ch),
        }
        prev_wildcard = false;
    }
    Cow::Owned(out)
}

/// Escape an interceptor glob for the `glob` crate (always allocates)
pub fn escape_for_glob(s: &str) -> String {
    escape_for_glob_cow(s).into_owned()
}

/// Whether the pattern uses any wildcard at all
pub fn has_wildcards(s: &str) -> bool {
    s.contains([GLOB_WILDCARD, GLOB_SINGLE])
}
