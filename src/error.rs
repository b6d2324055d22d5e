/// Error types for the interceptor engine
use thiserror::Error;

/// Main error type for interceptor engine operations
#[derive(Error, Debug)]
pub enum InterceptorError {
    /// A rule pattern failed validation
    #[error("Invalid {dimension} pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Rule dimension the pattern belongs to (message, nick, hostmask, channel)
        dimension: String,
        /// The offending pattern text
        pattern: String,
        /// Why the pattern was rejected
        reason: String,
    },

    /// A rule is structurally invalid
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Engine configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The ingestion pipeline has been shut down
    #[error("Ingestion pipeline is closed")]
    PipelineClosed,

    /// YAML parsing failed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterceptorError {
    /// Build an [`InterceptorError::InvalidPattern`]
    pub fn invalid_pattern(
        dimension: impl Into<String>,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            dimension: dimension.into(),
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from validating user-supplied definitions
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::InvalidRule(_))
    }
}

/// Result type alias for interceptor operations
pub type Result<T> = std::result::Result<T, InterceptorError>;

/// Error chain helper for adding context
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context with format
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for Result<T> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| prefix_error(msg.into(), e))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| prefix_error(f(), e))
    }
}

fn prefix_error(prefix: String, err: InterceptorError) -> InterceptorError {
    match err {
        InterceptorError::InvalidPattern {
            dimension,
            pattern,
            reason,
        } => InterceptorError::InvalidPattern {
            dimension,
            pattern,
            reason: format!("{}: {}", prefix, reason),
        },
        InterceptorError::InvalidRule(msg) => {
            InterceptorError::InvalidRule(format!("{}: {}", prefix, msg))
        }
        other => InterceptorError::InvalidConfiguration(format!("{}: {}", prefix, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InterceptorError::invalid_pattern("message", "(", "unclosed group");
        assert_eq!(
            err.to_string(),
            "Invalid message pattern '(': unclosed group"
        );

        let err = InterceptorError::InvalidConfiguration("queue_capacity must be > 0".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: queue_capacity must be > 0"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(InterceptorError::invalid_pattern("nick", "[", "bad").is_validation());
        assert!(InterceptorError::InvalidRule("x".into()).is_validation());
        assert!(!InterceptorError::PipelineClosed.is_validation());
    }

    #[test]
    fn test_error_context() {
        let result: Result<()> = Err(InterceptorError::InvalidRule("label".to_string()));
        let err = result.context("rule #2").unwrap_err();
        assert!(err.to_string().contains("rule #2: label"));

        let result: Result<()> = Err(InterceptorError::invalid_pattern("hostmask", "(", "bad"));
        let err = result.with_context(|| "rule 'spam'".to_string()).unwrap_err();
        assert!(matches!(err, InterceptorError::InvalidPattern { .. }));
        assert!(err.to_string().contains("rule 'spam': bad"));
    }
}
