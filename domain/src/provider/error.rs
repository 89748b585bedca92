//! Provider error taxonomy.
//!
//! Every failure on the gateway path is classified into one of these kinds.
//! The executor consults [`ProviderError::is_retryable`] to drive its retry
//! loop and [`ProviderError::affects_health`] to decide whether the failure
//! counts toward the provider's consecutive-failure counter.

use thiserror::Error;

/// Result type alias for provider gateway operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur when resolving or calling a model provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider is disabled: {0}")]
    ProviderDisabled(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid API key for provider {0}")]
    InvalidApiKey(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("Content filtered by provider: {0}")]
    ContentFiltered(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Should never surface: the parameter adapter drops unsupported
    /// parameters before the request is shaped.
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    #[error("Unknown provider error: {0}")]
    UnknownError(String),
}

impl ProviderError {
    /// Whether the executor may retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimitExceeded(_)
                | ProviderError::Timeout
                | ProviderError::ConnectionError(_)
                | ProviderError::UnknownError(_)
        )
    }

    /// Whether this failure counts toward the consecutive-failure counter.
    ///
    /// Resolution errors and caller mistakes (bad key, oversized context) say
    /// nothing about provider availability, so they are excluded.
    pub fn affects_health(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout
                | ProviderError::ConnectionError(_)
                | ProviderError::RateLimitExceeded(_)
                | ProviderError::UnknownError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ProviderError::Timeout.is_retryable());
        assert!(ProviderError::ConnectionError("refused".into()).is_retryable());
        assert!(ProviderError::RateLimitExceeded("429".into()).is_retryable());
        assert!(ProviderError::UnknownError("500".into()).is_retryable());
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(!ProviderError::InvalidApiKey("openai".into()).is_retryable());
        assert!(!ProviderError::ContextLengthExceeded("8k".into()).is_retryable());
        assert!(!ProviderError::ContentFiltered("policy".into()).is_retryable());
        assert!(!ProviderError::ProviderNotFound("acme".into()).is_retryable());
        assert!(!ProviderError::ModelNotFound("gpt-9".into()).is_retryable());
    }

    #[test]
    fn test_health_affecting_kinds() {
        assert!(ProviderError::Timeout.affects_health());
        assert!(ProviderError::ConnectionError("reset".into()).affects_health());
        assert!(ProviderError::RateLimitExceeded("429".into()).affects_health());
        assert!(!ProviderError::InvalidApiKey("openai".into()).affects_health());
        assert!(!ProviderError::ProviderDisabled("acme".into()).affects_health());
    }
}
