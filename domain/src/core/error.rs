//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent is not active: {0}")]
    AgentInactive(String),

    #[error("No active agent selected for manual mode")]
    NoActiveAgent,

    #[error("No agents available for this turn")]
    NoAgents,

    #[error("All participating agents failed to respond")]
    AllAgentsFailed,

    #[error("Invalid interaction mode: {0}")]
    InvalidMode(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoAgents.is_cancelled());
        assert!(!DomainError::AllAgentsFailed.is_cancelled());
        assert!(!DomainError::AgentNotFound("socrates".to_string()).is_cancelled());
    }
}
