//! Domain layer for tutormesh
//!
//! This crate contains the core business logic, entities, and value objects
//! for the provider gateway and tutoring orchestrator. It has no dependencies
//! on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Providers and models
//!
//! A **provider** is an external model backend (cloud or local inference
//! service) with its own API shape and capabilities. A **model** is one
//! addressable model exposed by a provider. The [`provider::params`] support
//! matrix is the load-bearing piece of provider abstraction: it decides,
//! per provider kind and parameter, what survives into the shaped request.
//!
//! ## Agents, sessions, conversations
//!
//! A **tutor agent** is a persona (system prompt + generation defaults),
//! independent of which provider serves it. A **session** is the per-user
//! container holding the interaction mode; a **conversation** is the message
//! history for one (session, agent) pairing.
//!
//! ## Interaction modes
//!
//! - **Manual**: the user's active agent answers every turn
//! - **Router**: a scoring strategy picks one agent per turn
//! - **Collaborative**: several agents contribute under a style
//!   (parallel / sequential / debate / random subset)
//! - **Random**: one seeded-random active agent per turn

pub mod agent;
pub mod collab;
pub mod core;
pub mod prompt;
pub mod provider;
pub mod routing;
pub mod session;

// Re-export commonly used types
pub use agent::{
    directory::AgentDirectory,
    entities::{AgentId, TutorAgent},
};
pub use collab::{
    contribution::{AgentContribution, CollaborativeInfo},
    settings::{CollaborationStyle, CollaborativeSettings},
};
pub use core::error::DomainError;
pub use provider::{
    config::{
        Capabilities, GenerationParams, ModelConfig, ProviderConfig, ProviderKind, ProviderLimits,
    },
    error::ProviderError,
    health::{HealthState, HealthStatus},
    params::{Param, ShapedRequest, shape_request},
    request::{
        ChatMessage, Choice, CompletionRequest, CompletionResponse, FinishReason, Role, TokenUsage,
    },
    usage::UsageCounters,
};
pub use routing::{
    decision::{AgentScore, RouteDecision, RouteReason},
    scorer::{AgentScorer, KeywordScorer, select_agent},
};
pub use session::entities::{
    InteractionMode, MessageKind, TutorConversation, TutorMessage, TutorSession,
};

pub use prompt::template::TutorPromptTemplate;
