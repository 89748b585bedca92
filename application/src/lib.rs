//! Application layer for tutormesh
//!
//! This crate contains the use cases (session manager, router turn,
//! collaborative orchestrator) and the ports they depend on. Adapters for
//! the ports live in the infrastructure layer.

pub mod ports;
pub mod use_cases;

pub use ports::{
    model_gateway::ModelGateway,
    store::{StoreError, TutorStore},
    turn_audit::{NoAudit, TurnAuditLogger, TurnRecord},
};
pub use use_cases::{
    collaborate::CollaborativeOrchestrator,
    route::AgentRouter,
    tutor_service::{SendMessageError, SendMessageInput, TutorMessageResponse, TutorService},
};
