//! Ports (interfaces) for the application layer
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod model_gateway;
pub mod store;
pub mod turn_audit;
