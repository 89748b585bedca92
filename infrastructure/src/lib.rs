//! Infrastructure layer for tutormesh
//!
//! Adapters for the application ports: the provider registry, the request
//! executor (retry/timeout/concurrency/health bookkeeping), the periodic
//! health monitor, the HTTP chat backend, in-memory stores, the JSONL turn
//! audit logger, and TOML configuration loading.

pub mod backend;
pub mod config;
pub mod executor;
pub mod health;
pub mod logging;
pub mod registry;
pub mod store;

pub use backend::{ChatBackend, HttpChatBackend};
pub use config::{ConfigLoader, FileConfig};
pub use executor::RequestExecutor;
pub use health::HealthMonitor;
pub use logging::JsonlTurnAudit;
pub use registry::{ProviderRegistry, RegistryError};
pub use store::MemoryTutorStore;
