//! Model gateway port
//!
//! Defines how the application layer reaches model providers. The
//! infrastructure request executor implements this behind the registry,
//! parameter adapter, retry loop, and per-provider concurrency limits;
//! use cases see exactly one call that yields one response or one typed
//! error.

use async_trait::async_trait;
use tutormesh_domain::{CompletionRequest, CompletionResponse, ProviderError};

/// Gateway for model completions
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Perform one completion. Provider/model resolution, parameter
    /// shaping, timeout, and retries all happen behind this call.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionResponse, ProviderError>;
}
