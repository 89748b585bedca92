//! Request execution pipeline.
//!
//! [`RequestExecutor`] is the concrete [`ModelGateway`]: it resolves the
//! target through the registry, shapes the request for that target, queues
//! behind the provider's concurrency gate, and drives the attempt/retry
//! loop with exponential backoff. Health and usage bookkeeping flow back
//! into the registry so resolution sees the consequences of every call.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use tutormesh_application::ModelGateway;
use tutormesh_domain::{
    shape_request, CompletionRequest, CompletionResponse, ModelConfig, ProviderConfig,
    ProviderError, ProviderLimits, ShapedRequest,
};

use crate::backend::ChatBackend;
use crate::registry::ProviderRegistry;

/// Base delay before retry number `attempt` (zero-based), without jitter.
fn base_backoff_delay(limits: &ProviderLimits, attempt: u32) -> Duration {
    let factor = limits.backoff_multiplier.powi(attempt as i32);
    Duration::from_millis((limits.retry_delay_ms as f64 * factor) as u64)
}

fn jitter(limits: &ProviderLimits) -> Duration {
    let cap = (limits.retry_delay_ms / 4).max(1);
    Duration::from_millis(rand::thread_rng().gen_range(0..cap))
}

/// Gateway adapter over a [`ChatBackend`] with per-provider queueing,
/// timeouts and retries.
pub struct RequestExecutor<B> {
    registry: Arc<ProviderRegistry>,
    backend: B,
    // Permits are handed out in FIFO order, so a burst of turns queues
    // fairly behind the provider's concurrency limit.
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl<B: ChatBackend> RequestExecutor<B> {
    pub fn new(registry: Arc<ProviderRegistry>, backend: B) -> Self {
        Self {
            registry,
            backend,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    fn gate(&self, provider: &ProviderConfig) -> Arc<Semaphore> {
        let mut gates = self.gates.lock().unwrap();
        gates
            .entry(provider.name.clone())
            .or_insert_with(|| {
                Arc::new(Semaphore::new(provider.limits.concurrency_limit.max(1)))
            })
            .clone()
    }

    async fn attempt_loop(
        &self,
        provider: &ProviderConfig,
        model: &ModelConfig,
        shaped: &ShapedRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let limits = &provider.limits;
        let per_attempt = Duration::from_millis(limits.request_timeout_ms);
        let mut last_error = ProviderError::UnknownError("no attempt made".to_string());

        for attempt in 0..=limits.max_retries {
            if attempt > 0 {
                let delay = base_backoff_delay(limits, attempt - 1) + jitter(limits);
                debug!(
                    provider = %provider.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = tokio::time::timeout(per_attempt, self.backend.send(provider, model, shaped))
                .await
                .unwrap_or(Err(ProviderError::Timeout));

            match outcome {
                Ok(response) => {
                    self.registry.record_success(
                        &provider.name,
                        &model.id,
                        response.usage.prompt_tokens,
                        response.usage.completion_tokens,
                        response.latency_ms,
                    );
                    return Ok(response);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        self.registry.record_failure(&provider.name, &error);
                        return Err(error);
                    }
                    warn!(
                        provider = %provider.name,
                        model = %model.id,
                        attempt,
                        %error,
                        "attempt failed"
                    );
                    last_error = error;
                }
            }
        }

        self.registry.record_failure(&provider.name, &last_error);
        Err(last_error)
    }

    async fn execute(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let (provider, model) = self
            .registry
            .resolve(request.provider.as_deref(), request.model.as_deref())?;
        let shaped = shape_request(&request, &provider, &model);
        if !shaped.dropped.is_empty() {
            debug!(
                provider = %provider.name,
                model = %model.id,
                dropped = ?shaped.dropped,
                "unsupported parameters dropped"
            );
        }

        let gate = self.gate(&provider);
        let _permit = gate
            .acquire()
            .await
            .map_err(|_| ProviderError::UnknownError("provider gate closed".to_string()))?;

        self.attempt_loop(&provider, &model, &shaped).await
    }
}

#[async_trait]
impl<B: ChatBackend> ModelGateway for RequestExecutor<B> {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        match request.deadline {
            // The deadline covers queue wait and every retry.
            Some(deadline) => tokio::time::timeout(deadline, self.execute(request))
                .await
                .unwrap_or(Err(ProviderError::Timeout)),
            None => self.execute(request).await,
        }
    }
}
