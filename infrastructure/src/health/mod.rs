//! Background provider health probing.
//!
//! The monitor wakes periodically, finds providers whose check interval has
//! elapsed, and sends each a one-token probe through the wire backend. Probe
//! outcomes feed straight into the registry, so an unhealthy provider
//! re-enters default resolution as soon as a probe succeeds.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tutormesh_domain::{ChatMessage, ModelConfig, ProviderConfig, ShapedRequest};

use crate::backend::ChatBackend;
use crate::registry::ProviderRegistry;

/// How often the monitor scans for due providers. Each provider still
/// honors its own `health_check_interval_ms` between actual probes.
const SCAN_INTERVAL: Duration = Duration::from_secs(5);

pub struct HealthMonitor<B> {
    registry: Arc<ProviderRegistry>,
    backend: Arc<B>,
}

impl<B: ChatBackend + 'static> HealthMonitor<B> {
    pub fn new(registry: Arc<ProviderRegistry>, backend: Arc<B>) -> Self {
        Self { registry, backend }
    }

    /// Run the scan loop until the token is cancelled.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(SCAN_INTERVAL) => self.scan().await,
                }
            }
        })
    }

    /// Probe every due provider once. Exposed for direct use in tests and
    /// for an eager first check at startup.
    pub async fn scan(&self) {
        let models = self.registry.models();
        for provider in self.registry.providers() {
            if !is_due(&provider) {
                continue;
            }
            let Some(model) = default_model_for(&models, &provider.name) else {
                debug!(provider = %provider.name, "no model to probe with, skipping");
                continue;
            };
            self.registry.begin_health_check(&provider.name);
            let result = self.probe(&provider, model).await;
            self.registry.apply_probe(&provider.name, result);
        }
    }

    async fn probe(&self, provider: &ProviderConfig, model: &ModelConfig) -> Result<(), String> {
        let request = probe_request(model);
        let timeout = Duration::from_millis(provider.limits.request_timeout_ms);
        let outcome = tokio::time::timeout(timeout, self.backend.send(provider, model, &request))
            .await
            .unwrap_or(Err(tutormesh_domain::ProviderError::Timeout));
        match outcome {
            Ok(_) => Ok(()),
            Err(error) => Err(error.to_string()),
        }
    }
}

fn is_due(provider: &ProviderConfig) -> bool {
    if !provider.enabled || !provider.limits.health_checks_enabled {
        return false;
    }
    match provider.health.last_check {
        None => true,
        Some(last) => {
            let elapsed = Utc::now().signed_duration_since(last);
            elapsed.num_milliseconds() >= provider.limits.health_check_interval_ms as i64
        }
    }
}

fn default_model_for<'a>(models: &'a [ModelConfig], provider: &str) -> Option<&'a ModelConfig> {
    models
        .iter()
        .filter(|m| m.provider == provider)
        .max_by_key(|m| m.is_default)
}

fn probe_request(model: &ModelConfig) -> ShapedRequest {
    let mut params = serde_json::Map::new();
    let key = if model.is_reasoning() {
        "max_completion_tokens"
    } else {
        "max_tokens"
    };
    params.insert(key.to_string(), serde_json::json!(1));
    ShapedRequest {
        messages: vec![ChatMessage::user("ping")],
        params,
        dropped: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tutormesh_domain::{
        Choice, CompletionResponse, FinishReason, HealthStatus, ProviderError, ProviderKind,
        TokenUsage,
    };

    struct ProbeBackend {
        healthy: AtomicBool,
        probes: AtomicU32,
    }

    impl ProbeBackend {
        fn new(healthy: bool) -> Self {
            Self {
                healthy: AtomicBool::new(healthy),
                probes: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ProbeBackend {
        async fn send(
            &self,
            provider: &ProviderConfig,
            model: &ModelConfig,
            _request: &ShapedRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(ProviderError::ConnectionError("refused".to_string()));
            }
            Ok(CompletionResponse {
                choices: vec![Choice {
                    message: ChatMessage::assistant("pong"),
                    finish_reason: FinishReason::Stop,
                }],
                usage: TokenUsage::default(),
                latency_ms: 5,
                provider: provider.name.clone(),
                model: model.id.clone(),
            })
        }
    }

    fn registry() -> Arc<ProviderRegistry> {
        let provider =
            ProviderConfig::new("openai", ProviderKind::OpenAi, "http://localhost").with_default(true);
        let model = ModelConfig::new("openai", "gpt-4.1").with_default(true);
        Arc::new(ProviderRegistry::new(vec![provider], vec![model]).unwrap())
    }

    #[tokio::test]
    async fn test_successful_probe_marks_healthy() {
        let registry = registry();
        let monitor = HealthMonitor::new(registry.clone(), Arc::new(ProbeBackend::new(true)));
        monitor.scan().await;
        assert_eq!(registry.providers()[0].health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_failed_probe_marks_unhealthy() {
        let registry = registry();
        let monitor = HealthMonitor::new(registry.clone(), Arc::new(ProbeBackend::new(false)));
        monitor.scan().await;
        let health = registry.providers()[0].health.clone();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.last_error.is_some());
    }

    #[tokio::test]
    async fn test_probe_recovers_unhealthy_provider() {
        let registry = registry();
        let backend = Arc::new(ProbeBackend::new(false));
        let monitor = HealthMonitor::new(registry.clone(), backend.clone());
        monitor.scan().await;
        assert_eq!(
            registry.providers()[0].health.status,
            HealthStatus::Unhealthy
        );

        backend.healthy.store(true, Ordering::SeqCst);
        // Force the interval to have elapsed by resetting last_check.
        let mut providers = registry.providers();
        providers[0].health.last_check = None;
        let models = registry.models();
        registry.reload(providers, models).unwrap();

        monitor.scan().await;
        assert_eq!(registry.providers()[0].health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_provider_not_due_is_skipped() {
        let registry = registry();
        let backend = Arc::new(ProbeBackend::new(true));
        let monitor = HealthMonitor::new(registry.clone(), backend.clone());
        monitor.scan().await;
        monitor.scan().await;
        // Second scan falls inside health_check_interval_ms.
        assert_eq!(backend.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_checks_never_probe() {
        let mut provider =
            ProviderConfig::new("local", ProviderKind::Ollama, "http://localhost:11434");
        provider.limits.health_checks_enabled = false;
        let model = ModelConfig::new("local", "llama3");
        let registry = Arc::new(ProviderRegistry::new(vec![provider], vec![model]).unwrap());
        let backend = Arc::new(ProbeBackend::new(true));
        let monitor = HealthMonitor::new(registry, backend.clone());
        monitor.scan().await;
        assert_eq!(backend.probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_probe_request_uses_reasoning_token_key() {
        let standard = probe_request(&ModelConfig::new("openai", "gpt-4.1"));
        assert!(standard.params.contains_key("max_tokens"));
        let reasoning = probe_request(&ModelConfig::new("openai", "o3-mini"));
        assert!(reasoning.params.contains_key("max_completion_tokens"));
    }
}
