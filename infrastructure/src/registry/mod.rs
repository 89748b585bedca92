//! Provider registry: process-wide provider/model state.
//!
//! Explicitly constructed and passed by `Arc` — no ambient global — so tests
//! can instantiate isolated registries. All mutation goes through the write
//! lock; readers get cloned snapshots and never observe a half-applied
//! update.

use chrono::Utc;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{info, warn};
use tutormesh_domain::{HealthStatus, ModelConfig, ProviderConfig, ProviderError};

/// Errors raised when constructing or reloading a registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("More than one provider marked default: {0} and {1}")]
    MultipleDefaultProviders(String, String),

    #[error("Model {model} references unknown provider {provider}")]
    UnknownProviderForModel { model: String, provider: String },

    #[error("More than one default model for provider {0}")]
    MultipleDefaultModels(String),
}

struct Inner {
    providers: Vec<ProviderConfig>,
    models: Vec<ModelConfig>,
}

/// Registry of provider and model configurations.
pub struct ProviderRegistry {
    inner: RwLock<Inner>,
}

impl ProviderRegistry {
    /// Build a registry, validating the invariants: unique provider names,
    /// at most one default provider, at most one default model per provider,
    /// every model attached to a known provider.
    pub fn new(
        providers: Vec<ProviderConfig>,
        models: Vec<ModelConfig>,
    ) -> Result<Self, RegistryError> {
        Self::validate(&providers, &models)?;
        Ok(Self {
            inner: RwLock::new(Inner { providers, models }),
        })
    }

    /// Atomically replace the whole configuration. Health state and usage
    /// counters start fresh; a reload is a config event, not a merge.
    pub fn reload(
        &self,
        providers: Vec<ProviderConfig>,
        models: Vec<ModelConfig>,
    ) -> Result<(), RegistryError> {
        Self::validate(&providers, &models)?;
        let mut inner = self.inner.write().unwrap();
        inner.providers = providers;
        inner.models = models;
        info!("provider registry reloaded");
        Ok(())
    }

    fn validate(
        providers: &[ProviderConfig],
        models: &[ModelConfig],
    ) -> Result<(), RegistryError> {
        let mut default: Option<&str> = None;
        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.name == provider.name) {
                return Err(RegistryError::DuplicateProvider(provider.name.clone()));
            }
            if provider.is_default {
                if let Some(existing) = default {
                    return Err(RegistryError::MultipleDefaultProviders(
                        existing.to_string(),
                        provider.name.clone(),
                    ));
                }
                default = Some(&provider.name);
            }
        }
        for provider in providers {
            let defaults = models
                .iter()
                .filter(|m| m.provider == provider.name && m.is_default)
                .count();
            if defaults > 1 {
                return Err(RegistryError::MultipleDefaultModels(provider.name.clone()));
            }
        }
        for model in models {
            if !providers.iter().any(|p| p.name == model.provider) {
                return Err(RegistryError::UnknownProviderForModel {
                    model: model.id.clone(),
                    provider: model.provider.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve a (provider, model) pair for one request.
    ///
    /// A named provider is honored even when unhealthy; only the implicit
    /// default-resolution path skips unhealthy providers. With no name,
    /// the highest-priority enabled, usable provider wins, defaults first.
    pub fn resolve(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<(ProviderConfig, ModelConfig), ProviderError> {
        let inner = self.inner.read().unwrap();

        let provider_config = match provider {
            Some(name) => {
                let found = inner
                    .providers
                    .iter()
                    .find(|p| p.name == name)
                    .ok_or_else(|| ProviderError::ProviderNotFound(name.to_string()))?;
                if !found.enabled {
                    return Err(ProviderError::ProviderDisabled(name.to_string()));
                }
                found.clone()
            }
            None => {
                let mut candidates: Vec<&ProviderConfig> = inner
                    .providers
                    .iter()
                    .filter(|p| p.enabled && p.health.status.is_usable())
                    .collect();
                candidates.sort_by(|a, b| {
                    b.is_default
                        .cmp(&a.is_default)
                        .then(a.priority.cmp(&b.priority))
                        .then(a.name.cmp(&b.name))
                });
                candidates
                    .first()
                    .ok_or_else(|| {
                        ProviderError::ProviderNotFound("no enabled provider".to_string())
                    })?
                    .to_owned()
                    .clone()
            }
        };

        let provider_models: Vec<&ModelConfig> = inner
            .models
            .iter()
            .filter(|m| m.provider == provider_config.name)
            .collect();
        let model_config = match model {
            Some(id) => provider_models
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| ProviderError::ModelNotFound(id.to_string()))?
                .to_owned()
                .clone(),
            None => provider_models
                .iter()
                .find(|m| m.is_default)
                .or_else(|| provider_models.first())
                .ok_or_else(|| {
                    ProviderError::ModelNotFound(format!(
                        "provider {} has no models",
                        provider_config.name
                    ))
                })?
                .to_owned()
                .clone(),
        };

        Ok((provider_config, model_config))
    }

    /// Enable or disable a provider.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ProviderError> {
        let mut inner = self.inner.write().unwrap();
        let provider = inner
            .providers
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ProviderError::ProviderNotFound(name.to_string()))?;
        provider.enabled = enabled;
        Ok(())
    }

    /// Move the default flag to `name`. The single-default invariant holds
    /// at every point a reader can observe: both flags flip under one write
    /// lock.
    pub fn set_default(&self, name: &str) -> Result<(), ProviderError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.providers.iter().any(|p| p.name == name) {
            return Err(ProviderError::ProviderNotFound(name.to_string()));
        }
        for provider in inner.providers.iter_mut() {
            provider.is_default = provider.name == name;
        }
        Ok(())
    }

    /// Record a successful call: health restored, usage folded in.
    pub fn record_success(
        &self,
        provider: &str,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        latency_ms: u64,
    ) {
        let mut inner = self.inner.write().unwrap();
        if let Some(p) = inner.providers.iter_mut().find(|p| p.name == provider) {
            p.health.record_success(Utc::now());
            p.usage.record(prompt_tokens, completion_tokens, latency_ms);
        }
        if let Some(m) = inner
            .models
            .iter_mut()
            .find(|m| m.provider == provider && m.id == model)
        {
            m.usage.record(prompt_tokens, completion_tokens, latency_ms);
        }
    }

    /// Record a health-affecting terminal failure; logs the transition when
    /// the consecutive-failure threshold is crossed.
    pub fn record_failure(&self, provider: &str, error: &ProviderError) {
        if !error.affects_health() {
            return;
        }
        let mut inner = self.inner.write().unwrap();
        if let Some(p) = inner.providers.iter_mut().find(|p| p.name == provider) {
            let threshold = p.limits.unhealthy_threshold;
            if p.health.record_failure(error.to_string(), threshold) {
                warn!(provider, failures = p.health.consecutive_failures, "provider marked unhealthy");
            }
        }
    }

    /// Mark a health probe as started.
    pub fn begin_health_check(&self, provider: &str) {
        let mut inner = self.inner.write().unwrap();
        if let Some(p) = inner.providers.iter_mut().find(|p| p.name == provider) {
            p.health.begin_check(Utc::now());
        }
    }

    /// Apply a probe result.
    pub fn apply_probe(&self, provider: &str, result: Result<(), String>) {
        let mut inner = self.inner.write().unwrap();
        if let Some(p) = inner.providers.iter_mut().find(|p| p.name == provider) {
            match result {
                Ok(()) => {
                    let was = p.health.status;
                    p.health.record_success(Utc::now());
                    if was == HealthStatus::Unhealthy {
                        info!(provider, "provider recovered");
                    }
                }
                Err(error) => {
                    // A failed probe flips health directly; retries are a
                    // request-path concern.
                    p.health.record_failure(error, 1);
                    p.health.last_check = Some(Utc::now());
                }
            }
        }
    }

    /// Cloned snapshot of all providers, for display and telemetry.
    pub fn providers(&self) -> Vec<ProviderConfig> {
        self.inner.read().unwrap().providers.clone()
    }

    /// Cloned snapshot of all models.
    pub fn models(&self) -> Vec<ModelConfig> {
        self.inner.read().unwrap().models.clone()
    }
}
