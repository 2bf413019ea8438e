//! The offline cache controller.
//!
//! One controller instance owns the cache store and the network backend
//! and dispatches worker lifecycle events: install pre-caches the
//! manifest, activate sweeps superseded generations, fetch runs a request
//! through its retrieval policy, and a recognized message forces
//! activation.
//!
//! Requests are independent tasks; the store provides per-key atomicity
//! and population is last-writer-wins, so no coordination happens here.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;

use crate::classify::{ClassifyRules, classify};
use crate::fetch::{FetchOutcome, FetchResponse, HttpBackend, resolve};
use crate::policy::Policy;
use crate::request::WorkerRequest;
use crate::response::{ServedFrom, WorkerResponse, entry_from_response};
use lantern_core::cache::key::compute_cache_key;
use lantern_core::{AppConfig, CacheEntry, CacheStore, Error};

/// Worker lifecycle events the controller understands.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(WorkerRequest),
    Message(String),
}

/// Commands recognized inside message events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Activate immediately instead of waiting for the host's own
    /// activate event.
    SkipWaiting,
}

impl WorkerCommand {
    /// Parse a raw message payload. Unrecognized payloads yield None and
    /// are ignored by dispatch.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "SKIP_WAITING" => Some(WorkerCommand::SkipWaiting),
            _ => None,
        }
    }
}

/// Result of dispatching one lifecycle event.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(SweepReport),
    Response(WorkerResponse),
    Ignored,
}

/// Outcome of the install pre-cache pass.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub requested: usize,
    pub cached: usize,
    pub failures: Vec<InstallFailure>,
}

/// One manifest asset that could not be pre-cached.
#[derive(Debug, Clone, Serialize)]
pub struct InstallFailure {
    pub path: String,
    pub reason: String,
}

/// Generations removed by an activation sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub removed: Vec<String>,
}

/// The offline cache controller.
pub struct Controller {
    store: CacheStore,
    backend: Arc<dyn HttpBackend>,
    config: AppConfig,
    rules: ClassifyRules,
    static_generation: String,
    dynamic_generation: String,
    /// Lookup order for cache reads: static first, then dynamic.
    search_order: Vec<String>,
    /// Key of the reserved offline fallback document.
    offline_key: String,
}

impl Controller {
    /// Build a controller from configuration, an opened store, and a
    /// network backend.
    pub fn new(config: AppConfig, store: CacheStore, backend: Arc<dyn HttpBackend>) -> Result<Self, Error> {
        let rules = ClassifyRules {
            api_prefixes: config.api_prefixes.clone(),
            static_prefix: config.static_prefix.clone(),
        };
        let static_generation = config.static_generation();
        let dynamic_generation = config.dynamic_generation();
        let search_order = vec![static_generation.clone(), dynamic_generation.clone()];

        let offline_url =
            resolve(&config.origin, &config.offline_path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let offline_key = compute_cache_key(Method::GET.as_str(), offline_url.as_str());

        Ok(Self {
            store,
            backend,
            config,
            rules,
            static_generation,
            dynamic_generation,
            search_order,
            offline_key,
        })
    }

    /// Dispatch one lifecycle event.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install => Ok(EventOutcome::Installed(self.install().await)),
            WorkerEvent::Activate => Ok(EventOutcome::Activated(self.activate().await?)),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Response(self.handle(&request).await)),
            WorkerEvent::Message(raw) => match WorkerCommand::parse(&raw) {
                Some(WorkerCommand::SkipWaiting) => Ok(EventOutcome::Activated(self.activate().await?)),
                None => {
                    tracing::debug!(message = %raw, "ignoring unrecognized message");
                    Ok(EventOutcome::Ignored)
                }
            },
        }
    }

    /// Pre-cache every manifest asset into the static generation.
    ///
    /// Best-effort per asset: a failed fetch or store is recorded in the
    /// report and the remaining assets still install.
    pub async fn install(&self) -> InstallReport {
        let mut report = InstallReport {
            requested: self.config.precache_manifest.len(),
            cached: 0,
            failures: Vec::new(),
        };

        for path in &self.config.precache_manifest {
            let url = match resolve(&self.config.origin, path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "skipping unresolvable manifest path");
                    report.failures.push(InstallFailure { path: path.clone(), reason: e.to_string() });
                    continue;
                }
            };

            let request = WorkerRequest::get(url);
            match self.backend.execute(&request).await {
                FetchOutcome::Response(response) if response.status == StatusCode::OK => {
                    let key = request.cache_key();
                    let entry = entry_from_response(&self.static_generation, &key, request.url.as_str(), &response);
                    match self.store.put_entry(&entry).await {
                        Ok(()) => report.cached += 1,
                        Err(e) => {
                            tracing::warn!(path = %path, error = %e, "failed to store pre-cached asset");
                            report.failures.push(InstallFailure { path: path.clone(), reason: e.to_string() });
                        }
                    }
                }
                FetchOutcome::Response(response) => {
                    let reason = format!("status {}", response.status.as_u16());
                    tracing::warn!(path = %path, %reason, "manifest asset not cacheable");
                    report.failures.push(InstallFailure { path: path.clone(), reason });
                }
                FetchOutcome::Failed { reason } => {
                    tracing::warn!(path = %path, %reason, "failed to fetch manifest asset");
                    report.failures.push(InstallFailure { path: path.clone(), reason });
                }
            }
        }

        tracing::info!(
            requested = report.requested,
            cached = report.cached,
            failed = report.failures.len(),
            "pre-cache complete"
        );
        report
    }

    /// Delete every generation that is not the current static or dynamic
    /// one.
    pub async fn activate(&self) -> Result<SweepReport, Error> {
        let removed = self.store.sweep_generations(&self.search_order).await?;
        tracing::info!(removed = removed.len(), "activation sweep complete");
        Ok(SweepReport { removed })
    }

    /// Run one request through its retrieval policy.
    pub async fn handle(&self, request: &WorkerRequest) -> WorkerResponse {
        if request.method != Method::GET {
            return self.passthrough(request).await;
        }

        let class = classify(request, &self.rules);
        let policy = Policy::select(class);
        tracing::debug!(url = %request.url, ?class, ?policy, "dispatching request");

        match policy {
            Policy::CacheFirst => self.cache_first(request).await,
            Policy::NetworkFirst => self.network_first(request, false).await,
            Policy::NetworkFirstOfflineFallback => self.network_first(request, true).await,
        }
    }

    /// Non-GET requests go straight to the network, uncached.
    async fn passthrough(&self, request: &WorkerRequest) -> WorkerResponse {
        match self.backend.execute(request).await {
            FetchOutcome::Response(response) => WorkerResponse::from_network(response),
            FetchOutcome::Failed { reason } => {
                tracing::debug!(url = %request.url, %reason, "pass-through fetch failed");
                WorkerResponse::service_unavailable("Network error")
            }
        }
    }

    async fn cache_first(&self, request: &WorkerRequest) -> WorkerResponse {
        let key = request.cache_key();

        if let Some(entry) = self.cached(&key).await {
            tracing::debug!(url = %request.url, "cache hit");
            return WorkerResponse::from_entry(entry, ServedFrom::Cache);
        }

        match self.backend.execute(request).await {
            FetchOutcome::Response(response) => {
                if response.status == StatusCode::OK {
                    self.store_snapshot(&self.static_generation, &key, request, &response).await;
                }
                WorkerResponse::from_network(response)
            }
            FetchOutcome::Failed { reason } => {
                tracing::debug!(url = %request.url, %reason, "fetch failed with no cached copy");
                WorkerResponse::service_unavailable("Resource not available offline")
            }
        }
    }

    async fn network_first(&self, request: &WorkerRequest, offline_fallback: bool) -> WorkerResponse {
        let key = request.cache_key();

        match self.backend.execute(request).await {
            FetchOutcome::Response(response) => {
                // Non-200 statuses are returned as-is and never stored.
                if response.status == StatusCode::OK {
                    self.store_snapshot(&self.dynamic_generation, &key, request, &response).await;
                }
                WorkerResponse::from_network(response)
            }
            FetchOutcome::Failed { reason } => {
                tracing::debug!(url = %request.url, %reason, "network failed, falling back to cache");
                if let Some(entry) = self.cached(&key).await {
                    return WorkerResponse::from_entry(entry, ServedFrom::Cache);
                }
                if offline_fallback
                    && request.is_navigation()
                    && let Some(entry) = self.offline_document().await
                {
                    return WorkerResponse::from_entry(entry, ServedFrom::OfflineFallback);
                }
                WorkerResponse::service_unavailable("Network error")
            }
        }
    }

    /// Ordered lookup across the active generations; store errors count as
    /// a miss.
    async fn cached(&self, key: &str) -> Option<CacheEntry> {
        match self.store.lookup(&self.search_order, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn offline_document(&self) -> Option<CacheEntry> {
        match self.store.get_entry(&self.static_generation, &self.offline_key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "offline document lookup failed");
                None
            }
        }
    }

    /// Best-effort cache write; failures are logged and swallowed so the
    /// live response still reaches the caller.
    async fn store_snapshot(&self, generation: &str, key: &str, request: &WorkerRequest, response: &FetchResponse) {
        let entry = entry_from_response(generation, key, request.url.as_str(), response);
        if let Err(e) = self.store.put_entry(&entry).await {
            tracing::warn!(url = %request.url, error = %e, "failed to store cache entry");
        }
    }
}
