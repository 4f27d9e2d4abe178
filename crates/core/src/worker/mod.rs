//! The caching worker.
//!
//! [`Worker`] ties the pieces together: the lifecycle controller populates
//! and prunes generations, and every intercepted request is classified and
//! dispatched to one of two retrieval strategies:
//!
//! - navigations: network first, then the exact cached page, the app
//!   shell, the offline page, and finally a synthesized 503
//! - sub-resources: cache first with background revalidation, falling back
//!   to the root entry, the offline page, and the 503
//!
//! The store handle, transport and background sink travel together in a
//! [`CacheContext`] that is passed explicitly to every strategy.

pub mod background;
pub mod clients;
pub mod fallback;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::CacheStorage;
use crate::config::{AppConfig, ConfigError, FallbackTargets};
use crate::manifest::AssetManifest;
use crate::request::{Classification, Request, RequestClass, ResourceId, classify};
use crate::response::ResponseSnapshot;
use crate::transport::Transport;
use crate::Error;

pub use background::BackgroundTasks;
pub use clients::{ClientRegistry, SessionRegistry};
pub use lifecycle::{ActivateReport, InstallReport};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    /// The request's own cache entry.
    Cache,
    AppShell,
    RootPath,
    OfflinePage,
    /// Synthesized 503.
    Terminal,
}

/// A response chosen by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub source: ResponseSource,
    pub response: ResponseSnapshot,
}

impl Served {
    pub fn new(source: ResponseSource, response: ResponseSnapshot) -> Self {
        Self { source, response }
    }
}

/// Result of handling a fetch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not intercepted: the host performs the request untouched.
    Passthrough,
    Respond(Served),
}

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Shared handles every strategy needs.
#[derive(Clone)]
pub struct CacheContext {
    storage: Arc<dyn CacheStorage>,
    transport: Arc<dyn Transport>,
    generation: Arc<str>,
    fallbacks: Arc<FallbackTargets>,
    background: BackgroundTasks,
}

impl CacheContext {
    pub fn new(
        storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>, generation: impl Into<Arc<str>>,
        fallbacks: FallbackTargets,
    ) -> Self {
        Self {
            storage,
            transport,
            generation: generation.into(),
            fallbacks: Arc::new(fallbacks),
            background: BackgroundTasks::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Tag of the active generation.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn fallbacks(&self) -> &FallbackTargets {
        &self.fallbacks
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    /// Read from the active generation. Store errors count as a miss.
    pub async fn lookup(&self, id: &ResourceId) -> Option<ResponseSnapshot> {
        match self.storage.lookup(&self.generation, id).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(generation = %self.generation, url = %id, error = %err, "cache lookup failed");
                None
            }
        }
    }

    /// Write a copy into the active generation without waiting for it.
    pub fn store_detached(&self, id: ResourceId, response: ResponseSnapshot) {
        let storage = self.storage.clone();
        let generation = self.generation.clone();
        self.background.spawn("cache_write", async move {
            storage.put(&generation, &id, &response).await
        });
    }
}

/// A cache manager instance bound to one generation.
pub struct Worker {
    ctx: CacheContext,
    manifest: AssetManifest,
    clients: Arc<dyn ClientRegistry>,
    state: RwLock<LifecycleState>,
}

impl Worker {
    pub fn new(ctx: CacheContext, manifest: AssetManifest, clients: Arc<dyn ClientRegistry>) -> Self {
        Self { ctx, manifest, clients, state: RwLock::new(LifecycleState::Parsed) }
    }

    /// Build a worker from validated configuration.
    pub fn from_config(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, transport: Arc<dyn Transport>,
        clients: Arc<dyn ClientRegistry>,
    ) -> Result<Self, ConfigError> {
        let ctx = CacheContext::new(storage, transport, config.generation.as_str(), config.fallbacks()?);
        Ok(Self::new(ctx, config.manifest()?, clients))
    }

    pub fn context(&self) -> &CacheContext {
        &self.ctx
    }

    pub fn generation(&self) -> &str {
        self.ctx.generation()
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Populate the active generation from the manifest.
    ///
    /// Fails only when the store cannot be opened.
    ///
    /// Re-installing an activated worker refreshes its entries without
    /// leaving the activated state.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let previous = {
            let mut state = self.state.write().await;
            let previous = *state;
            if previous != LifecycleState::Activated {
                *state = LifecycleState::Installing;
            }
            previous
        };
        let result = lifecycle::install(&self.ctx, &self.manifest, self.clients.as_ref()).await;
        *self.state.write().await = match (&result, previous) {
            (Ok(_), LifecycleState::Activated) => LifecycleState::Activated,
            (Ok(_), _) => LifecycleState::Installed,
            (Err(_), _) => previous,
        };
        result
    }

    /// Prune every other generation and claim connected sessions.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, LifecycleState::Activating)
        };
        let result = lifecycle::activate(&self.ctx, self.clients.as_ref()).await;
        *self.state.write().await = match result {
            Ok(_) => LifecycleState::Activated,
            Err(_) => previous,
        };
        result
    }

    /// Handle one intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> Interception {
        let Classification::Intercept(class) = classify(request) else {
            return Interception::Passthrough;
        };
        let Some(id) = ResourceId::for_request(request) else {
            return Interception::Passthrough;
        };

        let served = match class {
            RequestClass::Navigation => strategy::network_first(&self.ctx, request, &id).await,
            RequestClass::SubResource => strategy::cache_first(&self.ctx, request, &id).await,
        };

        tracing::debug!(
            url = %id,
            class = ?class,
            source = ?served.source,
            status = served.response.status,
            "served intercepted request"
        );

        Interception::Respond(served)
    }

    /// Wait for detached cache writes and revalidations to finish.
    pub async fn wait_background(&self) {
        self.ctx.background().wait_idle().await;
    }
}
