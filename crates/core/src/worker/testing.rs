//! Test doubles for the worker: a scripted transport and an instrumented store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::CacheContext;
use crate::Error;
use crate::cache::{CacheStorage, EntrySummary, MemoryStorage};
use crate::config::FallbackTargets;
use crate::request::{Request, ResourceId};
use crate::response::ResponseSnapshot;
use crate::transport::Transport;

/// Transport answering from a fixed route table.
///
/// Unrouted URLs fail like an unreachable host.
#[derive(Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubTransport {
    pub(crate) fn route(&self, url: &str, response: ResponseSnapshot) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        self.calls.lock().unwrap().push(request.url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("connection refused: {}", request.url)))
    }
}

/// Memory store that counts operations and fails on demand.
#[derive(Default)]
pub(crate) struct TestStorage {
    inner: MemoryStorage,
    operations: AtomicUsize,
    fail_open: AtomicBool,
    fail_put: AtomicBool,
    fail_put_all: AtomicBool,
    fail_delete: Mutex<Option<String>>,
}

impl TestStorage {
    pub(crate) fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_put_all(&self, fail: bool) {
        self.fail_put_all.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_delete_of(&self, generation: &str) {
        *self.fail_delete.lock().unwrap() = Some(generation.to_string());
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for TestStorage {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        self.touch();
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::CacheOpen("store unavailable".into()));
        }
        self.inner.open(generation).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.touch();
        self.inner.keys().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        self.touch();
        if self.fail_delete.lock().unwrap().as_deref() == Some(generation) {
            return Err(Error::CacheWrite(format!("cannot delete {generation}")));
        }
        self.inner.delete(generation).await
    }

    async fn put(&self, generation: &str, id: &ResourceId, response: &ResponseSnapshot) -> Result<(), Error> {
        self.touch();
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::CacheWrite("quota exceeded".into()));
        }
        self.inner.put(generation, id, response).await
    }

    async fn put_all(&self, generation: &str, entries: &[(ResourceId, ResponseSnapshot)]) -> Result<(), Error> {
        self.touch();
        if self.fail_put_all.load(Ordering::SeqCst) {
            return Err(Error::CacheWrite("batch rejected".into()));
        }
        self.inner.put_all(generation, entries).await
    }

    async fn lookup(&self, generation: &str, id: &ResourceId) -> Result<Option<ResponseSnapshot>, Error> {
        self.touch();
        self.inner.lookup(generation, id).await
    }

    async fn entries(&self, generation: &str) -> Result<Vec<EntrySummary>, Error> {
        self.touch();
        self.inner.entries(generation).await
    }
}

pub(crate) const SCOPE: &str = "https://app.test/";

pub(crate) fn id(path: &str) -> ResourceId {
    ResourceId::resolve(&url::Url::parse(SCOPE).unwrap(), path).unwrap()
}

pub(crate) fn html(body: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(200, body.to_string())
        .with_status_text("OK")
        .with_header("content-type", "text/html")
}

/// Context over the test scope with the default fallback layout.
pub(crate) fn context(storage: Arc<TestStorage>, transport: Arc<StubTransport>, generation: &str) -> CacheContext {
    let fallbacks = FallbackTargets {
        app_shell: id("./index.html"),
        root_path: id("./"),
        offline_page: id("./offline.html"),
    };
    CacheContext::new(storage, transport, generation, fallbacks)
}
