//! Connected sessions and generation ownership.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;

/// Host registry of connected consumers.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Make the installed version eligible for activation without waiting
    /// for existing consumers to release the previous one.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Point every connected consumer at `generation`. Returns how many
    /// consumers were claimed.
    async fn claim_all(&self, generation: &str) -> Result<usize, Error>;
}

/// In-process session registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Option<String>>>>,
    skip_waiting: Arc<AtomicBool>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. It is uncontrolled until the next claim.
    pub async fn connect(&self, session: impl Into<String>) {
        self.sessions.write().await.entry(session.into()).or_insert(None);
    }

    pub async fn disconnect(&self, session: &str) {
        self.sessions.write().await.remove(session);
    }

    /// Generation currently controlling the session.
    pub async fn controller(&self, session: &str) -> Option<String> {
        self.sessions.read().await.get(session).cloned().flatten()
    }

    pub fn waiting_skipped(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientRegistry for SessionRegistry {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_all(&self, generation: &str) -> Result<usize, Error> {
        let mut sessions = self.sessions.write().await;
        for controller in sessions.values_mut() {
            *controller = Some(generation.to_string());
        }
        Ok(sessions.len())
    }
}
