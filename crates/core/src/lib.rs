//! Core of ocache, a client-side resource cache manager.
//!
//! This crate provides:
//! - The generation store with SQLite and in-memory backends
//! - Request classification and cache identities
//! - The caching worker: lifecycle, retrieval strategies, fallbacks
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;
pub mod request;
pub mod response;
pub mod transport;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, EntrySummary, MemoryStorage};
pub use config::{AppConfig, ConfigError, FallbackTargets};
pub use error::Error;
pub use manifest::AssetManifest;
pub use request::{Request, RequestMode, ResourceId};
pub use response::ResponseSnapshot;
pub use transport::Transport;
pub use worker::{CacheContext, Interception, LifecycleState, ResponseSource, Served, SessionRegistry, Worker};
