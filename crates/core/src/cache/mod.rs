//! Cache Generation Store.
//!
//! A generation is one versioned set of `ResourceId -> ResponseSnapshot`
//! entries, addressed by its tag. The worker only ever reads and writes its
//! active generation; older generations linger until activation prunes them.
//!
//! Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: persistent SQLite store (WAL mode, versioned migrations)
//! - [`MemoryStorage`]: in-process store for tests and ephemeral hosts

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod store;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::request::ResourceId;
use crate::response::ResponseSnapshot;

pub use connection::CacheDb;
pub use memory::MemoryStorage;

/// Inspection row for a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub url: String,
    pub status: u16,
    pub size: u64,
    pub stored_at: String,
}

/// Versioned key-value store of response snapshots.
///
/// Implementations must tolerate concurrent calls without external locking:
/// every entry write is atomic and concurrent writes to one key resolve as
/// last-writer-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// All generation tags, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and every entry in it. Returns whether it existed.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Insert or overwrite a single entry.
    async fn put(&self, generation: &str, id: &ResourceId, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Insert every entry, or none of them.
    async fn put_all(&self, generation: &str, entries: &[(ResourceId, ResponseSnapshot)]) -> Result<(), Error>;

    /// Stored copy for the identity, if present.
    async fn lookup(&self, generation: &str, id: &ResourceId) -> Result<Option<ResponseSnapshot>, Error>;

    /// Summaries of every entry in the generation, ordered by URL.
    async fn entries(&self, generation: &str) -> Result<Vec<EntrySummary>, Error>;
}
