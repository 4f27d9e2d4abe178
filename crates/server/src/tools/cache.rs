//! cache_keys tool implementation.
//!
//! Lists generations in the store and the entries of one of them.

use ocache_core::{EntrySummary, Error, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation to list entries for (default: the active generation).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output structure for cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Every generation tag, in creation order.
    pub generations: Vec<String>,
    /// The generation whose entries are listed.
    pub generation: String,
    pub entries: Vec<EntrySummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &Worker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let generation = params.generation.unwrap_or_else(|| worker.generation().to_string());
    if generation.trim().is_empty() {
        return Err(Error::InvalidInput("generation cannot be empty".into()).into());
    }

    let storage = worker.context().storage();
    let generations = storage.keys().await?;
    let entries = if generations.contains(&generation) { storage.entries(&generation).await? } else { Vec::new() };

    Ok(json_result(&CacheKeysOutput { generations, generation, entries })?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ocache_core::ResponseSnapshot;

    use super::super::test_support::{RoutedTransport, output, worker};
    use super::*;

    #[tokio::test]
    async fn test_keys_empty_store() {
        let (worker, _) = worker(Arc::new(RoutedTransport::default()));
        let out = output(&keys_impl(&worker, CacheKeysParams::default()).await.unwrap());

        assert_eq!(out["generation"], "v1");
        assert!(out["generations"].as_array().unwrap().is_empty());
        assert!(out["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_lists_installed_entries() {
        let transport = Arc::new(RoutedTransport::default());
        for path in ["", "index.html", "offline.html"] {
            transport.route(&format!("https://app.test/{path}"), ResponseSnapshot::new(200, "abcd"));
        }
        let (worker, _) = worker(transport);
        worker.install().await.unwrap();

        let out = output(&keys_impl(&worker, CacheKeysParams::default()).await.unwrap());
        let entries = out["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["url"], "https://app.test/");
        assert_eq!(entries[0]["size"], 4);
    }

    #[tokio::test]
    async fn test_keys_unknown_generation() {
        let (worker, _) = worker(Arc::new(RoutedTransport::default()));
        let params = CacheKeysParams { generation: Some("v0".into()) };
        let out = output(&keys_impl(&worker, params).await.unwrap());

        assert_eq!(out["generation"], "v0");
        assert!(out["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_blank_generation() {
        let (worker, _) = worker(Arc::new(RoutedTransport::default()));
        let params = CacheKeysParams { generation: Some(" ".into()) };
        assert!(keys_impl(&worker, params).await.is_err());
    }
}
