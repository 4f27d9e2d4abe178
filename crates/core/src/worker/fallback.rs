//! Last-resort responses.
//!
//! When the network cannot answer, strategies walk an ordered list of cached
//! tiers. If every tier misses, the terminal 503 is synthesized here.

use super::{CacheContext, ResponseSource, Served};
use crate::request::ResourceId;
use crate::response::ResponseSnapshot;

/// Status of the terminal response.
pub const TERMINAL_STATUS: u16 = 503;

const TERMINAL_TEXT: &str = "Offline";

/// The synthesized service-unavailable response.
pub fn terminal_response() -> ResponseSnapshot {
    ResponseSnapshot::new(TERMINAL_STATUS, TERMINAL_TEXT)
        .with_status_text(TERMINAL_TEXT)
        .with_header("content-type", "text/plain; charset=utf-8")
}

/// Serve the first tier present in the active generation, else the
/// terminal response.
pub async fn resolve(ctx: &CacheContext, tiers: &[(ResponseSource, &ResourceId)]) -> Served {
    for (source, id) in tiers {
        if let Some(response) = ctx.lookup(id).await {
            tracing::debug!(url = %id, source = ?source, "served fallback tier");
            return Served::new(*source, response);
        }
    }

    tracing::info!(generation = %ctx.generation(), "every fallback tier missed, serving terminal response");
    Served::new(ResponseSource::Terminal, terminal_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::{StubTransport, TestStorage, context, html, id};
    use super::*;
    use crate::cache::CacheStorage;

    #[test]
    fn test_terminal_response_shape() {
        let response = terminal_response();
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Offline");
        assert_eq!(response.text(), "Offline");
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_first_present_tier_wins() {
        let storage = Arc::new(TestStorage::default());
        let ctx = context(storage.clone(), Arc::new(StubTransport::default()), "v1");
        storage.put("v1", &id("./offline.html"), &html("offline")).await.unwrap();
        storage.put("v1", &id("./"), &html("root")).await.unwrap();

        let root = id("./");
        let offline = id("./offline.html");
        let missing = id("./missing.html");
        let served = resolve(
            &ctx,
            &[(ResponseSource::Cache, &missing), (ResponseSource::RootPath, &root), (ResponseSource::OfflinePage, &offline)],
        )
        .await;

        assert_eq!(served.source, ResponseSource::RootPath);
        assert_eq!(served.response.text(), "root");
    }

    #[tokio::test]
    async fn test_all_tiers_missing_is_terminal() {
        let ctx = context(Arc::new(TestStorage::default()), Arc::new(StubTransport::default()), "v1");
        let offline = id("./offline.html");

        let served = resolve(&ctx, &[(ResponseSource::OfflinePage, &offline)]).await;
        assert_eq!(served.source, ResponseSource::Terminal);
        assert_eq!(served.response, terminal_response());
    }

    #[tokio::test]
    async fn test_other_generation_is_ignored() {
        let storage = Arc::new(TestStorage::default());
        let ctx = context(storage.clone(), Arc::new(StubTransport::default()), "v2");
        storage.put("v1", &id("./offline.html"), &html("old offline")).await.unwrap();

        let offline = id("./offline.html");
        let served = resolve(&ctx, &[(ResponseSource::OfflinePage, &offline)]).await;
        assert_eq!(served.source, ResponseSource::Terminal);
    }
}
