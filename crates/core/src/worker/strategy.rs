//! Retrieval strategies.

use super::fallback;
use super::{CacheContext, ResponseSource, Served};
use crate::request::{Request, ResourceId};

/// Network first, for navigations.
///
/// Any network response is returned live and a copy is written to the
/// active generation in the background. On a network failure the chain is:
/// the exact cached page, the app shell, the offline page, the 503.
pub async fn network_first(ctx: &CacheContext, request: &Request, id: &ResourceId) -> Served {
    match ctx.transport().fetch(request).await {
        Ok(response) => {
            ctx.store_detached(id.clone(), response.clone());
            Served::new(ResponseSource::Network, response)
        }
        Err(err) => {
            tracing::debug!(url = %id, error = %err, "navigation fetch failed, falling back to cache");
            let fallbacks = ctx.fallbacks();
            fallback::resolve(
                ctx,
                &[
                    (ResponseSource::Cache, id),
                    (ResponseSource::AppShell, &fallbacks.app_shell),
                    (ResponseSource::OfflinePage, &fallbacks.offline_page),
                ],
            )
            .await
        }
    }
}

/// Cache first with background revalidation, for sub-resources.
///
/// A hit is returned immediately while a detached fetch refreshes the entry
/// when it gets a 2xx. A miss goes to the network; 2xx responses are cached
/// in the background. If the network fails: the root entry, the offline
/// page, the 503.
pub async fn cache_first(ctx: &CacheContext, request: &Request, id: &ResourceId) -> Served {
    if let Some(cached) = ctx.lookup(id).await {
        revalidate_detached(ctx, request.clone(), id.clone());
        return Served::new(ResponseSource::Cache, cached);
    }

    match ctx.transport().fetch(request).await {
        Ok(response) => {
            if response.is_ok() {
                ctx.store_detached(id.clone(), response.clone());
            }
            Served::new(ResponseSource::Network, response)
        }
        Err(err) => {
            tracing::debug!(url = %id, error = %err, "sub-resource fetch failed, falling back to cache");
            let fallbacks = ctx.fallbacks();
            fallback::resolve(
                ctx,
                &[
                    (ResponseSource::RootPath, &fallbacks.root_path),
                    (ResponseSource::OfflinePage, &fallbacks.offline_page),
                ],
            )
            .await
        }
    }
}

fn revalidate_detached(ctx: &CacheContext, request: Request, id: ResourceId) {
    let transport = ctx.transport().clone();
    let storage = ctx.storage().clone();
    let generation = ctx.generation().to_string();

    ctx.background().spawn("revalidate", async move {
        let fresh = match transport.fetch(&request).await {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::debug!(url = %id, error = %err, "background revalidation skipped");
                return Ok(());
            }
        };
        if !fresh.is_ok() {
            tracing::debug!(url = %id, status = fresh.status, "background revalidation got non-success status");
            return Ok(());
        }
        storage.put(&generation, &id, &fresh).await
    });
}
