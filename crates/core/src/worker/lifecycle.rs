//! Install and activate.
//!
//! Install asks to take over at once, opens the active generation and fills it from the manifest as one
//! atomic batch. When the batch fails it retries entry by entry, so a single
//! unreachable asset never aborts installation. Activate deletes every other
//! generation and claims connected sessions.
//!
//! Only a store that cannot be opened fails either phase.

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;

use super::CacheContext;
use super::clients::ClientRegistry;
use crate::Error;
use crate::manifest::AssetManifest;
use crate::request::ResourceId;
use crate::response::ResponseSnapshot;

/// Outcome of an install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Whether the atomic batch succeeded.
    pub batched: bool,
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Outcome of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub generation: String,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    /// Sessions claimed, or `None` if claiming failed.
    pub claimed: Option<usize>,
}

fn open_error(err: Error) -> Error {
    match err {
        Error::CacheOpen(_) => err,
        other => Error::CacheOpen(other.to_string()),
    }
}

/// Fetch a manifest entry. Only 2xx responses are accepted.
async fn fetch_asset(ctx: &CacheContext, id: &ResourceId) -> Result<ResponseSnapshot, String> {
    match ctx.transport().fetch(&id.to_request()).await {
        Ok(response) if response.is_ok() => Ok(response),
        Ok(response) => Err(format!("{id}: unexpected status {}", response.status)),
        Err(err) => Err(format!("{id}: {err}")),
    }
}

async fn populate_batch(ctx: &CacheContext, manifest: &AssetManifest) -> Result<(), Error> {
    let fetched = try_join_all(
        manifest
            .entries()
            .iter()
            .map(|id| async move { fetch_asset(ctx, id).await.map(|response| (id.clone(), response)) }),
    )
    .await
    .map_err(Error::BatchPopulation)?;

    ctx.storage()
        .put_all(ctx.generation(), &fetched)
        .await
        .map_err(|e| Error::BatchPopulation(e.to_string()))
}

async fn populate_each(ctx: &CacheContext, manifest: &AssetManifest) -> (Vec<String>, Vec<String>) {
    let mut cached = Vec::new();
    let mut failed = Vec::new();

    for id in manifest.entries() {
        let result = match fetch_asset(ctx, id).await {
            Ok(response) => ctx
                .storage()
                .put(ctx.generation(), id, &response)
                .await
                .map_err(|e| format!("{id}: {e}")),
            Err(reason) => Err(reason),
        };

        match result {
            Ok(()) => cached.push(id.to_string()),
            Err(reason) => {
                tracing::warn!(generation = %ctx.generation(), reason = %reason, "failed to cache asset");
                failed.push(id.to_string());
            }
        }
    }

    (cached, failed)
}

/// Populate the active generation from the manifest.
pub async fn install(
    ctx: &CacheContext, manifest: &AssetManifest, clients: &dyn ClientRegistry,
) -> Result<InstallReport, Error> {
    let generation = ctx.generation();
    if let Err(err) = clients.skip_waiting().await {
        tracing::warn!(generation = %generation, error = %err, "skip_waiting failed");
    }

    ctx.storage().open(generation).await.map_err(open_error)?;

    let report = match populate_batch(ctx, manifest).await {
        Ok(()) => InstallReport {
            generation: generation.to_string(),
            batched: true,
            cached: manifest.entries().iter().map(ToString::to_string).collect(),
            failed: Vec::new(),
        },
        Err(err) => {
            tracing::warn!(
                generation = %generation,
                error = %err,
                "batch population failed, falling back to individual caching"
            );
            let (cached, failed) = populate_each(ctx, manifest).await;
            InstallReport { generation: generation.to_string(), batched: false, cached, failed }
        }
    };

    tracing::info!(
        generation = %generation,
        cached = report.cached.len(),
        failed = report.failed.len(),
        batched = report.batched,
        "install complete"
    );

    Ok(report)
}

/// Delete every generation except the active one, then claim sessions.
pub async fn activate(ctx: &CacheContext, clients: &dyn ClientRegistry) -> Result<ActivateReport, Error> {
    let current = ctx.generation();
    ctx.storage().open(current).await.map_err(open_error)?;
    let keys = ctx.storage().keys().await.map_err(open_error)?;

    let deletions = join_all(
        keys.iter()
            .filter(|tag| tag.as_str() != current)
            .map(|tag| async move { (tag, ctx.storage().delete(tag).await) }),
    )
    .await;

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    for (tag, result) in deletions {
        match result {
            Ok(_) => deleted.push(tag.clone()),
            Err(err) => {
                tracing::warn!(generation = %tag, error = %err, "failed to delete stale generation");
                failed.push(tag.clone());
            }
        }
    }

    let claimed = match clients.claim_all(current).await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!(generation = %current, error = %err, "claiming sessions failed");
            None
        }
    };

    tracing::info!(generation = %current, deleted = deleted.len(), failed = failed.len(), "activate complete");

    Ok(ActivateReport { generation: current.to_string(), deleted, failed, claimed })
}
