//! sw_install, sw_activate and sw_status tool implementations.

use ocache_core::{LifecycleState, SessionRegistry, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output structure for sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    /// Active generation tag.
    pub generation: String,
    /// Lifecycle phase: parsed, installing, installed, activating, activated.
    pub state: String,
    /// Manifest URLs in install order.
    pub manifest: Vec<String>,
    /// Background cache writes still in flight.
    pub background_pending: usize,
    /// Generation tags present in the store.
    pub generations: Vec<String>,
    /// Generation controlling this session, if claimed.
    pub controller: Option<String>,
    /// Whether the waiting phase was skipped.
    pub waiting_skipped: bool,
}

fn state_name(state: LifecycleState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    Ok(json_result(&report)?)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    Ok(json_result(&report)?)
}

/// Implementation of the sw_status tool.
pub async fn status_impl(worker: &Worker, sessions: &SessionRegistry, session: &str) -> Result<CallToolResult, McpError> {
    let generations = worker.context().storage().keys().await?;

    let output = SwStatusOutput {
        generation: worker.generation().to_string(),
        state: state_name(worker.state().await),
        manifest: worker.manifest().entries().iter().map(ToString::to_string).collect(),
        background_pending: worker.context().background().pending(),
        generations,
        controller: sessions.controller(session).await,
        waiting_skipped: sessions.waiting_skipped(),
    };

    Ok(json_result(&output)?)
}
