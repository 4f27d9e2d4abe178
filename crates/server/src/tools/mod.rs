//! MCP tool implementations.
//!
//! The tools are the interception hook: `sw_install` and `sw_activate`
//! deliver lifecycle events, `sw_fetch` delivers one fetch event, and the
//! remaining tools inspect worker and store state.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

pub use cache::{CacheKeysParams, keys_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, status_impl};

use ocache_core::Error;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, Error> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
