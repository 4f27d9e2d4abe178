//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    CacheKeysParams, SwFetchParams, activate_impl, fetch_impl, install_impl, keys_impl, status_impl,
};

use ocache_core::{SessionRegistry, Worker};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// Session id of the MCP peer on stdio.
pub const STDIO_SESSION: &str = "stdio";

/// The main MCP server handler for ocache.
#[derive(Clone)]
pub struct OcacheServer {
    worker: Arc<Worker>,
    sessions: Arc<SessionRegistry>,
    scope: Arc<url::Url>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OcacheServer {
    /// Create a new server handler around an installed worker.
    pub fn new(worker: Arc<Worker>, sessions: Arc<SessionRegistry>, scope: url::Url) -> Self {
        Self { worker, sessions, scope: Arc::new(scope), tool_router: Self::tool_router() }
    }

    /// Deliver a fetch event to the worker.
    ///
    /// GET requests are answered network-first (navigations) or cache-first
    /// (sub-resources) with offline fallbacks; other methods pass through.
    #[tool(
        description = "Deliver a fetch event. Navigations are network-first, sub-resources cache-first, with offline fallbacks. Returns the chosen response and its source."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.scope, params.0).await
    }

    /// Re-run the install event: pre-populate the manifest into the active generation.
    #[tool(description = "Install: pre-populate every manifest resource into the active cache generation.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Re-run the activate event: delete stale generations and claim sessions.
    #[tool(description = "Activate: delete every cache generation except the active one and claim open sessions.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report lifecycle state, active generation, manifest and stored generations.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, &self.sessions, STDIO_SESSION).await
    }

    #[tool(description = "List cache generations and the stored entries of one generation (default: active).")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for OcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "ocache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
