//! sw_fetch tool implementation.
//!
//! Delivers one fetch event to the worker and reports the response it chose.

use ocache_core::request::{RequestClass, classify, resolve};
use ocache_core::{Error, Interception, Request, RequestMode, ResponseSnapshot, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Request URL. Relative URLs resolve against the configured scope.
    pub url: String,

    /// HTTP method (default: GET). Anything else is passed through.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Whether the worker intercepted the request.
    pub intercepted: bool,
    /// "navigation" or "sub_resource" when intercepted.
    pub class: Option<String>,
    /// Where the response came from: network, cache, app_shell, root_path,
    /// offline_page, terminal, or passthrough.
    pub source: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

fn snake_case<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn build_output(
    url: String, class: Option<RequestClass>, source: String, response: ResponseSnapshot,
) -> SwFetchOutput {
    SwFetchOutput {
        url,
        intercepted: class.is_some(),
        class: class.as_ref().map(snake_case),
        source,
        status: response.status,
        status_text: response.status_text.clone(),
        body: response.text(),
        headers: response.headers,
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, scope: &url::Url, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve(scope, &params.url).map_err(Error::from)?;
    let mode = params.mode.as_deref().map(str::parse::<RequestMode>).transpose()?.unwrap_or_default();

    let mut request = Request::get(url).with_method(params.method.to_ascii_uppercase()).with_mode(mode);
    if let Some(accept) = params.accept {
        request = request.with_header("accept", accept);
    }

    let class = classify(&request).class();
    let output = match worker.handle_fetch(&request).await {
        Interception::Respond(served) => {
            build_output(request.url.to_string(), class, snake_case(&served.source), served.response)
        }
        Interception::Passthrough => {
            tracing::debug!(url = %request.url, method = %request.method, "passing request through");
            let response = worker.context().transport().fetch(&request).await?;
            build_output(request.url.to_string(), None, "passthrough".into(), response)
        }
    };

    Ok(json_result(&output)?)
}
