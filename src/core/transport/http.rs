//! HTTP transport implementation.
//!
//! JSON-RPC over POST, so plain HTTP clients (curl, browsers) can build
//! playlists without an MCP client library.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::domains::tools::ToolError;

/// Protocol version answered when the client does not name one.
const PROTOCOL_VERSION: &str = "2024-11-05";

const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

/// Unknown tools and bad arguments are the caller's fault; anything else
/// failed inside the server.
impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        let code = match err {
            ToolError::NotFound(_) | ToolError::InvalidArguments(_) => INVALID_PARAMS,
            ToolError::ExecutionFailed(_) => INTERNAL_ERROR,
        };
        Self::new(code, err.to_string())
    }
}

impl JsonRpcResponse {
    fn reply(id: Option<Value>, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
            error,
        }
    }
}

/// Handshake progress of the HTTP client. Listening sessions are a
/// separate concept owned by the session tools.
#[derive(Debug, Clone)]
struct Handshake {
    protocol_version: String,
    initialized: bool,
}

/// State shared by the axum handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    rpc_path: Arc<str>,
    handshake: Arc<RwLock<Option<Handshake>>>,
}

impl AppState {
    fn new(server: McpServer, rpc_path: &str) -> Self {
        Self {
            server,
            rpc_path: Arc::from(rpc_path),
            handshake: Arc::new(RwLock::new(None)),
        }
    }
}

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// The `host:port` the listener binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Serve until the listener fails.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let state = AppState::new(server, &self.config.rpc_path);

        let mut app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route("/health", get(health))
            .route("/", get(index))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        if self.config.enable_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;
        info!(
            rpc = %self.config.rpc_path,
            cors = self.config.enable_cors,
            "Mood playlist server listening on http://{}",
            addr
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))
    }
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "protocol": "JSON-RPC 2.0",
        "endpoints": { "rpc": &*state.rpc_path, "health": "/health" },
        "tools": state.server.list_tools().iter().map(|t| t["name"].clone()).collect::<Vec<_>>(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let playlist = state.server.playlist();
    Json(json!({
        "status": "healthy",
        "classifier": playlist.classifier_name(),
        "catalog": playlist.catalog_name(),
        "open_sessions": playlist.sessions().len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[instrument(skip_all, fields(method = %request.method))]
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    Json(process_request(&state, request).await)
}

async fn process_request(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest {
        jsonrpc,
        id,
        method,
        params,
    } = request;
    if jsonrpc != "2.0" {
        return JsonRpcResponse::reply(id, Err(JsonRpcError::new(INVALID_REQUEST, "Invalid Request")));
    }
    let outcome = dispatch(state, &method, params.unwrap_or(Value::Null)).await;
    if let Err(e) = &outcome {
        warn!(code = e.code, "{} failed: {}", method, e.message);
    }
    JsonRpcResponse::reply(id, outcome)
}

/// Required string member of the request params.
fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, JsonRpcError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Missing '{key}'")))
}

async fn dispatch(state: &AppState, method: &str, params: Value) -> Result<Value, JsonRpcError> {
    let server = &state.server;
    match method {
        "initialize" => Ok(initialize(state, &params).await),
        "notifications/initialized" => {
            if let Some(handshake) = state.handshake.write().await.as_mut() {
                handshake.initialized = true;
                info!("Client ready (protocol {})", handshake.protocol_version);
            }
            Ok(Value::Null)
        }
        m if m.starts_with("notifications/") => {
            debug!("Ignoring notification {}", m);
            Ok(Value::Null)
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": server.list_tools() })),
        "tools/call" => {
            let name = required_str(&params, "name")?;
            let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
            Ok(server.call_tool(name, arguments).await?)
        }
        "resources/list" => Ok(json!({ "resources": server.list_resources().await })),
        "resources/templates/list" => Ok(json!({
            "resourceTemplates": server.list_resource_templates().await
        })),
        "resources/read" => server
            .read_resource(required_str(&params, "uri")?)
            .await
            .map_err(JsonRpcError::invalid_params),
        "prompts/list" => Ok(json!({ "prompts": server.list_prompts().await })),
        "prompts/get" => server
            .get_prompt(required_str(&params, "name")?, params.get("arguments").cloned())
            .await
            .map_err(JsonRpcError::invalid_params),
        other => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

/// Record the client's protocol version and describe the server.
async fn initialize(state: &AppState, params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION)
        .to_string();
    *state.handshake.write().await = Some(Handshake {
        protocol_version: protocol_version.clone(),
        initialized: false,
    });

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": {}, "resources": {}, "prompts": {} },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version(),
        },
        "instructions": McpServer::instructions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::tools::definitions::common::test_service;

    fn state() -> AppState {
        AppState::new(McpServer::new(Config::default(), test_service()), "/mcp")
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn test_initialize_then_notification() {
        let state = state();
        let response = process_request(&state, request("initialize", json!({}))).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "mood-playlist-mcp");

        process_request(&state, request("notifications/initialized", json!({}))).await;
        assert!(state.handshake.read().await.as_ref().unwrap().initialized);
    }

    #[tokio::test]
    async fn test_initialize_echoes_client_version() {
        let response = process_request(
            &state(),
            request("initialize", json!({ "protocolVersion": "2025-03-26" })),
        )
        .await;
        assert_eq!(response.result.unwrap()["protocolVersion"], "2025-03-26");
    }

    #[tokio::test]
    async fn test_tools_call_generates_playlist() {
        let response = process_request(
            &state(),
            request(
                "tools/call",
                json!({
                    "name": "generate_mood_playlist",
                    "arguments": { "query": "happy vibes 😊 for 20 minutes" }
                }),
            ),
        )
        .await;
        assert!(response.error.is_none());
        assert_eq!(response.result.unwrap()["isError"], false);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let response =
            process_request(&state(), request("tools/call", json!({ "name": "nope" }))).await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_missing_uri_is_invalid_params() {
        let response = process_request(&state(), request("resources/read", json!({}))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert!(error.message.contains("uri"));
    }

    #[tokio::test]
    async fn test_read_mood_resource() {
        let response = process_request(
            &state(),
            request("resources/read", json!({ "uri": "mood://moods/happy" })),
        )
        .await;
        assert!(response.error.is_none());
        assert!(response.result.unwrap()["contents"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = process_request(&state(), request("sampling/create", json!({}))).await;
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let mut req = request("tools/list", json!({}));
        req.jsonrpc = "1.0".to_string();
        let response = process_request(&state(), req).await;
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_tool_error_codes() {
        let missing: JsonRpcError = ToolError::not_found("x").into();
        assert_eq!(missing.code, INVALID_PARAMS);
        let failed: JsonRpcError = ToolError::execution_failed("boom").into();
        assert_eq!(failed.code, INTERNAL_ERROR);
    }
}
