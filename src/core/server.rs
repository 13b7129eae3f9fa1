//! MCP Server implementation and lifecycle management.
//!
//! The handler owns the domain services and delegates every MCP request to
//! them. Tools are routed through the dynamically built `ToolRouter`, so
//! adding a tool does not touch this file.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::{
    playlist::PlaylistService, prompts::PromptService, resources::ResourceService,
    tools::build_tool_router,
};

#[cfg(feature = "http")]
use crate::domains::tools::{ToolError, ToolRegistry};

const INSTRUCTIONS: &str = "Mood-based playlist generator. Describe a mood in words and/or \
emojis with generate_mood_playlist (durations like '1 hour' or '10 songs' and languages like \
'hindi' are understood). Use analyze_mood to preview mood detection and get_supported_options \
to list moods, languages and genres. Call session_start with a user id to blend that user's \
listening history into playlists.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    config: Arc<Config>,

    playlist: Arc<PlaylistService>,

    resource_service: Arc<ResourceService>,

    prompt_service: Arc<PromptService>,

    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a server around an already wired playlist service.
    pub fn new(config: Config, playlist: Arc<PlaylistService>) -> Self {
        let config = Arc::new(config);
        let resource_service = Arc::new(ResourceService::new(
            config.server.clone(),
            playlist.clone(),
        ));

        Self {
            tool_router: build_tool_router::<Self>(playlist.clone()),
            config,
            playlist,
            resource_service,
            prompt_service: Arc::new(PromptService::new()),
        }
    }

    /// Build the production playlist service from the configuration and
    /// wrap it in a server.
    pub async fn from_config(config: Config) -> Self {
        let playlist = Arc::new(PlaylistService::from_config(&config).await);
        info!(
            "Playlist service ready (classifier: {}, catalog: {})",
            playlist.classifier_name(),
            playlist.catalog_name()
        );
        Self::new(config, playlist)
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn instructions() -> &'static str {
        INSTRUCTIONS
    }

    pub fn playlist(&self) -> &Arc<PlaylistService> {
        &self.playlist
    }

    // ========================================================================
    // JSON views for the HTTP transport
    // ========================================================================
    //
    // rmcp models serialize with MCP field names, so these helpers hand them
    // to serde_json as they are.

    /// Tool metadata as `tools/list` entries.
    pub fn list_tools(&self) -> Vec<Value> {
        self.tool_router.list_all().iter().map(to_json).collect()
    }

    /// Dispatch a tool call through the registry.
    #[cfg(feature = "http")]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        ToolRegistry::new(self.playlist.clone())
            .call_tool(name, arguments)
            .await
    }

    pub async fn list_resources(&self) -> Vec<Value> {
        let resources = self.resource_service.list_resources().await;
        resources.iter().map(to_json).collect()
    }

    pub async fn list_resource_templates(&self) -> Vec<Value> {
        let templates = self.resource_service.list_resource_templates().await;
        templates.iter().map(to_json).collect()
    }

    /// Read a resource; the error is the message sent back to the client.
    pub async fn read_resource(&self, uri: &str) -> Result<Value, String> {
        match self.resource_service.read_resource(uri).await {
            Ok(result) => Ok(to_json(&result)),
            Err(e) => Err(e.to_string()),
        }
    }

    pub async fn list_prompts(&self) -> Vec<Value> {
        let prompts = self.prompt_service.list_prompts().await;
        prompts.iter().map(to_json).collect()
    }

    /// Render a prompt. Non-string argument values are dropped.
    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> Result<Value, String> {
        let arguments = match arguments {
            Some(Value::Object(map)) => Some(string_arguments(map)),
            _ => None,
        };
        match self.prompt_service.get_prompt(name, arguments).await {
            Ok(result) => Ok(to_json(&result)),
            Err(e) => Err(e.to_string()),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Keep the string-valued prompt arguments.
fn string_arguments(map: serde_json::Map<String, Value>) -> HashMap<String, String> {
    map.into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect()
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        Ok(ListResourcesResult {
            resources: self.resource_service.list_resources().await,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        info!("Listing resource templates");
        Ok(ListResourceTemplatesResult {
            resource_templates: self.resource_service.list_resource_templates().await,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        info!("Reading resource: {}", request.uri);
        self.resource_service
            .read_resource(&request.uri)
            .await
            .map_err(|e| McpError::resource_not_found(e.to_string(), None))
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        Ok(ListPromptsResult {
            prompts: self.prompt_service.list_prompts().await,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        let arguments = request.arguments.map(string_arguments);
        self.prompt_service
            .get_prompt(&request.name, arguments)
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::common::test_service;

    fn server() -> McpServer {
        McpServer::new(Config::default(), test_service())
    }

    #[test]
    fn test_server_lists_all_tools() {
        let tools = server().list_tools();
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[test]
    fn test_server_info() {
        let server = server();
        let info = server.get_info();
        assert_eq!(info.server_info.name, "mood-playlist-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("generate_mood_playlist"));
    }

    #[tokio::test]
    async fn test_http_helpers_for_resources_and_prompts() {
        let server = server();
        assert_eq!(server.list_resources().await.len(), 2);
        assert!(server.read_resource("mood://moods/calm").await.is_ok());
        assert!(server.read_resource("nope://x").await.is_err());

        let prompt = server
            .get_prompt("mood_playlist", Some(serde_json::json!({ "mood": "happy" })))
            .await
            .unwrap();
        assert_eq!(prompt["messages"].as_array().unwrap().len(), 1);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_call_tool_through_registry() {
        let result = server()
            .call_tool("get_supported_options", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["isError"], false);
    }
}
