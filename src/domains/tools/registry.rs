//! Tool Registry - central registration and dispatch for all tools.
//!
//! Lists tool metadata and dispatches HTTP tool calls (when the http
//! feature is enabled) to each tool's `http_handler`.

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use crate::domains::playlist::PlaylistService;

#[cfg(feature = "http")]
use super::error::ToolError;
use super::definitions::{
    AnalyzeMoodTool, GenerateMoodPlaylistTool, SessionLogoutTool, SessionStartTool,
    SupportedOptionsTool,
};

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    service: Arc<PlaylistService>,
}

impl ToolRegistry {
    pub fn new(service: Arc<PlaylistService>) -> Self {
        Self { service }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            GenerateMoodPlaylistTool::NAME,
            AnalyzeMoodTool::NAME,
            SupportedOptionsTool::NAME,
            SessionStartTool::NAME,
            SessionLogoutTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            GenerateMoodPlaylistTool::to_tool(),
            AnalyzeMoodTool::to_tool(),
            SupportedOptionsTool::to_tool(),
            SessionStartTool::to_tool(),
            SessionLogoutTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let service = self.service.clone();
        match name {
            GenerateMoodPlaylistTool::NAME => {
                GenerateMoodPlaylistTool::http_handler(arguments, service).await
            }
            AnalyzeMoodTool::NAME => AnalyzeMoodTool::http_handler(arguments, service).await,
            SupportedOptionsTool::NAME => {
                SupportedOptionsTool::http_handler(arguments, service).await
            }
            SessionStartTool::NAME => SessionStartTool::http_handler(arguments, service).await,
            SessionLogoutTool::NAME => SessionLogoutTool::http_handler(arguments, service).await,
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::common::test_service;

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::new(test_service());
        let names = registry.tool_names();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"generate_mood_playlist"));
        assert!(names.contains(&"analyze_mood"));
        assert!(names.contains(&"get_supported_options"));
        assert!(names.contains(&"session_start"));
        assert!(names.contains(&"session_logout"));
    }

    #[test]
    fn test_all_tools_have_descriptions() {
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|t| t.description.is_some()));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_analyze() {
        let registry = ToolRegistry::new(test_service());
        let result = registry
            .call_tool("analyze_mood", serde_json::json!({ "query": "so happy 😄" }))
            .await;
        let value = tokio_test::assert_ok!(result);
        assert_eq!(value["isError"], false);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_unknown() {
        let registry = ToolRegistry::new(test_service());
        let result = registry.call_tool("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_bad_arguments() {
        let registry = ToolRegistry::new(test_service());
        let result = registry
            .call_tool("generate_mood_playlist", serde_json::json!({ "duration_minutes": 5 }))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
