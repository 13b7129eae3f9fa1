//! Mood playlist generation tool.
//!
//! Takes a free-text mood query (emojis welcome) and returns a playlist
//! blended from the user's history and catalog recommendations.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::super::common::{json_result, parse_params, playlist_error};
use crate::domains::playlist::PlaylistService;

/// Longest playlist the tool will build.
const MAX_DURATION_MINUTES: u32 = 600;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the playlist generation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GeneratePlaylistParams {
    /// Natural-language mood request, e.g. "40 minutes of hindi songs that make me feel 😎".
    #[schemars(description = "Mood request in natural language; emojis, durations \
                              ('1 hour', '45 min', '10 songs') and languages are understood")]
    pub query: String,

    /// Overrides any duration stated in the query.
    #[schemars(description = "Playlist length in minutes (overrides the query)")]
    #[serde(default)]
    pub duration_minutes: Option<u32>,

    #[schemars(description = "Custom playlist name")]
    #[serde(default)]
    pub playlist_name: Option<String>,

    #[schemars(description = "Preferred language, e.g. 'hindi', 'english', 'punjabi'")]
    #[serde(default)]
    pub language: Option<String>,

    #[schemars(description = "Preferred genre, searched before mood-derived genres")]
    #[serde(default)]
    pub genre: Option<String>,

    /// Session from `session_start`; enables history blending and personal credentials.
    #[schemars(description = "Session id from session_start (optional)")]
    #[serde(default)]
    pub session_id: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Generate mood playlist tool.
pub struct GenerateMoodPlaylistTool;

impl GenerateMoodPlaylistTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "generate_mood_playlist";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Generate a playlist matching a mood described in free text and emojis. \
        Returns the track list, platform links, and the history/recommendation breakdown.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(query = %params.query))]
    pub async fn execute(
        params: &GeneratePlaylistParams,
        service: &PlaylistService,
    ) -> Result<CallToolResult, McpError> {
        info!("Generate playlist tool called");

        if let Some(minutes) = params.duration_minutes.filter(|m| *m > MAX_DURATION_MINUTES) {
            return Err(McpError::invalid_params(
                format!("duration_minutes must be at most {MAX_DURATION_MINUTES}, got {minutes}"),
                None,
            ));
        }

        let request = PlaylistService::request_from_query(
            &params.query,
            params.duration_minutes,
            params.playlist_name.clone(),
        )
        .with_overrides(params.language.clone(), params.genre.clone())
        .with_session(params.session_id.clone());

        match service.generate(request).await {
            Ok(response) => json_result(&response),
            Err(e) => playlist_error(e),
        }
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        service: Arc<PlaylistService>,
    ) -> Result<serde_json::Value, crate::domains::tools::ToolError> {
        use super::super::common::{http_params, http_value, tool_error};
        let params: GeneratePlaylistParams = http_params(arguments)?;
        let result = Self::execute(&params, &service).await.map_err(tool_error)?;
        Ok(http_value(result))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<GeneratePlaylistParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(service: Arc<PlaylistService>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let service = service.clone();
            async move {
                let params: GeneratePlaylistParams = parse_params(args)?;
                Self::execute(&params, &service).await
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::common::{result_text, test_service};

    fn params(query: &str) -> GeneratePlaylistParams {
        GeneratePlaylistParams {
            query: query.to_string(),
            duration_minutes: None,
            playlist_name: None,
            language: None,
            genre: None,
            session_id: None,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_playlist_json() {
        let service = test_service();
        let result = GenerateMoodPlaylistTool::execute(&params("happy songs 😊"), &service)
            .await
            .unwrap();
        assert!(!result.is_error.unwrap_or(false));

        let body: serde_json::Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(body["status"], "success");
        assert!(body["playlist_url"].as_str().unwrap().starts_with("https://"));
        assert!(!body["track_list"].as_array().unwrap().is_empty());
        assert!(body["breakdown"]["recommendation_share"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_language_override_reaches_catalog() {
        let service = test_service();
        let mut p = params("something happy");
        p.language = Some("hindi".to_string());
        p.duration_minutes = Some(10);
        let result = GenerateMoodPlaylistTool::execute(&p, &service).await.unwrap();
        let text = result_text(&result);
        assert!(text.contains("bollywood-") || text.contains("hindi-"));
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid_params() {
        let service = test_service();
        let result = GenerateMoodPlaylistTool::execute(&params("  "), &service).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_excessive_duration_is_invalid_params() {
        let service = test_service();
        let mut p = params("calm");
        p.duration_minutes = Some(10_000);
        assert!(GenerateMoodPlaylistTool::execute(&p, &service).await.is_err());
    }

    #[tokio::test]
    async fn test_no_tracks_is_tool_error() {
        use crate::domains::playlist::{InMemoryHistoryStore, KeywordClassifier, StaticCatalog};

        let service = PlaylistService::new(
            Arc::new(KeywordClassifier),
            Arc::new(StaticCatalog::new()),
            Arc::new(InMemoryHistoryStore::new()),
        );
        let result = GenerateMoodPlaylistTool::execute(&params("happy"), &service)
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(result_text(&result).contains("try a different prompt"));
    }

    #[test]
    fn test_tool_metadata() {
        let tool = GenerateMoodPlaylistTool::to_tool();
        assert_eq!(tool.name, "generate_mood_playlist");
        let schema = serde_json::to_value(tool.input_schema.as_ref()).unwrap();
        assert!(schema["properties"]["query"].is_object());
        assert!(schema["properties"]["session_id"].is_object());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_generate_http_handler() {
        let args = serde_json::json!({ "query": "energetic workout 🔥", "duration_minutes": 20 });
        let result = GenerateMoodPlaylistTool::http_handler(args, test_service()).await;
        let value = result.unwrap();
        assert_eq!(value["isError"], false);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_generate_http_handler_missing_query() {
        let result =
            GenerateMoodPlaylistTool::http_handler(serde_json::json!({}), test_service()).await;
        assert!(result.is_err());
    }
}
