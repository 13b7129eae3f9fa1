//! Common helpers shared by the tool definitions.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, JsonObject},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::warn;

use crate::domains::playlist::PlaylistError;

/// Decode tool arguments into a parameter struct.
pub fn parse_params<T: DeserializeOwned>(args: JsonObject) -> Result<T, McpError> {
    serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

/// Create an error result with a text message.
pub fn error_result(message: &str) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Serialize a value as the pretty-printed JSON text of a successful result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Turn a pipeline failure into what the caller sees.
///
/// Invalid requests become protocol-level `invalid_params`; everything else
/// is a tool error the assistant can relay to the user.
pub fn playlist_error(err: PlaylistError) -> Result<CallToolResult, McpError> {
    warn!("Playlist request failed: {}", err);
    match err {
        PlaylistError::InvalidRequest(msg) => Err(McpError::invalid_params(msg, None)),
        PlaylistError::AuthenticationRequired { action_url } => {
            let body = json!({
                "status": "authentication_required",
                "message": "Catalog credentials are required. Start a session with your own \
                            Last.fm API key, or configure MCP_LASTFM_API_KEY.",
                "action_url": action_url,
            });
            Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
        }
        other => Ok(error_result(&other.to_string())),
    }
}

/// Decode HTTP tool arguments.
#[cfg(feature = "http")]
pub fn http_params<T: DeserializeOwned>(
    arguments: serde_json::Value,
) -> Result<T, crate::domains::tools::ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| crate::domains::tools::ToolError::invalid_arguments(e.to_string()))
}

/// Classify a protocol error raised by a tool for the HTTP transport.
#[cfg(feature = "http")]
pub fn tool_error(err: McpError) -> crate::domains::tools::ToolError {
    use crate::domains::tools::ToolError;
    if err.code == rmcp::model::ErrorCode::INVALID_PARAMS {
        ToolError::invalid_arguments(err.message)
    } else {
        ToolError::execution_failed(err.message)
    }
}

/// Shape a tool result for the HTTP transport.
#[cfg(feature = "http")]
pub fn http_value(result: CallToolResult) -> serde_json::Value {
    json!({
        "content": result.content,
        "isError": result.is_error.unwrap_or(false)
    })
}

/// Text of the first content item of a result.
#[cfg(test)]
pub fn result_text(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        rmcp::model::RawContent::Text(text) => &text.text,
        _ => panic!("Expected text content"),
    }
}

/// Service wired to in-memory collaborators for tool tests.
#[cfg(test)]
pub fn test_service() -> std::sync::Arc<crate::domains::playlist::PlaylistService> {
    use crate::domains::playlist::model::{Platform, TrackSource};
    use crate::domains::playlist::{
        InMemoryHistoryStore, KeywordClassifier, PlaylistService, StaticCatalog, TrackCandidate,
    };
    use std::sync::Arc;

    let mut catalog = StaticCatalog::new();
    for tag in ["pop", "dance", "funk", "reggae", "alternative", "indie", "bollywood", "hindi"] {
        let tracks = (0..10)
            .map(|i| {
                TrackCandidate::new(format!("{tag}-{i}"), 210, TrackSource::Recommendation, 0.5)
                    .with_metadata(format!("{tag} song {i}"), "Various Artists")
                    .with_platform(Platform::LastFm)
            })
            .collect();
        catalog = catalog.with_tag(tag, tracks);
    }

    Arc::new(PlaylistService::new(
        Arc::new(KeywordClassifier),
        Arc::new(catalog),
        Arc::new(InMemoryHistoryStore::new()),
    ))
}
