//! Session start tool.
//!
//! Opens a session for a user so that playlists blend in their listening
//! history. A personal Last.fm API key can be attached to the session.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use super::super::common::{json_result, parse_params};
use crate::domains::playlist::PlaylistService;

/// Parameters for the session start tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SessionStartParams {
    #[schemars(description = "Stable identifier of the listener, used to key their history")]
    pub user_id: String,

    #[schemars(description = "Personal Last.fm API key (optional if the server has one)")]
    #[serde(default)]
    pub lastfm_api_key: Option<String>,
}

/// Session start tool.
pub struct SessionStartTool;

impl SessionStartTool {
    pub const NAME: &'static str = "session_start";

    pub const DESCRIPTION: &'static str = "Start a listening session for a user. Pass the returned session_id \
        to generate_mood_playlist to blend the user's history into playlists.";

    #[instrument(skip_all, fields(user_id = %params.user_id))]
    pub async fn execute(
        params: &SessionStartParams,
        service: &PlaylistService,
    ) -> Result<CallToolResult, McpError> {
        let user_id = params.user_id.trim();
        if user_id.is_empty() {
            return Err(McpError::invalid_params("user_id must not be empty", None));
        }

        let session = service
            .start_session(user_id, params.lastfm_api_key.clone())
            .await;
        info!("Session {} opened", session.id);

        json_result(&json!({
            "session_id": session.id,
            "user_id": session.user_id,
            "created_at": session.created_at,
            "credentials": session.providers(),
        }))
    }

    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        service: Arc<PlaylistService>,
    ) -> Result<serde_json::Value, crate::domains::tools::ToolError> {
        use super::super::common::{http_params, http_value, tool_error};
        let params: SessionStartParams = http_params(arguments)?;
        let result = Self::execute(&params, &service).await.map_err(tool_error)?;
        Ok(http_value(result))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SessionStartParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(service: Arc<PlaylistService>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let service = service.clone();
            async move {
                let params: SessionStartParams = parse_params(args)?;
                Self::execute(&params, &service).await
            }
            .boxed()
        })
    }
}
