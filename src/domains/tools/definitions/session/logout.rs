//! Session logout tool.

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
use tracing::instrument;

use super::super::common::{json_result, parse_params, playlist_error};
use crate::domains::playlist::PlaylistService;

/// Parameters for the logout tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SessionLogoutParams {
    #[schemars(description = "Session id returned by session_start")]
    pub session_id: String,

    #[schemars(description = "Also erase the user's listening history (default: false)")]
    #[serde(default)]
    pub forget_history: bool,
}

/// Ends a session and drops its cached credentials.
pub struct SessionLogoutTool;

impl SessionLogoutTool {
    pub const NAME: &'static str = "session_logout";

    pub const DESCRIPTION: &'static str =
        "End a session, discarding its cached credentials. Optionally erase the user's listening history.";

    #[instrument(skip_all, fields(forget_history = params.forget_history))]
    pub async fn execute(
        params: &SessionLogoutParams,
        service: &PlaylistService,
    ) -> Result<CallToolResult, McpError> {
        match service
            .logout(&params.session_id, params.forget_history)
            .await
        {
            Ok(session) => json_result(&json!({
                "status": "logged_out",
                "user_id": session.user_id,
                "history_cleared": params.forget_history,
            })),
            Err(e) => playlist_error(e),
        }
    }

    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        service: Arc<PlaylistService>,
    ) -> Result<serde_json::Value, crate::domains::tools::ToolError> {
        use super::super::common::{http_params, http_value, tool_error};
        let params: SessionLogoutParams = http_params(arguments)?;
        let result = Self::execute(&params, &service).await.map_err(tool_error)?;
        Ok(http_value(result))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SessionLogoutParams>(),
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
                let params: SessionLogoutParams = parse_params(args)?;
                Self::execute(&params, &service).await
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::common::test_service;

    #[tokio::test]
    async fn test_logout_ends_session() {
        let service = test_service();
        let session = service.start_session("carol", None).await;
        let params = SessionLogoutParams {
            session_id: session.id.clone(),
            forget_history: true,
        };

        let result = SessionLogoutTool::execute(&params, &service).await.unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert!(service.sessions().get(&session.id).await.is_none());

        // A second logout refers to an unknown session.
        assert!(SessionLogoutTool::execute(&params, &service).await.is_err());
    }
}
