//! Supported options tool.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::super::common::json_result;
use crate::domains::playlist::PlaylistService;

/// The tool takes no parameters.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SupportedOptionsParams {}

/// Lists moods, languages, genres and query formats.
pub struct SupportedOptionsTool;

impl SupportedOptionsTool {
    pub const NAME: &'static str = "get_supported_options";

    pub const DESCRIPTION: &'static str =
        "List the moods, languages, genres and duration formats the playlist generator understands, with example queries.";

    pub async fn execute(service: &PlaylistService) -> Result<CallToolResult, McpError> {
        info!("Supported options requested");
        json_result(&service.supported_options().await)
    }

    #[cfg(feature = "http")]
    pub async fn http_handler(
        _arguments: serde_json::Value,
        service: Arc<PlaylistService>,
    ) -> Result<serde_json::Value, crate::domains::tools::ToolError> {
        use super::super::common::{http_value, tool_error};
        let result = Self::execute(&service).await.map_err(tool_error)?;
        Ok(http_value(result))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SupportedOptionsParams>(),
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
        ToolRoute::new_dyn(Self::to_tool(), move |_ctx: ToolCallContext<'_, S>| {
            let service = service.clone();
            async move { Self::execute(&service).await }.boxed()
        })
    }
}
