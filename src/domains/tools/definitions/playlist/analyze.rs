//! Mood analysis tool.
//!
//! Shows how a query is read (mood, emojis, languages, duration, search
//! plan) without building a playlist.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::super::common::{json_result, parse_params, playlist_error};
use crate::domains::playlist::PlaylistService;

/// Parameters for the mood analysis tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeMoodParams {
    #[schemars(description = "Text and/or emojis to analyze")]
    pub query: String,
}

/// Analyze mood tool.
pub struct AnalyzeMoodTool;

impl AnalyzeMoodTool {
    pub const NAME: &'static str = "analyze_mood";

    pub const DESCRIPTION: &'static str = "Analyze the mood, emojis, languages and duration in a query \
        and show the catalog searches a playlist would use, without generating one.";

    #[instrument(skip_all, fields(query = %params.query))]
    pub async fn execute(
        params: &AnalyzeMoodParams,
        service: &PlaylistService,
    ) -> Result<CallToolResult, McpError> {
        match service.analyze(&params.query).await {
            Ok(analysis) => json_result(&analysis),
            Err(e) => playlist_error(e),
        }
    }

    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        service: Arc<PlaylistService>,
    ) -> Result<serde_json::Value, crate::domains::tools::ToolError> {
        use super::super::common::{http_params, http_value, tool_error};
        let params: AnalyzeMoodParams = http_params(arguments)?;
        let result = Self::execute(&params, &service).await.map_err(tool_error)?;
        Ok(http_value(result))
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<AnalyzeMoodParams>(),
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
                let params: AnalyzeMoodParams = parse_params(args)?;
                Self::execute(&params, &service).await
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::common::{result_text, test_service};

    #[tokio::test]
    async fn test_analyze_reports_mood_and_plan() {
        let params = AnalyzeMoodParams {
            query: "feeling so sad tonight 😢 1 hour".to_string(),
        };
        let result = AnalyzeMoodTool::execute(&params, &test_service()).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(body["mood"]["applied"], "sadness");
        assert_eq!(body["duration_minutes"], 60);
        assert_eq!(body["emojis"][0], "😢");
        assert!(!body["search_plan"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_empty_query() {
        let params = AnalyzeMoodParams {
            query: String::new(),
        };
        assert!(AnalyzeMoodTool::execute(&params, &test_service()).await.is_err());
    }
}
