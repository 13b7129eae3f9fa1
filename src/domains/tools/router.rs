//! Tool Router - builds the rmcp ToolRouter for STDIO transport.
//!
//! Each tool knows how to create its own route; this module only lists them.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::domains::playlist::PlaylistService;

use super::definitions::{
    AnalyzeMoodTool, GenerateMoodPlaylistTool, SessionLogoutTool, SessionStartTool,
    SupportedOptionsTool,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(service: Arc<PlaylistService>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(GenerateMoodPlaylistTool::create_route(service.clone()))
        .with_route(AnalyzeMoodTool::create_route(service.clone()))
        .with_route(SupportedOptionsTool::create_route(service.clone()))
        .with_route(SessionStartTool::create_route(service.clone()))
        .with_route(SessionLogoutTool::create_route(service))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;
    use crate::domains::tools::definitions::common::test_service;

    struct TestServer {}

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_service());
        let tools = router.list_all();
        assert_eq!(tools.len(), 5);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"generate_mood_playlist"));
        assert!(names.contains(&"analyze_mood"));
        assert!(names.contains(&"session_start"));
    }

    #[test]
    fn test_registry_matches_router() {
        let service = test_service();
        let registry = ToolRegistry::new(service.clone());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(service);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
