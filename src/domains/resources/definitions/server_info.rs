//! Server info resource definition.

use serde_json::{Value, json};

use super::ResourceDefinition;
use crate::core::config::ServerConfig;
use crate::domains::playlist::PlaylistService;
use crate::domains::resources::service::ResourceKind;

/// Server information resource (dynamic).
///
/// Reports which classifier strategy was selected at startup, which
/// catalog is wired in and how many sessions are open.
pub struct ServerInfoResource;

impl ResourceDefinition for ServerInfoResource {
    const URI: &'static str = "mood://server/info";
    const NAME: &'static str = "Server Information";
    const DESCRIPTION: &'static str =
        "Server version, active mood classifier, music catalog and open sessions";
    const MIME_TYPE: &'static str = "application/json";
    const KIND: ResourceKind = ResourceKind::ServerInfo;
}

impl ServerInfoResource {
    pub async fn resolve(server: &ServerConfig, playlist: &PlaylistService) -> Value {
        json!({
            "server": server.name,
            "version": server.version,
            "classifier": playlist.classifier_name(),
            "catalog": playlist.catalog_name(),
            "confidence_threshold": playlist.mapper().confidence_threshold(),
            "open_sessions": playlist.sessions().len().await,
        })
    }
}
