//! Resource service implementation.
//!
//! Resources are defined in `definitions/` and registered via `registry.rs`.
//! Content is computed at read time from the playlist service.

use rmcp::model::{ReadResourceResult, Resource, ResourceContents, ResourceTemplate};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::definitions::{MoodProfileTemplate, MoodTableResource, ServerInfoResource};
use super::error::ResourceError;
use super::registry::{get_all_resource_templates, get_all_resources};
use crate::core::config::ServerConfig;
use crate::domains::playlist::PlaylistService;

/// Service for listing and reading resources.
pub struct ResourceService {
    server: ServerConfig,

    playlist: Arc<PlaylistService>,

    /// Key: resource URI.
    resources: HashMap<String, ResourceEntry>,

    templates: Vec<ResourceTemplate>,
}

/// An entry in the resource registry.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub resource: Resource,
    pub kind: ResourceKind,
}

/// Which resolver produces a resource's content. Content is computed on
/// every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ServerInfo,
    MoodTable,
}

impl ResourceService {
    pub fn new(server: ServerConfig, playlist: Arc<PlaylistService>) -> Self {
        info!("Initializing ResourceService");

        let mut service = Self {
            server,
            playlist,
            resources: HashMap::new(),
            templates: get_all_resource_templates(),
        };
        for entry in get_all_resources() {
            service.register_resource(entry);
        }
        service
    }

    pub fn register_resource(&mut self, entry: ResourceEntry) {
        debug!("Registering resource: {}", entry.resource.raw.uri);
        self.resources
            .insert(entry.resource.raw.uri.to_string(), entry);
    }

    /// List all available resources, sorted by URI.
    pub async fn list_resources(&self) -> Vec<Resource> {
        let mut resources: Vec<_> = self
            .resources
            .values()
            .map(|entry| entry.resource.clone())
            .collect();
        resources.sort_by(|a, b| a.raw.uri.cmp(&b.raw.uri));
        resources
    }

    pub async fn list_resource_templates(&self) -> Vec<ResourceTemplate> {
        self.templates.clone()
    }

    /// Read a resource by URI, falling back to the mood profile template.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let value = match self.resources.get(uri).map(|entry| entry.kind) {
            Some(ResourceKind::ServerInfo) => {
                ServerInfoResource::resolve(&self.server, &self.playlist).await
            }
            Some(ResourceKind::MoodTable) => MoodTableResource::resolve(),
            None if uri.starts_with(MoodProfileTemplate::PREFIX) => {
                MoodProfileTemplate::resolve(uri)?
            }
            None => return Err(ResourceError::not_found(uri)),
        };

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(
                serde_json::to_string_pretty(&value)?,
                uri,
            )],
        })
    }
}
