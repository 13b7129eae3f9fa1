//! Mood table resources: the full table and one profile per mood.

use serde_json::{Value, json};

use super::ResourceDefinition;
use crate::domains::playlist::MoodLabel;
use crate::domains::playlist::mapper::{MOOD_TABLE, MoodProfile, mood_profile};
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::service::ResourceKind;

fn profile_json(profile: &MoodProfile) -> Value {
    json!({
        "mood": profile.label,
        "description": profile.label.adjective(),
        "positivity": profile.positivity,
        "intensity": profile.intensity,
        "danceability": profile.danceability,
        "genres": profile.genres,
    })
}

/// Every mood with its target features and genre hints.
pub struct MoodTableResource;

impl ResourceDefinition for MoodTableResource {
    const URI: &'static str = "mood://moods/table";
    const NAME: &'static str = "Mood Table";
    const DESCRIPTION: &'static str =
        "Target positivity, intensity, danceability and genre hints for every supported mood";
    const MIME_TYPE: &'static str = "application/json";
    const KIND: ResourceKind = ResourceKind::MoodTable;
}

impl MoodTableResource {
    pub fn resolve() -> Value {
        Value::Array(MOOD_TABLE.iter().map(profile_json).collect())
    }
}

/// Template resource `mood://moods/{mood}`.
pub struct MoodProfileTemplate;

impl MoodProfileTemplate {
    pub const URI_TEMPLATE: &'static str = "mood://moods/{mood}";
    pub const PREFIX: &'static str = "mood://moods/";
    pub const NAME: &'static str = "Mood Profile";
    pub const DESCRIPTION: &'static str =
        "Features and genre hints for one mood, e.g. mood://moods/joy or mood://moods/happy";

    /// Resolve a concrete URI; the mood may be a label or an alias.
    pub fn resolve(uri: &str) -> Result<Value, ResourceError> {
        let name = uri
            .strip_prefix(Self::PREFIX)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ResourceError::invalid_uri(uri))?;
        let label: MoodLabel = name
            .parse()
            .map_err(|_| ResourceError::not_found(uri))?;
        Ok(profile_json(mood_profile(label)))
    }
}
