//! Playlist-specific error types.

use thiserror::Error;

/// Errors that can occur while turning a mood query into a playlist.
///
/// Only `NoTracksFound`, `AuthenticationRequired` and `InvalidRequest` ever
/// reach the caller. The others are recovered inside the pipeline.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// The classifier produced a label with no entry in the mood table.
    #[error("Unsupported mood label: {0}")]
    UnsupportedMood(String),

    /// The mood classifier could not be reached or returned garbage.
    #[error("Mood classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// A single catalog directive failed and may succeed on retry.
    #[error("Catalog request failed: {0}")]
    CatalogTransient(String),

    /// Neither history nor recommendations yielded a single track.
    #[error("No tracks found for this mood, try a different prompt")]
    NoTracksFound,

    /// The catalog needs credentials before it can be queried.
    #[error("Authentication required: visit {action_url}")]
    AuthenticationRequired { action_url: String },

    /// The caller sent a request that can never succeed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The history store failed to read or write.
    #[error("History store error: {0}")]
    History(String),
}

impl PlaylistError {
    /// Create a new "unsupported mood" error.
    pub fn unsupported_mood(label: impl Into<String>) -> Self {
        Self::UnsupportedMood(label.into())
    }

    /// Create a new "classifier unavailable" error.
    pub fn classifier_unavailable(msg: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(msg.into())
    }

    /// Create a new "catalog transient" error.
    pub fn catalog_transient(msg: impl Into<String>) -> Self {
        Self::CatalogTransient(msg.into())
    }

    /// Create a new "authentication required" error.
    pub fn authentication_required(action_url: impl Into<String>) -> Self {
        Self::AuthenticationRequired {
            action_url: action_url.into(),
        }
    }

    /// Create a new "invalid request" error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new "history" error.
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Whether the error is recovered inside the pipeline rather than surfaced.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMood(_)
                | Self::ClassifierUnavailable(_)
                | Self::CatalogTransient(_)
                | Self::History(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(PlaylistError::unsupported_mood("disgust").is_recoverable());
        assert!(PlaylistError::classifier_unavailable("down").is_recoverable());
        assert!(PlaylistError::catalog_transient("503").is_recoverable());
        assert!(!PlaylistError::NoTracksFound.is_recoverable());
        assert!(!PlaylistError::authentication_required("https://x").is_recoverable());
    }

    #[test]
    fn test_authentication_message_carries_url() {
        let err = PlaylistError::authentication_required("https://www.last.fm/api");
        assert!(err.to_string().contains("https://www.last.fm/api"));
    }
}
