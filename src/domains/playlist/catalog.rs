//! Music catalog clients.
//!
//! The pipeline only sees the [`CatalogClient`] trait. [`LastFmCatalog`]
//! talks to the Last.fm web API; [`StaticCatalog`] serves tracks from memory.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use super::error::PlaylistError;
use super::model::{MAX_TRACK_SECONDS, Platform, TrackCandidate, TrackSource};
use super::planner::{DEFAULT_AVG_TRACK_SECONDS, SearchDirective};
use super::scoring::rank_score;

// ============================================================================
// Configuration & Constants
// ============================================================================

const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
/// Where users obtain a Last.fm API key.
pub const LASTFM_ACCOUNT_URL: &str = "https://www.last.fm/api/account/create";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("mood-playlist-mcp/", env!("CARGO_PKG_VERSION"));

/// Last.fm error codes that mean the credentials are wrong.
const LASTFM_AUTH_ERRORS: [i64; 4] = [4, 9, 10, 14];

// ============================================================================
// Catalog trait
// ============================================================================

/// A searchable music catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Catalog name, used for logging.
    fn name(&self) -> &str;

    /// Run one directive. An empty result is not an error.
    async fn search(
        &self,
        directive: &SearchDirective,
        token: Option<&str>,
    ) -> Result<Vec<TrackCandidate>, PlaylistError>;

    /// Most popular tags in the catalog, for discovery.
    async fn top_tags(&self, _limit: usize) -> Result<Vec<String>, PlaylistError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Last.fm
// ============================================================================

/// Last.fm catalog backed by `tag.gettoptracks`.
pub struct LastFmCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LastFmCatalog {
    /// Create a client. A missing key is accepted here and reported as
    /// [`PlaylistError::AuthenticationRequired`] on first use.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: LASTFM_API_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn resolve_key<'a>(&'a self, token: Option<&'a str>) -> Result<&'a str, PlaylistError> {
        token
            .or(self.api_key.as_deref())
            .ok_or_else(|| PlaylistError::authentication_required(LASTFM_ACCOUNT_URL))
    }

    fn build_url(&self, params: &[(&str, &str)]) -> Result<String, PlaylistError> {
        let query = serde_urlencoded::to_string(params)
            .map_err(|e| PlaylistError::catalog_transient(e.to_string()))?;
        Ok(format!("{}?{}", self.base_url, query))
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<Value, PlaylistError> {
        let url = self.build_url(params)?;
        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Last.fm request failed: {}", e);
            PlaylistError::catalog_transient(e.to_string())
        })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PlaylistError::catalog_transient(format!("HTTP {status}: {e}")))?;

        check_api_error(&body)?;
        if !status.is_success() {
            return Err(PlaylistError::catalog_transient(format!("HTTP {status}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl CatalogClient for LastFmCatalog {
    fn name(&self) -> &str {
        "lastfm"
    }

    #[instrument(skip(self, token), fields(tag = %directive.tag))]
    async fn search(
        &self,
        directive: &SearchDirective,
        token: Option<&str>,
    ) -> Result<Vec<TrackCandidate>, PlaylistError> {
        let key = self.resolve_key(token)?;
        let limit = directive.limit.to_string();
        let body = self
            .call(&[
                ("method", "tag.gettoptracks"),
                ("tag", directive.tag.as_str()),
                ("limit", limit.as_str()),
                ("api_key", key),
                ("format", "json"),
            ])
            .await?;

        let tracks = parse_top_tracks(&body);
        debug!("Last.fm returned {} usable track(s)", tracks.len());
        Ok(tracks)
    }

    async fn top_tags(&self, limit: usize) -> Result<Vec<String>, PlaylistError> {
        let key = self.resolve_key(None)?;
        let body = self
            .call(&[
                ("method", "tag.gettoptags"),
                ("api_key", key),
                ("format", "json"),
            ])
            .await?;

        Ok(as_list(&body["toptags"]["tag"])
            .iter()
            .filter_map(|t| t["name"].as_str())
            .take(limit)
            .map(str::to_string)
            .collect())
    }
}

/// Map a Last.fm `{"error": n, "message": ...}` body onto our errors.
fn check_api_error(body: &Value) -> Result<(), PlaylistError> {
    let Some(code) = body.get("error").and_then(Value::as_i64) else {
        return Ok(());
    };
    let message = body["message"].as_str().unwrap_or("unknown error");
    warn!("Last.fm API error {}: {}", code, message);

    if LASTFM_AUTH_ERRORS.contains(&code) {
        Err(PlaylistError::authentication_required(LASTFM_ACCOUNT_URL))
    } else {
        Err(PlaylistError::catalog_transient(format!(
            "Last.fm error {code}: {message}"
        )))
    }
}

/// Last.fm returns a bare object instead of a one-element array.
fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// Last.fm encodes numbers as strings, sometimes.
fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Parse a `tag.gettoptracks` body into ranked candidates.
///
/// Tracks without an artist or title are skipped. The id is the
/// MusicBrainz id when present, otherwise `artist|title` in lowercase.
pub fn parse_top_tracks(body: &Value) -> Vec<TrackCandidate> {
    let entries = as_list(&body["tracks"]["track"]);
    let page_len = entries.len();
    let mut seen = HashSet::new();

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(rank, entry)| {
            let title = entry["name"].as_str().unwrap_or_default().trim();
            let artist = match &entry["artist"] {
                Value::Object(a) => a.get("name").and_then(Value::as_str).unwrap_or_default(),
                Value::String(s) => s.as_str(),
                _ => "",
            }
            .trim();
            if title.is_empty() || artist.is_empty() {
                return None;
            }

            let id = match entry["mbid"].as_str().map(str::trim) {
                Some(mbid) if !mbid.is_empty() => mbid.to_string(),
                _ => format!("{}|{}", artist.to_lowercase(), title.to_lowercase()),
            };
            if !seen.insert(id.clone()) {
                return None;
            }

            let duration = as_u32(&entry["duration"])
                .filter(|d| (1..=MAX_TRACK_SECONDS).contains(d))
                .unwrap_or(DEFAULT_AVG_TRACK_SECONDS);

            Some(
                TrackCandidate::new(
                    id,
                    duration,
                    TrackSource::Recommendation,
                    rank_score(rank, page_len),
                )
                .with_metadata(title, artist)
                .with_platform(Platform::LastFm),
            )
        })
        .collect()
}

// ============================================================================
// In-memory catalog
// ============================================================================

/// Catalog answering from a fixed tag → tracks table.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    tags: HashMap<String, Vec<TrackCandidate>>,
    failing: HashSet<String>,
    requires_token: bool,
    delay: Option<Duration>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>, tracks: Vec<TrackCandidate>) -> Self {
        self.tags.insert(tag.into().to_lowercase(), tracks);
        self
    }

    /// Make searches for `tag` fail with a transient error.
    pub fn failing_on(mut self, tag: impl Into<String>) -> Self {
        self.failing.insert(tag.into().to_lowercase());
        self
    }

    /// Reject searches that carry no token.
    pub fn requiring_token(mut self) -> Self {
        self.requires_token = true;
        self
    }

    /// Delay every search, to simulate a slow backend.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        directive: &SearchDirective,
        token: Option<&str>,
    ) -> Result<Vec<TrackCandidate>, PlaylistError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.requires_token && token.is_none() {
            return Err(PlaylistError::authentication_required("https://example.invalid/login"));
        }
        if self.failing.contains(&directive.tag) {
            return Err(PlaylistError::catalog_transient(format!(
                "tag '{}' unavailable",
                directive.tag
            )));
        }

        Ok(self
            .tags
            .get(&directive.tag)
            .map(|tracks| tracks.iter().take(directive.limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn top_tags(&self, limit: usize) -> Result<Vec<String>, PlaylistError> {
        let mut tags: Vec<_> = self.tags.keys().cloned().collect();
        tags.sort();
        tags.truncate(limit);
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::playlist::planner::DirectiveOrigin;
    use serde_json::json;

    #[test]
    fn test_parse_top_tracks() {
        let body = json!({
            "tracks": {
                "track": [
                    {"name": "Kesariya", "duration": "268", "mbid": "",
                     "artist": {"name": "Arijit Singh"}},
                    {"name": "Levitating", "duration": "0", "mbid": "abc-123",
                     "artist": {"name": "Dua Lipa"}},
                    {"name": "", "duration": "200", "artist": {"name": "Nobody"}},
                    {"name": "Forever", "duration": "4294967000", "mbid": "",
                     "artist": {"name": "Drone"}},
                    {"name": "Kesariya", "duration": "268", "mbid": "",
                     "artist": {"name": "Arijit Singh"}}
                ]
            }
        });

        let tracks = parse_top_tracks(&body);
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id, "arijit singh|kesariya");
        assert_eq!(tracks[0].duration_seconds, 268);
        assert_eq!(tracks[0].attributes_score, 1.0);
        assert_eq!(tracks[0].platform, Platform::LastFm);
        assert_eq!(tracks[1].id, "abc-123");
        assert_eq!(tracks[1].duration_seconds, DEFAULT_AVG_TRACK_SECONDS);
        assert!(tracks[1].attributes_score < 1.0);
        assert_eq!(tracks[2].id, "drone|forever");
        assert_eq!(tracks[2].duration_seconds, DEFAULT_AVG_TRACK_SECONDS);
    }

    #[test]
    fn test_parse_single_object_track() {
        let body = json!({
            "tracks": {"track": {"name": "Solo", "duration": 180, "artist": "Someone"}}
        });
        let tracks = parse_top_tracks(&body);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].duration_seconds, 180);
        assert_eq!(tracks[0].artist, "Someone");
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_top_tracks(&json!({})).is_empty());
    }

    #[test]
    fn test_check_api_error() {
        assert!(check_api_error(&json!({"tracks": {}})).is_ok());
        assert!(matches!(
            check_api_error(&json!({"error": 10, "message": "Invalid API key"})),
            Err(PlaylistError::AuthenticationRequired { .. })
        ));
        assert!(matches!(
            check_api_error(&json!({"error": 8, "message": "Operation failed"})),
            Err(PlaylistError::CatalogTransient(_))
        ));
    }

    #[tokio::test]
    async fn test_lastfm_without_key_requires_authentication() {
        let catalog = LastFmCatalog::new(None);
        let directive = SearchDirective {
            tag: "pop".to_string(),
            limit: 5,
            origin: DirectiveOrigin::Mood,
        };
        let result = catalog.search(&directive, None).await;
        match result {
            Err(PlaylistError::AuthenticationRequired { action_url }) => {
                assert_eq!(action_url, LASTFM_ACCOUNT_URL)
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_url_encodes_tags() {
        let catalog = LastFmCatalog::new(Some("k".to_string()));
        let url = catalog
            .build_url(&[("tag", "r&b"), ("api_key", "k")])
            .unwrap();
        assert_eq!(url, format!("{LASTFM_API_URL}?tag=r%26b&api_key=k"));
    }

    #[tokio::test]
    async fn test_static_catalog_respects_limit() {
        let tracks = (0..10)
            .map(|i| TrackCandidate::new(format!("t{i}"), 200, TrackSource::Recommendation, 0.5))
            .collect();
        let catalog = StaticCatalog::new().with_tag("Pop", tracks);
        let directive = SearchDirective {
            tag: "pop".to_string(),
            limit: 4,
            origin: DirectiveOrigin::Mood,
        };
        assert_eq!(catalog.search(&directive, None).await.unwrap().len(), 4);
    }

    // Integration tests (require network, run with: cargo test -- --ignored)
    #[ignore]
    #[tokio::test]
    async fn test_lastfm_search_live() {
        let key = std::env::var("MCP_LASTFM_API_KEY").expect("MCP_LASTFM_API_KEY not set");
        let catalog = LastFmCatalog::new(Some(key));
        let directive = SearchDirective {
            tag: "pop".to_string(),
            limit: 5,
            origin: DirectiveOrigin::Mood,
        };
        let tracks = catalog.search(&directive, None).await.unwrap();
        assert!(!tracks.is_empty());
    }
}
