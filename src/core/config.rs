//! Configuration management for the MCP server.
//!
//! Every setting has a default; `MCP_*` environment variables (optionally
//! from a `.env` file) override them.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use crate::domains::playlist::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_MINUTES};
use crate::domains::playlist::{
    DEFAULT_AVG_TRACK_SECONDS, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_EMOTION_MODEL,
    DEFAULT_MAX_DIRECTIVES,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials.
    pub credentials: CredentialsConfig,

    /// Mood mapping, planning and history settings.
    pub playlist: PlaylistConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Server-wide Last.fm API key. Sessions may bring their own.
    /// Get a key at: https://www.last.fm/api/account/create
    pub lastfm_api_key: Option<String>,

    /// Hugging Face token for the hosted emotion model.
    pub hf_api_token: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "lastfm_api_key",
                &self.lastfm_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "hf_api_token",
                &self.hf_api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Playlist pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Classifier confidence below which the neutral mood is used.
    pub confidence_threshold: f64,

    /// Assumed track length when sizing catalog queries.
    pub avg_track_seconds: u32,

    /// Maximum catalog queries per request.
    pub max_directives: usize,

    /// Timeout for a single catalog query.
    pub fetch_timeout_secs: u64,

    /// Emotion model used when a Hugging Face token is configured.
    pub emotion_model: String,

    /// Directory for per-user history files. In-memory when unset.
    pub history_dir: Option<PathBuf>,

    /// Alternative Last.fm endpoint, mainly for proxies.
    pub lastfm_api_url: Option<String>,

    /// Minutes a session may stay unused before it is dropped.
    pub session_ttl_minutes: i64,

    /// Cap on open sessions.
    pub max_sessions: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            avg_track_seconds: DEFAULT_AVG_TRACK_SECONDS,
            max_directives: DEFAULT_MAX_DIRECTIVES,
            fetch_timeout_secs: 10,
            emotion_model: DEFAULT_EMOTION_MODEL.to_string(),
            history_dir: None,
            lastfm_api_url: None,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mood-playlist-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            playlist: PlaylistConfig::default(),
        }
    }
}

/// Longest accepted session idle time: one year.
const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Read and parse a variable, warning when it is set but unparseable.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", name, raw);
            None
        }
    }
}

/// Read a variable, treating blank values as unset.
fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LASTFM_API_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_string("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_string("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(with_timestamps) = env_parse::<bool>("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = with_timestamps;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config.credentials.lastfm_api_key = env_string("MCP_LASTFM_API_KEY");
        if config.credentials.lastfm_api_key.is_some() {
            info!("Last.fm API key loaded from environment");
        } else {
            warn!(
                "MCP_LASTFM_API_KEY not set - users must start a session with their own key \
                 (get one at https://www.last.fm/api/account/create)"
            );
        }

        config.credentials.hf_api_token = env_string("MCP_HF_API_TOKEN");
        if config.credentials.hf_api_token.is_none() {
            info!("MCP_HF_API_TOKEN not set - using keyword mood classification");
        }

        let playlist = &mut config.playlist;
        if let Some(model) = env_string("MCP_HF_EMOTION_MODEL") {
            playlist.emotion_model = model;
        }
        if let Some(threshold) = env_parse::<f64>("MCP_CONFIDENCE_THRESHOLD") {
            playlist.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(seconds) = env_parse::<u32>("MCP_AVG_TRACK_SECONDS").filter(|s| *s > 0) {
            playlist.avg_track_seconds = seconds;
        }
        if let Some(max) = env_parse::<usize>("MCP_MAX_DIRECTIVES").filter(|m| *m > 0) {
            playlist.max_directives = max;
        }
        if let Some(secs) = env_parse::<u64>("MCP_FETCH_TIMEOUT_SECS").filter(|s| *s > 0) {
            playlist.fetch_timeout_secs = secs;
        }
        if let Some(dir) = env_string("MCP_HISTORY_DIR") {
            info!("Listening history stored in {}", dir);
            playlist.history_dir = Some(PathBuf::from(dir));
        }
        playlist.lastfm_api_url = env_string("MCP_LASTFM_API_URL");
        if let Some(minutes) = env_parse::<i64>("MCP_SESSION_TTL_MINUTES")
            .filter(|m| (1..=MAX_SESSION_TTL_MINUTES).contains(m))
        {
            playlist.session_ttl_minutes = minutes;
        }
        if let Some(max) = env_parse::<usize>("MCP_MAX_SESSIONS").filter(|m| *m > 0) {
            playlist.max_sessions = max;
        }

        config
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::config("server name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.playlist.confidence_threshold) {
            return Err(Error::config(format!(
                "confidence threshold {} is outside 0..=1",
                self.playlist.confidence_threshold
            )));
        }
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.playlist.session_ttl_minutes) {
            return Err(Error::config(format!(
                "session TTL of {} minutes is outside 1..={}",
                self.playlist.session_ttl_minutes, MAX_SESSION_TTL_MINUTES
            )));
        }
        if let Some(dir) = self.playlist.history_dir.as_ref().filter(|d| d.is_file()) {
            return Err(Error::config(format!(
                "history directory {} is a file",
                dir.display()
            )));
        }
        Ok(())
    }
}
