//! Core data model shared by the playlist pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::error::PlaylistError;

// ============================================================================
// Mood
// ============================================================================

/// Emotion labels understood by the feature mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Calm,
    Romantic,
    Nostalgic,
    Energetic,
    Neutral,
}

impl MoodLabel {
    /// Every label, in table order.
    pub const ALL: [MoodLabel; 10] = [
        Self::Joy,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Surprise,
        Self::Calm,
        Self::Romantic,
        Self::Nostalgic,
        Self::Energetic,
        Self::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Calm => "calm",
            Self::Romantic => "romantic",
            Self::Nostalgic => "nostalgic",
            Self::Energetic => "energetic",
            Self::Neutral => "neutral",
        }
    }

    /// Everyday word for the mood, used in playlist names and search links.
    pub fn adjective(self) -> &'static str {
        match self {
            Self::Joy => "happy",
            Self::Sadness => "sad",
            Self::Anger => "angry",
            Self::Fear => "anxious",
            Self::Surprise => "excited",
            Self::Calm => "calm",
            Self::Romantic => "romantic",
            Self::Nostalgic => "nostalgic",
            Self::Energetic => "energetic",
            Self::Neutral => "chill",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = PlaylistError;

    /// Parse a classifier label, accepting the aliases emitted by common
    /// emotion models (go_emotions, sentiment heads).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = match s.trim().to_lowercase().as_str() {
            "joy" | "happy" | "happiness" | "amusement" | "optimism" | "gratitude" | "pride"
            | "relief" | "admiration" | "approval" | "positive" => Self::Joy,
            "sadness" | "sad" | "grief" | "disappointment" | "remorse" | "negative" => {
                Self::Sadness
            }
            "anger" | "angry" | "annoyance" | "rage" | "disapproval" => Self::Anger,
            "fear" | "anxious" | "nervousness" | "worry" => Self::Fear,
            "surprise" | "excited" | "excitement" | "amazement" | "wonder" | "realization"
            | "curiosity" => Self::Surprise,
            "calm" | "peaceful" | "relaxed" => Self::Calm,
            "romantic" | "love" | "caring" | "desire" => Self::Romantic,
            "nostalgic" | "nostalgia" => Self::Nostalgic,
            "energetic" | "enthusiasm" => Self::Energetic,
            "neutral" | "confusion" | "boredom" => Self::Neutral,
            _ => return Err(PlaylistError::unsupported_mood(s)),
        };
        Ok(label)
    }
}

/// Classifier output consumed by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub label: MoodLabel,
    /// Classifier confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub language_hint: Option<String>,
    /// Emoji valence in `0.0..=1.0`, when the query carried emojis.
    pub emoji_contribution: Option<f64>,
}

impl MoodSignal {
    pub fn new(label: MoodLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            language_hint: None,
            emoji_contribution: None,
        }
    }

    /// The signal used whenever classification is impossible.
    pub fn neutral() -> Self {
        Self::new(MoodLabel::Neutral, 1.0)
    }

    pub fn with_language_hint(mut self, hint: Option<String>) -> Self {
        self.language_hint = hint;
        self
    }

    pub fn with_emoji_contribution(mut self, valence: Option<f64>) -> Self {
        self.emoji_contribution = valence.map(|v| v.clamp(0.0, 1.0));
        self
    }
}

// ============================================================================
// Features
// ============================================================================

/// Catalog-independent description of the music that fits a mood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTarget {
    pub positivity: f64,
    pub intensity: f64,
    pub danceability: f64,
    pub genre_hints: BTreeSet<String>,
    pub language_hints: BTreeSet<String>,
}

impl FeatureTarget {
    /// Project onto the measurable dimensions.
    pub fn features(&self) -> TrackFeatures {
        TrackFeatures {
            positivity: self.positivity,
            intensity: self.intensity,
            danceability: self.danceability,
        }
    }
}

/// Measured audio attributes of a single track, all in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub positivity: f64,
    pub intensity: f64,
    pub danceability: f64,
}

// ============================================================================
// Tracks
// ============================================================================

/// Pool a candidate was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    History,
    Recommendation,
}

/// Music service a track identifier belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Spotify,
    AppleMusic,
    YouTube,
    LastFm,
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Spotify => "spotify",
            Self::AppleMusic => "apple_music",
            Self::YouTube => "youtube",
            Self::LastFm => "lastfm",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "spotify" => Self::Spotify,
            "apple_music" | "applemusic" | "apple" => Self::AppleMusic,
            "youtube" => Self::YouTube,
            "lastfm" | "last.fm" => Self::LastFm,
            _ => Self::Other(value),
        }
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longest track duration accepted from a catalog or history file.
pub const MAX_TRACK_SECONDS: u32 = 2 * 60 * 60;

/// A track considered for the playlist. Lives only for one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Catalog-scoped unique identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration_seconds: u32,
    pub source: TrackSource,
    pub platform: Platform,
    /// Similarity to the requested mood; higher is better.
    pub attributes_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<TrackFeatures>,
}

impl TrackCandidate {
    pub fn new(
        id: impl Into<String>,
        duration_seconds: u32,
        source: TrackSource,
        attributes_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            artist: String::new(),
            duration_seconds,
            source,
            platform: Platform::Other("local".to_string()),
            attributes_score,
            features: None,
        }
    }

    pub fn with_metadata(mut self, title: impl Into<String>, artist: impl Into<String>) -> Self {
        self.title = title.into();
        self.artist = artist.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_features(mut self, features: TrackFeatures) -> Self {
        self.features = Some(features);
        self
    }

    /// "Artist - Title", or the id when metadata is missing.
    pub fn display_name(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (true, false) => self.title.clone(),
            _ => self.id.clone(),
        }
    }
}

// ============================================================================
// Request / Result
// ============================================================================

/// A validated playlist request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRequest {
    pub raw_query: String,
    pub duration_seconds: u32,
    pub requested_track_count: Option<u32>,
    pub playlist_name: String,
    pub language: Option<String>,
    pub genre: Option<String>,
    pub session_id: Option<String>,
}

impl PlaylistRequest {
    pub fn new(
        raw_query: impl Into<String>,
        duration_seconds: u32,
        playlist_name: impl Into<String>,
    ) -> Self {
        Self {
            raw_query: raw_query.into(),
            duration_seconds,
            requested_track_count: None,
            playlist_name: playlist_name.into(),
            language: None,
            genre: None,
            session_id: None,
        }
    }

    pub fn with_track_count(mut self, count: Option<u32>) -> Self {
        self.requested_track_count = count;
        self
    }

    pub fn with_overrides(mut self, language: Option<String>, genre: Option<String>) -> Self {
        self.language = language.filter(|l| !l.trim().is_empty());
        self.genre = genre.filter(|g| !g.trim().is_empty());
        self
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Reject requests that can never produce a playlist.
    pub fn validate(&self) -> Result<(), PlaylistError> {
        if self.raw_query.trim().is_empty() {
            return Err(PlaylistError::invalid_request("query must not be empty"));
        }
        if self.duration_seconds == 0 {
            return Err(PlaylistError::invalid_request(
                "duration must be greater than zero",
            ));
        }
        if self.requested_track_count == Some(0) {
            return Err(PlaylistError::invalid_request(
                "track count must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Final, ordered playlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistResult {
    /// Playback order.
    pub track_ids: Vec<String>,
    pub total_duration_seconds: u32,
    /// Platform name to playlist-level URL.
    pub links: BTreeMap<String, String>,
}
