//! Playlist service: one mood query in, one playlist out.
//!
//! Pipeline: parse query, classify, map to features, plan catalog queries,
//! fetch, load history, rescore, assemble, format links, record history.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::core::config::Config;

use super::assembler::{Assembly, PlaylistAssembler};
use super::catalog::{CatalogClient, LastFmCatalog};
use super::classifier::{
    ClassificationStrategy, InferenceClassifier, MoodClassifier, emoji_valence,
};
use super::error::PlaylistError;
use super::history::{HistoryEntry, HistoryStore, InMemoryHistoryStore, JsonHistoryStore};
use super::links::{playlist_links, track_links};
use super::mapper::{FeatureMapper, MOOD_TABLE};
use super::model::{
    FeatureTarget, MoodLabel, MoodSignal, PlaylistRequest, PlaylistResult, TrackCandidate,
    TrackSource,
};
use super::planner::{PlanOverride, PlannerConfig, QueryPlanner, SearchDirective};
use super::query::{
    KNOWN_GENRES, LANGUAGE_KEYWORDS, ParsedQuery, format_minutes, parse_query,
    sanitize_playlist_name,
};
use super::scoring::rescore;
use super::session::{LASTFM_PROVIDER, Session, SessionStore};

/// Catalog tags merged into the supported genres list.
const DISCOVERY_TAG_LIMIT: usize = 20;

// ============================================================================
// Response types
// ============================================================================

/// How the mood was read.
#[derive(Debug, Clone, Serialize)]
pub struct MoodSummary {
    /// Label the classifier produced.
    pub detected: MoodLabel,
    /// Label the playlist was built for.
    pub applied: MoodLabel,
    pub description: &'static str,
    pub confidence: f64,
    pub classifier: String,
    /// True when classification failed and the neutral mood was used.
    pub fallback: bool,
}

/// One entry of the track list.
#[derive(Debug, Clone, Serialize)]
pub struct TrackEntry {
    pub position: usize,
    pub id: String,
    pub name: String,
    pub duration_seconds: u32,
    pub source: TrackSource,
    pub links: BTreeMap<String, String>,
}

/// History versus recommendation split of the final playlist.
#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    pub history_share: f64,
    pub recommendation_share: f64,
    pub history_tracks: usize,
    pub recommendation_tracks: usize,
}

impl From<&Assembly> for Breakdown {
    fn from(assembly: &Assembly) -> Self {
        let history_tracks = assembly
            .tracks
            .iter()
            .filter(|t| t.source == TrackSource::History)
            .count();
        Self {
            history_share: round2(assembly.history_share()),
            recommendation_share: round2(assembly.recommendation_share()),
            history_tracks,
            recommendation_tracks: assembly.tracks.len() - history_tracks,
        }
    }
}

/// Result of a playlist request.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistResponse {
    pub status: &'static str,
    pub playlist_name: String,
    /// Primary link for the whole playlist.
    pub playlist_url: String,
    pub mood: MoodSummary,
    pub requested_duration: String,
    pub actual_duration: String,
    pub track_list: Vec<TrackEntry>,
    pub breakdown: Breakdown,
    pub result: PlaylistResult,
}

/// Mood analysis without building a playlist.
#[derive(Debug, Clone, Serialize)]
pub struct MoodAnalysis {
    pub mood: MoodSummary,
    pub emojis: Vec<String>,
    pub emoji_valence: Option<f64>,
    pub languages: Vec<String>,
    pub genres: Vec<String>,
    pub duration_minutes: u32,
    pub track_count: Option<u32>,
    pub features: FeatureTarget,
    pub search_plan: Vec<SearchDirective>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodOption {
    pub mood: MoodLabel,
    pub description: &'static str,
    pub genres: Vec<&'static str>,
}

/// What the service understands.
#[derive(Debug, Clone, Serialize)]
pub struct SupportedOptions {
    pub moods: Vec<MoodOption>,
    pub languages: Vec<&'static str>,
    pub genres: Vec<String>,
    pub duration_formats: Vec<&'static str>,
    pub examples: Vec<&'static str>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Service
// ============================================================================

/// Orchestrates the playlist pipeline. Cheap to share behind an `Arc`.
pub struct PlaylistService {
    classifier: Arc<dyn MoodClassifier>,
    catalog: Arc<dyn CatalogClient>,
    history: Arc<dyn HistoryStore>,
    sessions: SessionStore,
    mapper: FeatureMapper,
    planner: QueryPlanner,
    assembler: PlaylistAssembler,
}

impl PlaylistService {
    pub fn new(
        classifier: Arc<dyn MoodClassifier>,
        catalog: Arc<dyn CatalogClient>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            classifier,
            catalog,
            history,
            sessions: SessionStore::new(),
            mapper: FeatureMapper::default(),
            planner: QueryPlanner::default(),
            assembler: PlaylistAssembler::default(),
        }
    }

    pub fn with_mapper(mut self, mapper: FeatureMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_planner(mut self, planner: QueryPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Wire up the production collaborators.
    ///
    /// Checks the emotion model once; its availability fixes the
    /// classification strategy for the lifetime of the service.
    pub async fn from_config(config: &Config) -> Self {
        let model = config
            .credentials
            .hf_api_token
            .as_ref()
            .map(|token| InferenceClassifier::new(token.clone(), &config.playlist.emotion_model));
        let classifier = ClassificationStrategy::select(model).await;

        let mut catalog = LastFmCatalog::new(config.credentials.lastfm_api_key.clone());
        if let Some(url) = &config.playlist.lastfm_api_url {
            catalog = catalog.with_base_url(url.clone());
        }

        let history: Arc<dyn HistoryStore> = match &config.playlist.history_dir {
            Some(dir) => Arc::new(JsonHistoryStore::new(dir.clone())),
            None => Arc::new(InMemoryHistoryStore::new()),
        };

        let planner = QueryPlanner::new(PlannerConfig {
            avg_track_seconds: config.playlist.avg_track_seconds,
            max_directives: config.playlist.max_directives,
            fetch_timeout: Duration::from_secs(config.playlist.fetch_timeout_secs),
            ..Default::default()
        });

        Self::new(Arc::new(classifier), Arc::new(catalog), history)
            .with_mapper(FeatureMapper::new(config.playlist.confidence_threshold))
            .with_planner(planner)
            .with_sessions(SessionStore::with_limits(
                chrono::Duration::minutes(config.playlist.session_ttl_minutes),
                config.playlist.max_sessions,
            ))
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn catalog_name(&self) -> &str {
        self.catalog.name()
    }

    pub fn mapper(&self) -> &FeatureMapper {
        &self.mapper
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Build a request from tool input. The query's own duration and track
    /// count apply unless the caller overrides the duration.
    pub fn request_from_query(
        query: &str,
        duration_minutes: Option<u32>,
        playlist_name: Option<String>,
    ) -> PlaylistRequest {
        let parsed = parse_query(query);
        let minutes = duration_minutes.unwrap_or(parsed.duration_minutes);
        let name = playlist_name
            .filter(|n| !n.trim().is_empty())
            .map(|n| sanitize_playlist_name(&n))
            .unwrap_or_default();
        PlaylistRequest::new(query, minutes.saturating_mul(60), name)
            .with_track_count(parsed.track_count)
    }

    /// Classify, falling back to the neutral mood when the classifier fails
    /// in a recoverable way.
    async fn classify(&self, parsed: &ParsedQuery, hint: Option<&str>) -> (MoodSignal, bool) {
        match self.classifier.classify(&parsed.text, &parsed.emojis, hint).await {
            Ok(signal) => (signal, false),
            Err(e) => {
                warn!("Classification failed, using neutral mood: {}", e);
                (
                    MoodSignal::neutral()
                        .with_language_hint(hint.map(str::to_string))
                        .with_emoji_contribution(emoji_valence(&parsed.emojis)),
                    true,
                )
            }
        }
    }

    fn summarize(&self, signal: &MoodSignal, fallback: bool) -> MoodSummary {
        let applied = self.mapper.effective_label(signal);
        MoodSummary {
            detected: signal.label,
            applied,
            description: applied.adjective(),
            confidence: round2(signal.confidence),
            classifier: self.classifier.name().to_string(),
            fallback,
        }
    }

    fn target_for(&self, signal: &MoodSignal, parsed: &ParsedQuery) -> FeatureTarget {
        let mut target = self.mapper.map(signal);
        target
            .language_hints
            .extend(parsed.languages.iter().map(|l| l.to_lowercase()));
        target
    }

    fn overrides(request: &PlaylistRequest, parsed: &ParsedQuery) -> PlanOverride {
        PlanOverride {
            language: request.language.clone(),
            genre: request.genre.clone().or_else(|| parsed.genres.first().cloned()),
        }
    }

    /// Resolve the session's user and catalog credential.
    async fn session_context(
        &self,
        session_id: Option<&str>,
    ) -> Result<(Option<Session>, Option<String>), PlaylistError> {
        let Some(id) = session_id else {
            return Ok((None, None));
        };
        let session = self
            .sessions
            .get(id)
            .await
            .ok_or_else(|| PlaylistError::invalid_request(format!("unknown session '{id}'")))?;
        let token = self.sessions.token(id, LASTFM_PROVIDER).await;
        Ok((Some(session), token))
    }

    async fn load_history(&self, user_id: &str) -> Vec<TrackCandidate> {
        match self.history.user_history(user_id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Ignoring unreadable history for '{}': {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Generate a playlist.
    #[instrument(skip_all, fields(duration = request.duration_seconds))]
    pub async fn generate(
        &self,
        request: PlaylistRequest,
    ) -> Result<PlaylistResponse, PlaylistError> {
        request.validate()?;
        let parsed = parse_query(&request.raw_query);
        let hint = request
            .language
            .as_deref()
            .or(parsed.language_hint())
            .map(str::to_lowercase);

        let (signal, fallback) = self.classify(&parsed, hint.as_deref()).await;
        let mood = self.summarize(&signal, fallback);
        let target = self.target_for(&signal, &parsed);

        let directives = self.planner.plan(
            &target,
            request.duration_seconds,
            &Self::overrides(&request, &parsed),
        );

        let (session, token) = self.session_context(request.session_id.as_deref()).await?;
        let mut recommendations = self
            .planner
            .fetch_filled(
                self.catalog.as_ref(),
                &directives,
                request.duration_seconds,
                token.as_deref(),
            )
            .await?;
        for track in &mut recommendations {
            track.source = TrackSource::Recommendation;
        }

        let mut history = match &session {
            Some(session) => self.load_history(&session.user_id).await,
            None => Vec::new(),
        };

        rescore(&mut history, &target);
        rescore(&mut recommendations, &target);

        let assembly = self.assembler.assemble(
            history,
            recommendations,
            request.duration_seconds,
            request.requested_track_count.map(|n| n as usize),
        )?;

        let languages: Vec<String> = target.language_hints.iter().cloned().collect();
        let links = playlist_links(mood.description, &languages);
        let playlist_url = links.get("spotify").cloned().unwrap_or_default();

        if let Some(session) = &session {
            let entries = assembly
                .tracks
                .iter()
                .map(|t| HistoryEntry::new(t.clone(), mood.applied.as_str()))
                .collect();
            if let Err(e) = self.history.record(&session.user_id, entries).await {
                warn!("Failed to record history for '{}': {}", session.user_id, e);
            }
        }

        let playlist_name = if request.playlist_name.is_empty() {
            let language = languages.first().map(|l| format!(" {}", title_case(l)));
            format!(
                "{}{} Vibes",
                title_case(mood.description),
                language.unwrap_or_default()
            )
        } else {
            request.playlist_name.clone()
        };

        info!(
            "Playlist '{}': {} track(s), {}s",
            playlist_name,
            assembly.tracks.len(),
            assembly.total_duration_seconds
        );

        let track_list = assembly
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| TrackEntry {
                position: i + 1,
                id: t.id.clone(),
                name: t.display_name(),
                duration_seconds: t.duration_seconds,
                source: t.source,
                links: track_links(t),
            })
            .collect();

        Ok(PlaylistResponse {
            status: "success",
            playlist_name,
            playlist_url,
            mood,
            requested_duration: format_minutes(request.duration_seconds.div_ceil(60)),
            actual_duration: format_minutes(assembly.total_duration_seconds.div_ceil(60)),
            track_list,
            breakdown: Breakdown::from(&assembly),
            result: PlaylistResult {
                track_ids: assembly.track_ids(),
                total_duration_seconds: assembly.total_duration_seconds,
                links,
            },
        })
    }

    /// Analyze a query's mood without touching the catalog.
    #[instrument(skip_all)]
    pub async fn analyze(&self, query: &str) -> Result<MoodAnalysis, PlaylistError> {
        if query.trim().is_empty() {
            return Err(PlaylistError::invalid_request("query must not be empty"));
        }
        let parsed = parse_query(query);
        let hint = parsed.language_hint().map(str::to_string);
        let (signal, fallback) = self.classify(&parsed, hint.as_deref()).await;
        let target = self.target_for(&signal, &parsed);
        let overrides = PlanOverride {
            language: None,
            genre: parsed.genres.first().cloned(),
        };
        let search_plan =
            self.planner
                .plan(&target, parsed.duration_minutes.saturating_mul(60), &overrides);

        Ok(MoodAnalysis {
            mood: self.summarize(&signal, fallback),
            emoji_valence: emoji_valence(&parsed.emojis),
            emojis: parsed.emojis,
            languages: parsed.languages,
            genres: parsed.genres,
            duration_minutes: parsed.duration_minutes,
            track_count: parsed.track_count,
            features: target,
            search_plan,
        })
    }

    /// Moods, languages, genres and query formats the service understands.
    pub async fn supported_options(&self) -> SupportedOptions {
        let mut genres: Vec<String> = KNOWN_GENRES.iter().map(|g| g.to_string()).collect();
        match self.catalog.top_tags(DISCOVERY_TAG_LIMIT).await {
            Ok(tags) => {
                for tag in tags {
                    if !genres.contains(&tag) {
                        genres.push(tag);
                    }
                }
            }
            Err(e) => warn!("Catalog tags unavailable: {}", e),
        }

        SupportedOptions {
            moods: MOOD_TABLE
                .iter()
                .map(|p| MoodOption {
                    mood: p.label,
                    description: p.label.adjective(),
                    genres: p.genres.to_vec(),
                })
                .collect(),
            languages: LANGUAGE_KEYWORDS.iter().map(|(name, _)| *name).collect(),
            genres,
            duration_formats: vec![
                "30 minutes",
                "1 hour",
                "2hrs",
                "45 min",
                "10 songs",
                "short (20 min)",
                "workout (45 min)",
                "party (2 hours)",
            ],
            examples: vec![
                "I want a 40 minutes playlist of hindi songs that makes me feel 😎",
                "Create a 1 hour sad english playlist 😢",
                "Give me 10 energetic punjabi songs 🔥",
                "Something calm for studying 📚",
            ],
        }
    }

    /// Open a session, caching the user's own Last.fm key when given.
    pub async fn start_session(&self, user_id: &str, lastfm_api_key: Option<String>) -> Session {
        let session = self.sessions.start(user_id).await;
        if let Some(key) = lastfm_api_key.filter(|k| !k.trim().is_empty()) {
            self.sessions
                .cache_token(&session.id, LASTFM_PROVIDER, key, None)
                .await;
        }
        self.sessions.get(&session.id).await.unwrap_or(session)
    }

    /// Close a session, optionally erasing the user's history.
    pub async fn logout(
        &self,
        session_id: &str,
        forget_history: bool,
    ) -> Result<Session, PlaylistError> {
        let session = self
            .sessions
            .end(session_id)
            .await
            .ok_or_else(|| PlaylistError::invalid_request(format!("unknown session '{session_id}'")))?;
        if forget_history {
            self.history.clear(&session.user_id).await?;
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::playlist::catalog::StaticCatalog;
    use crate::domains::playlist::classifier::KeywordClassifier;
    use crate::domains::playlist::model::Platform;
    use async_trait::async_trait;

    struct UnavailableClassifier;

    #[async_trait]
    impl MoodClassifier for UnavailableClassifier {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn classify(
            &self,
            _text: &str,
            _emojis: &[String],
            _language_hint: Option<&str>,
        ) -> Result<MoodSignal, PlaylistError> {
            Err(PlaylistError::classifier_unavailable("model offline"))
        }
    }

    fn tracks(prefix: &str, n: usize) -> Vec<TrackCandidate> {
        (0..n)
            .map(|i| {
                TrackCandidate::new(format!("{prefix}{i}"), 200, TrackSource::Recommendation, 0.5)
                    .with_metadata(format!("Song {i}"), format!("Artist {prefix}"))
                    .with_platform(Platform::LastFm)
            })
            .collect()
    }

    fn catalog() -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        for tag in ["pop", "alternative", "indie", "dance", "funk", "reggae", "bollywood", "hindi"] {
            catalog = catalog.with_tag(tag, tracks(tag, 10));
        }
        catalog
    }

    fn service(classifier: Arc<dyn MoodClassifier>, catalog: StaticCatalog) -> PlaylistService {
        PlaylistService::new(
            classifier,
            Arc::new(catalog),
            Arc::new(InMemoryHistoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_unavailable_classifier_uses_neutral() {
        let service = service(Arc::new(UnavailableClassifier), catalog());
        let request = PlaylistService::request_from_query("😊 happy songs", Some(20), None);
        let response = service.generate(request).await.unwrap();

        assert_eq!(response.status, "success");
        assert_eq!(response.mood.applied, MoodLabel::Neutral);
        assert!(response.mood.fallback);
        assert!(!response.track_list.is_empty());
        assert_eq!(response.breakdown.history_tracks, 0);
    }

    #[tokio::test]
    async fn test_generate_reference_query() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let request = PlaylistService::request_from_query(
            "I want a 40 minutes playlist of hindi songs that makes me feel 😎",
            None,
            None,
        );
        assert_eq!(request.duration_seconds, 2400);

        let response = service.generate(request).await.unwrap();
        let total = response.result.total_duration_seconds;
        assert!(total.abs_diff(2400) <= 200, "total {total}");
        assert_eq!(response.mood.applied, MoodLabel::Energetic);
        assert!(response.playlist_url.starts_with("https://open.spotify.com/search/"));
        assert!(response.playlist_name.contains("Hindi"));
        assert!(response.track_list.iter().any(|t| t.id.starts_with("bollywood")));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_no_tracks_found() {
        let service = service(Arc::new(KeywordClassifier), StaticCatalog::new());
        let request = PlaylistService::request_from_query("happy", None, None);
        let result = service.generate(request).await;
        assert!(matches!(result, Err(PlaylistError::NoTracksFound)));
    }

    #[tokio::test]
    async fn test_catalog_without_credentials_requires_authentication() {
        let service = service(Arc::new(KeywordClassifier), catalog().requiring_token());
        let request = PlaylistService::request_from_query("happy", None, None);
        let result = service.generate(request).await;
        assert!(matches!(result, Err(PlaylistError::AuthenticationRequired { .. })));
    }

    #[tokio::test]
    async fn test_session_token_unlocks_catalog_and_records_history() {
        let service = service(Arc::new(KeywordClassifier), catalog().requiring_token());
        let session = service.start_session("alice", Some("user-key".to_string())).await;

        let first = PlaylistService::request_from_query("happy", Some(30), None)
            .with_session(Some(session.id.clone()));
        let response = service.generate(first).await.unwrap();
        assert_eq!(response.breakdown.history_tracks, 0);

        let second = PlaylistService::request_from_query("happy", Some(30), None)
            .with_session(Some(session.id.clone()));
        let response = service.generate(second).await.unwrap();
        assert!(response.breakdown.history_tracks > 0);
        assert!((response.breakdown.history_share - 0.30).abs() <= 0.15);

        let ids: Vec<_> = response.result.track_ids.clone();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_history_ranked_by_current_mood() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let entry = |id: String, mood: MoodLabel, score: f64| {
            HistoryEntry::new(
                TrackCandidate::new(id, 200, TrackSource::Recommendation, score),
                mood.as_str(),
            )
        };
        let mut entries: Vec<_> = (0..5)
            .map(|i| entry(format!("party{i}"), MoodLabel::Joy, 1.0))
            .collect();
        entries.extend((0..5).map(|i| entry(format!("tears{i}"), MoodLabel::Sadness, 0.6)));
        service.history.record("carol", entries).await.unwrap();

        let session = service.start_session("carol", None).await;
        let request = PlaylistService::request_from_query("sad crying songs", Some(20), None)
            .with_session(Some(session.id.clone()));
        let response = service.generate(request).await.unwrap();

        assert_eq!(response.mood.applied, MoodLabel::Sadness);
        let picks: Vec<_> = response
            .track_list
            .iter()
            .filter(|t| t.source == TrackSource::History)
            .map(|t| t.id.as_str())
            .collect();
        assert!(!picks.is_empty());
        assert!(picks.iter().all(|id| id.starts_with("tears")), "{picks:?}");
    }

    #[tokio::test]
    async fn test_sparse_mood_tags_are_padded() {
        let catalog = StaticCatalog::new()
            .with_tag("indie", tracks("indie", 1))
            .with_tag("popular", tracks("popular", 30));
        let service = service(Arc::new(KeywordClassifier), catalog);
        let request = PlaylistService::request_from_query("sad songs", Some(30), None);
        let response = service.generate(request).await.unwrap();

        let total = response.result.total_duration_seconds;
        assert!(total.abs_diff(1800) <= 200, "total {total}");
        assert!(response.track_list.iter().any(|t| t.id == "indie0"));
        assert!(response.track_list.iter().any(|t| t.id.starts_with("popular")));
    }

    #[tokio::test]
    async fn test_unknown_session_is_invalid() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let request = PlaylistService::request_from_query("happy", None, None)
            .with_session(Some("nope".to_string()));
        let result = service.generate(request).await;
        assert!(matches!(result, Err(PlaylistError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_logout_can_forget_history() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let session = service.start_session("bob", None).await;
        let request = PlaylistService::request_from_query("happy", Some(10), None)
            .with_session(Some(session.id.clone()));
        service.generate(request).await.unwrap();
        assert!(!service.history.user_history("bob").await.unwrap().is_empty());

        let ended = service.logout(&session.id, true).await.unwrap();
        assert_eq!(ended.user_id, "bob");
        assert!(service.history.user_history("bob").await.unwrap().is_empty());
        assert!(service.logout(&session.id, false).await.is_err());
    }

    #[tokio::test]
    async fn test_track_count_caps_playlist() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let request = PlaylistService::request_from_query("give me 5 happy songs", None, None);
        assert_eq!(request.requested_track_count, Some(5));
        let response = service.generate(request).await.unwrap();
        assert!(response.track_list.len() <= 5);
    }

    #[tokio::test]
    async fn test_custom_name_is_sanitized() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let request =
            PlaylistService::request_from_query("happy", None, Some("Road/Trip?".to_string()));
        let response = service.generate(request).await.unwrap();
        assert_eq!(response.playlist_name, "Road_Trip_");
    }

    #[tokio::test]
    async fn test_analyze() {
        let service = service(Arc::new(KeywordClassifier), catalog());
        let analysis = service.analyze("1 hour of sad english songs 😢").await.unwrap();
        assert_eq!(analysis.mood.applied, MoodLabel::Sadness);
        assert_eq!(analysis.duration_minutes, 60);
        assert_eq!(analysis.languages, vec!["english"]);
        assert_eq!(analysis.emoji_valence, Some(0.2));
        assert!(!analysis.search_plan.is_empty());

        assert!(service.analyze("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_supported_options_merges_catalog_tags() {
        let catalog = StaticCatalog::new().with_tag("shoegaze", Vec::new());
        let service = service(Arc::new(KeywordClassifier), catalog);
        let options = service.supported_options().await;
        assert_eq!(options.moods.len(), MoodLabel::ALL.len());
        assert!(options.languages.contains(&"hindi"));
        assert!(options.genres.contains(&"shoegaze".to_string()));
        assert!(options.genres.contains(&"pop".to_string()));
    }
}
