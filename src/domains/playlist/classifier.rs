//! Mood classification.
//!
//! Two strategies exist: a hosted emotion model and a keyword table. Which
//! one a server uses is decided once, at startup, by probing the model.
//! Both read emoji valence the same way.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::error::PlaylistError;
use super::model::{MoodLabel, MoodSignal};
use super::query::words;

const INFERENCE_API_URL: &str = "https://api-inference.huggingface.co";
/// Emotion model used when none is configured.
pub const DEFAULT_EMOTION_MODEL: &str = "SamLowe/roberta-base-go_emotions";
const INFERENCE_TIMEOUT_SECS: u64 = 15;
const HEALTH_CHECK_TEXT: &str = "I feel great today";

/// Confidence reported for a keyword hit.
const KEYWORD_CONFIDENCE: f64 = 0.6;
/// Confidence when keywords and emojis agree.
const AGREEMENT_CONFIDENCE: f64 = 0.75;
/// Confidence for a mood read from emojis alone.
const EMOJI_ONLY_CONFIDENCE: f64 = 0.5;

// ============================================================================
// Emoji heuristics
// ============================================================================

/// (valence, energy) groups. Valence feeds the mapper; energy breaks ties.
const EMOJI_GROUPS: &[(&[char], f64, f64)] = &[
    (&['😄', '😁', '🤩', '🥳', '🎉', '🔥', '⚡', '💃', '🕺', '🎊', '😆', '🙌'], 0.8, 0.8),
    (&['😊', '☺', '😌', '🥰', '😍', '💕', '🌸', '🌅', '🌙', '✨', '🙂', '❤'], 0.8, 0.3),
    (&['😠', '😡', '🤬', '💢', '😤', '💥'], 0.2, 0.8),
    (&['😢', '😭', '😔', '😞', '💔', '🌧', '😿', '🥀', '😪'], 0.2, 0.3),
];

/// Emoji-to-label votes.
const EMOJI_LABELS: &[(&[char], MoodLabel)] = &[
    (&['😊', '😄', '😁', '🙂', '😆', '🥳', '🎉', '🙌', '🤩'], MoodLabel::Joy),
    (&['😢', '😭', '😔', '😞', '💔', '😿', '🥀', '🌧'], MoodLabel::Sadness),
    (&['😠', '😡', '🤬', '💢', '😤'], MoodLabel::Anger),
    (&['😨', '😰', '😱', '😧', '😟'], MoodLabel::Fear),
    (&['😮', '😲', '🤯', '😯'], MoodLabel::Surprise),
    (&['😌', '🧘', '🌊', '🍃', '🌙', '☕'], MoodLabel::Calm),
    (&['😍', '🥰', '😘', '❤', '💕', '💖', '🌹'], MoodLabel::Romantic),
    (&['📻', '📼', '🕰', '💾'], MoodLabel::Nostalgic),
    (&['🔥', '⚡', '💪', '🏃', '🏋', '💃', '🕺', '😎'], MoodLabel::Energetic),
    (&['😐', '😶', '🤔'], MoodLabel::Neutral),
];

fn first_char(emoji: &str) -> Option<char> {
    emoji.chars().next()
}

/// Mean valence of the recognised emojis.
pub fn emoji_valence(emojis: &[String]) -> Option<f64> {
    let values: Vec<f64> = emojis
        .iter()
        .filter_map(|e| first_char(e))
        .filter_map(|c| {
            EMOJI_GROUPS
                .iter()
                .find(|(chars, _, _)| chars.contains(&c))
                .map(|(_, valence, _)| *valence)
        })
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Most voted label among the emojis; ties go to table order.
pub fn emoji_label(emojis: &[String]) -> Option<MoodLabel> {
    let mut votes = [0usize; MoodLabel::ALL.len()];
    for c in emojis.iter().filter_map(|e| first_char(e)) {
        if let Some((_, label)) = EMOJI_LABELS.iter().find(|(chars, _)| chars.contains(&c)) {
            if let Some(idx) = MoodLabel::ALL.iter().position(|l| l == label) {
                votes[idx] += 1;
            }
        }
    }
    best_vote(&votes)
}

fn best_vote(votes: &[usize]) -> Option<MoodLabel> {
    let (idx, count) = votes
        .iter()
        .enumerate()
        .fold((0, 0), |best, (i, &n)| if n > best.1 { (i, n) } else { best });
    (count > 0).then(|| MoodLabel::ALL[idx])
}

// ============================================================================
// Classifier trait
// ============================================================================

/// Something that turns query text into a [`MoodSignal`].
#[async_trait]
pub trait MoodClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the classifier can serve requests right now.
    async fn is_available(&self) -> bool {
        true
    }

    /// Classify emoji-free text plus the emojis pulled from it.
    async fn classify(
        &self,
        text: &str,
        emojis: &[String],
        language_hint: Option<&str>,
    ) -> Result<MoodSignal, PlaylistError>;
}

// ============================================================================
// Keyword strategy
// ============================================================================

const MOOD_KEYWORDS: &[(MoodLabel, &[&str])] = &[
    (MoodLabel::Joy, &["happy", "joy", "joyful", "cheerful", "upbeat", "good", "great", "amazing", "sunny", "khush"]),
    (MoodLabel::Sadness, &["sad", "depressed", "down", "blue", "melancholy", "cry", "crying", "heartbroken", "lonely", "dukhi"]),
    (MoodLabel::Anger, &["angry", "mad", "furious", "rage", "hate", "annoyed", "frustrated"]),
    (MoodLabel::Fear, &["scared", "anxious", "nervous", "afraid", "worried", "fear", "spooky"]),
    (MoodLabel::Surprise, &["excited", "thrilled", "surprise", "surprised", "wow", "amazed"]),
    (MoodLabel::Calm, &["calm", "peaceful", "relax", "relaxing", "chill", "serene", "quiet", "sleep", "focus", "study"]),
    (MoodLabel::Romantic, &["love", "romantic", "romance", "valentine", "date", "pyaar", "ishq"]),
    (MoodLabel::Nostalgic, &["nostalgic", "nostalgia", "memories", "throwback", "retro", "remember", "old"]),
    (MoodLabel::Energetic, &["energetic", "energy", "pumped", "workout", "gym", "party", "hype", "dance", "running"]),
];

/// Offline classifier driven by a keyword table and emoji votes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Label with the most keyword hits, if any.
    pub fn keyword_label(text: &str) -> Option<MoodLabel> {
        let words = words(text);
        let mut votes = [0usize; MoodLabel::ALL.len()];
        for (label, keywords) in MOOD_KEYWORDS {
            let hits = words.iter().filter(|w| keywords.contains(&w.as_str())).count();
            if let Some(idx) = MoodLabel::ALL.iter().position(|l| l == label) {
                votes[idx] += hits;
            }
        }
        best_vote(&votes)
    }
}

#[async_trait]
impl MoodClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(
        &self,
        text: &str,
        emojis: &[String],
        language_hint: Option<&str>,
    ) -> Result<MoodSignal, PlaylistError> {
        let from_text = Self::keyword_label(text);
        let from_emoji = emoji_label(emojis);

        let (label, confidence) = match (from_text, from_emoji) {
            (Some(t), Some(e)) if t == e => (t, AGREEMENT_CONFIDENCE),
            (Some(t), _) => (t, KEYWORD_CONFIDENCE),
            (None, Some(e)) => (e, EMOJI_ONLY_CONFIDENCE),
            (None, None) => (MoodLabel::Neutral, EMOJI_ONLY_CONFIDENCE),
        };

        debug!("Keyword classifier: {} ({:.2})", label, confidence);
        Ok(MoodSignal::new(label, confidence)
            .with_language_hint(language_hint.map(str::to_string))
            .with_emoji_contribution(emoji_valence(emojis)))
    }
}

// ============================================================================
// Hosted model strategy
// ============================================================================

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The inference API answers `[[{label, score}]]` for text classification,
/// and sometimes drops the outer list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(batches) => batches.into_iter().flatten().collect(),
            Self::Flat(scores) => scores,
        }
    }
}

/// Pick the best-scoring label from a raw response body.
pub fn parse_inference_response(body: &str) -> Result<(String, f64), PlaylistError> {
    let response: InferenceResponse = serde_json::from_str(body)
        .map_err(|e| PlaylistError::classifier_unavailable(format!("bad response: {e}")))?;
    response
        .into_scores()
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|s| (s.label, s.score))
        .ok_or_else(|| PlaylistError::classifier_unavailable("empty classification"))
}

/// Emotion model served by the Hugging Face inference API.
pub struct InferenceClassifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: String,
}

impl InferenceClassifier {
    pub fn new(api_token: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(INFERENCE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: INFERENCE_API_URL.to_string(),
            model: model.into(),
            api_token: api_token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn infer(&self, text: &str) -> Result<(String, f64), PlaylistError> {
        let url = format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| PlaylistError::classifier_unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlaylistError::classifier_unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(PlaylistError::classifier_unavailable(format!("HTTP {status}")));
        }
        parse_inference_response(&body)
    }
}

#[async_trait]
impl MoodClassifier for InferenceClassifier {
    fn name(&self) -> &str {
        "model"
    }

    async fn is_available(&self) -> bool {
        match self.infer(HEALTH_CHECK_TEXT).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Emotion model '{}' unavailable: {}", self.model, e);
                false
            }
        }
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn classify(
        &self,
        text: &str,
        emojis: &[String],
        language_hint: Option<&str>,
    ) -> Result<MoodSignal, PlaylistError> {
        if text.trim().is_empty() {
            // Emoji-only query: nothing for the model to read.
            return KeywordClassifier.classify(text, emojis, language_hint).await;
        }
        let (raw_label, score) = self.infer(text).await?;
        let label: MoodLabel = raw_label.parse()?;
        debug!("Model classified '{}' as {} ({:.2})", raw_label, label, score);
        Ok(MoodSignal::new(label, score)
            .with_language_hint(language_hint.map(str::to_string))
            .with_emoji_contribution(emoji_valence(emojis)))
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// The classifier a server runs with, fixed at startup.
pub enum ClassificationStrategy {
    Model(InferenceClassifier),
    Keyword(KeywordClassifier),
}

impl ClassificationStrategy {
    /// Use the model when it answers a health check, keywords otherwise.
    pub async fn select(model: Option<InferenceClassifier>) -> Self {
        match model {
            Some(model) if model.is_available().await => {
                info!("Mood classification: model '{}'", model.model());
                Self::Model(model)
            }
            _ => {
                info!("Mood classification: keyword table");
                Self::Keyword(KeywordClassifier)
            }
        }
    }

    fn inner(&self) -> &dyn MoodClassifier {
        match self {
            Self::Model(model) => model,
            Self::Keyword(keyword) => keyword,
        }
    }
}

#[async_trait]
impl MoodClassifier for ClassificationStrategy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn is_available(&self) -> bool {
        self.inner().is_available().await
    }

    async fn classify(
        &self,
        text: &str,
        emojis: &[String],
        language_hint: Option<&str>,
    ) -> Result<MoodSignal, PlaylistError> {
        self.inner().classify(text, emojis, language_hint).await
    }
}
