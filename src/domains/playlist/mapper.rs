//! Mood-to-feature mapping.
//!
//! Every [`MoodLabel`] has a fixed row in [`MOOD_TABLE`]. The mapper is a
//! pure function of its input: no I/O, no randomness.

use std::collections::BTreeSet;
use tracing::debug;

use super::error::PlaylistError;
use super::model::{FeatureTarget, MoodLabel, MoodSignal, TrackFeatures};

/// Default confidence below which a classification counts as ambiguous.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Weight of the text-derived positivity when emojis are present.
const TEXT_WEIGHT: f64 = 0.6;
const EMOJI_WEIGHT: f64 = 0.4;

/// One row of the mood table.
#[derive(Debug, Clone, Copy)]
pub struct MoodProfile {
    pub label: MoodLabel,
    pub positivity: f64,
    pub intensity: f64,
    pub danceability: f64,
    pub genres: &'static [&'static str],
}

/// (label, positivity, intensity, danceability, genre hints)
pub static MOOD_TABLE: [MoodProfile; 10] = [
    profile(MoodLabel::Joy, 0.85, 0.70, 0.75, &["pop", "dance", "funk", "reggae"]),
    profile(MoodLabel::Sadness, 0.20, 0.30, 0.30, &["ballad", "blues", "indie", "acoustic"]),
    profile(MoodLabel::Anger, 0.25, 0.90, 0.50, &["rock", "metal", "punk", "rap"]),
    profile(MoodLabel::Fear, 0.30, 0.55, 0.30, &["ambient", "darkwave", "soundtrack"]),
    profile(MoodLabel::Surprise, 0.70, 0.75, 0.70, &["electronic", "party", "pop"]),
    profile(MoodLabel::Calm, 0.60, 0.20, 0.30, &["ambient", "classical", "instrumental", "chill"]),
    profile(MoodLabel::Romantic, 0.70, 0.40, 0.50, &["romantic", "r&b", "soul", "love songs"]),
    profile(MoodLabel::Nostalgic, 0.55, 0.45, 0.50, &["retro", "oldies", "classic rock", "80s"]),
    profile(MoodLabel::Energetic, 0.75, 0.90, 0.80, &["workout", "electronic", "dance", "edm"]),
    profile(MoodLabel::Neutral, 0.50, 0.50, 0.50, &["pop", "alternative", "indie"]),
];

const fn profile(
    label: MoodLabel,
    positivity: f64,
    intensity: f64,
    danceability: f64,
    genres: &'static [&'static str],
) -> MoodProfile {
    MoodProfile {
        label,
        positivity,
        intensity,
        danceability,
        genres,
    }
}

impl MoodProfile {
    /// The profile as a point in feature space.
    pub fn features(&self) -> TrackFeatures {
        TrackFeatures {
            positivity: self.positivity,
            intensity: self.intensity,
            danceability: self.danceability,
        }
    }
}

/// Look up the table row for a label.
pub fn mood_profile(label: MoodLabel) -> &'static MoodProfile {
    MOOD_TABLE
        .iter()
        .find(|p| p.label == label)
        .unwrap_or(&MOOD_TABLE[MOOD_TABLE.len() - 1])
}

/// Converts classifier output into a [`FeatureTarget`].
#[derive(Debug, Clone)]
pub struct FeatureMapper {
    confidence_threshold: f64,
}

impl Default for FeatureMapper {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl FeatureMapper {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Label the mapper will actually use for this signal.
    pub fn effective_label(&self, signal: &MoodSignal) -> MoodLabel {
        if signal.confidence < self.confidence_threshold {
            MoodLabel::Neutral
        } else {
            signal.label
        }
    }

    /// Map a signal onto its feature target.
    ///
    /// Ambiguous signals resolve to the neutral row; emoji valence only
    /// adjusts confident classifications.
    pub fn map(&self, signal: &MoodSignal) -> FeatureTarget {
        let label = self.effective_label(signal);
        let row = mood_profile(label);

        let positivity = match (label, signal.emoji_contribution) {
            (MoodLabel::Neutral, _) | (_, None) => row.positivity,
            (_, Some(emoji)) => TEXT_WEIGHT * row.positivity + EMOJI_WEIGHT * emoji,
        };

        debug!(
            "Mapped {} (confidence {:.2}) to {}",
            signal.label, signal.confidence, label
        );

        FeatureTarget {
            positivity: positivity.clamp(0.0, 1.0),
            intensity: row.intensity,
            danceability: row.danceability,
            genre_hints: row.genres.iter().map(|g| g.to_string()).collect(),
            language_hints: signal
                .language_hint
                .iter()
                .map(|l| l.to_lowercase())
                .collect::<BTreeSet<_>>(),
        }
    }

    /// Map a raw classifier label.
    ///
    /// Fails with [`PlaylistError::UnsupportedMood`] for labels outside the
    /// table; callers recover with [`FeatureMapper::neutral`].
    pub fn map_label(&self, label: &str, confidence: f64) -> Result<FeatureTarget, PlaylistError> {
        let label: MoodLabel = label.parse()?;
        Ok(self.map(&MoodSignal::new(label, confidence)))
    }

    /// The neutral feature target.
    pub fn neutral(&self) -> FeatureTarget {
        self.map(&MoodSignal::neutral())
    }
}
