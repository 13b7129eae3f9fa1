//! Playlist assembly.
//!
//! Blends the familiar (history) pool with the recommendation pool so that
//! roughly 30% of the requested duration comes from history, and fits the
//! total to the target within one track.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument};

use super::error::PlaylistError;
use super::model::{MAX_TRACK_SECONDS, TrackCandidate};

/// Share of the duration filled from history when history is available.
pub const DEFAULT_HISTORY_SHARE: f64 = 0.30;

/// An assembled playlist, in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub tracks: Vec<TrackCandidate>,
    pub total_duration_seconds: u32,
    pub history_duration_seconds: u32,
}

impl Assembly {
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }

    /// Fraction of the total duration that came from history.
    pub fn history_share(&self) -> f64 {
        if self.total_duration_seconds == 0 {
            return 0.0;
        }
        self.history_duration_seconds as f64 / self.total_duration_seconds as f64
    }

    pub fn recommendation_share(&self) -> f64 {
        if self.total_duration_seconds == 0 {
            return 0.0;
        }
        1.0 - self.history_share()
    }
}

/// Greedy duration-fitting assembler.
#[derive(Debug, Clone)]
pub struct PlaylistAssembler {
    history_share: f64,
}

impl Default for PlaylistAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SHARE)
    }
}

/// Best first; ties broken by id so assembly is deterministic.
fn by_score(a: &TrackCandidate, b: &TrackCandidate) -> Ordering {
    b.attributes_score
        .total_cmp(&a.attributes_score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Working state for one assembly. Totals are `u64` so untrusted
/// durations cannot overflow them.
struct Fill {
    tracks: Vec<TrackCandidate>,
    total: u64,
    max_tracks: usize,
}

impl Fill {
    fn is_full(&self) -> bool {
        self.tracks.len() >= self.max_tracks
    }

    fn push(&mut self, track: TrackCandidate) -> u64 {
        let duration = u64::from(track.duration_seconds);
        self.total += duration;
        self.tracks.push(track);
        duration
    }

    /// Take tracks from `pool`, best first, while they fit in `budget`
    /// more seconds. Tracks that do not fit are skipped and stay in the
    /// pool. Afterwards one overshooting track is added when that lands
    /// closer to the budget than stopping short. Returns seconds used.
    fn take(&mut self, pool: &mut VecDeque<TrackCandidate>, budget: u64) -> u64 {
        let mut used = 0u64;
        let mut skipped = VecDeque::with_capacity(pool.len());
        while let Some(track) = pool.pop_front() {
            if !self.is_full() && used + u64::from(track.duration_seconds) <= budget {
                used += self.push(track);
            } else {
                skipped.push_back(track);
            }
        }

        let gap = budget - used;
        if gap > 0 && !self.is_full() {
            let closer = skipped
                .iter()
                .position(|t| u64::from(t.duration_seconds).saturating_sub(gap) < gap);
            if let Some(track) = closer.and_then(|i| skipped.remove(i)) {
                used += self.push(track);
            }
        }

        *pool = skipped;
        used
    }
}

impl PlaylistAssembler {
    pub fn new(history_share: f64) -> Self {
        Self {
            history_share: history_share.clamp(0.0, 1.0),
        }
    }

    /// Assemble a playlist of about `target_seconds`.
    ///
    /// History is consumed first and wins on duplicate ids. A pool that runs
    /// dry hands its remaining budget to the other. The result is never
    /// empty: if both pools are empty after de-duplication this fails with
    /// [`PlaylistError::NoTracksFound`].
    #[instrument(skip_all, fields(
        history = history.len(),
        recommendations = recommendations.len(),
        target = target_seconds
    ))]
    pub fn assemble(
        &self,
        history: Vec<TrackCandidate>,
        recommendations: Vec<TrackCandidate>,
        target_seconds: u32,
        max_tracks: Option<usize>,
    ) -> Result<Assembly, PlaylistError> {
        let mut seen = HashSet::new();
        let mut dedup = |pool: Vec<TrackCandidate>| -> VecDeque<TrackCandidate> {
            let mut kept: Vec<_> = pool
                .into_iter()
                .filter(|t| {
                    (1..=MAX_TRACK_SECONDS).contains(&t.duration_seconds)
                        && seen.insert(t.id.clone())
                })
                .collect();
            kept.sort_by(by_score);
            kept.into()
        };
        let mut history = dedup(history);
        let mut recommendations = dedup(recommendations);

        if history.is_empty() && recommendations.is_empty() {
            return Err(PlaylistError::NoTracksFound);
        }

        let target = u64::from(target_seconds);
        let history_budget = if history.is_empty() {
            0
        } else {
            (target as f64 * self.history_share).round() as u64
        };

        let mut fill = Fill {
            tracks: Vec::new(),
            total: 0,
            max_tracks: max_tracks.unwrap_or(usize::MAX).max(1),
        };

        let mut history_used = fill.take(&mut history, history_budget);
        fill.take(&mut recommendations, target.saturating_sub(fill.total));
        // Recommendations ran dry: top up from what history has left.
        history_used += fill.take(&mut history, target.saturating_sub(fill.total));

        if fill.tracks.is_empty() {
            // Every single track overshoots the target; one is still better
            // than none.
            if let Some(track) = history.pop_front() {
                history_used += fill.push(track);
            } else if let Some(track) = recommendations.pop_front() {
                fill.push(track);
            }
        }

        debug!(
            "Assembled {} track(s), {}s of {}s ({}s from history)",
            fill.tracks.len(),
            fill.total,
            target_seconds,
            history_used
        );

        Ok(Assembly {
            tracks: fill.tracks,
            total_duration_seconds: u32::try_from(fill.total).unwrap_or(u32::MAX),
            history_duration_seconds: u32::try_from(history_used).unwrap_or(u32::MAX),
        })
    }
}
