//! Query planning: feature target to catalog search directives.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::catalog::CatalogClient;
use super::error::PlaylistError;
use super::model::{FeatureTarget, TrackCandidate};

/// Default expected length of a catalog track.
pub const DEFAULT_AVG_TRACK_SECONDS: u32 = 210;
/// Default cap on directives issued per request.
pub const DEFAULT_MAX_DIRECTIVES: usize = 5;

/// Tag searched to pad a pool the planned directives left short.
pub const FALLBACK_TAG: &str = "popular";

const MIN_DIRECTIVE_LIMIT: usize = 5;
const MAX_DIRECTIVE_LIMIT: usize = 50;

/// Planner tuning knobs.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub avg_track_seconds: u32,
    pub max_directives: usize,
    /// Multiplier on the expected track count, absorbing duplicates and the
    /// history split.
    pub over_fetch: f64,
    /// Upper bound on a single catalog call.
    pub fetch_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            avg_track_seconds: DEFAULT_AVG_TRACK_SECONDS,
            max_directives: DEFAULT_MAX_DIRECTIVES,
            over_fetch: 2.0,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a directive was planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveOrigin {
    /// Genre the user asked for explicitly.
    Override,
    Language,
    Mood,
    /// Padding search issued after the planned ones came back short.
    Fallback,
}

/// A single catalog query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDirective {
    /// Catalog tag to search for.
    pub tag: String,
    /// Maximum number of tracks to request.
    pub limit: usize,
    pub origin: DirectiveOrigin,
}

/// User-supplied overrides on top of the mood-derived hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOverride {
    pub language: Option<String>,
    pub genre: Option<String>,
}

/// Catalog tags that represent a language.
pub fn language_tags(language: &str) -> Vec<String> {
    match language.to_lowercase().as_str() {
        "hindi" => vec!["bollywood".to_string(), "hindi".to_string()],
        "english" => vec!["pop".to_string()],
        "korean" => vec!["k-pop".to_string()],
        "japanese" => vec!["j-pop".to_string()],
        other => vec![other.to_string()],
    }
}

/// Turns feature targets into a bounded list of directives.
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    config: PlannerConfig,
}

impl QueryPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Number of tracks expected to fill the duration.
    pub fn expected_tracks(&self, duration_seconds: u32) -> usize {
        let avg = self.config.avg_track_seconds.max(1);
        duration_seconds.div_ceil(avg).max(1) as usize
    }

    /// Plan the directives for one request.
    ///
    /// Order: explicit genre, then language tags, then mood genres. Tags
    /// are de-duplicated and the list is capped at `max_directives`.
    pub fn plan(
        &self,
        target: &FeatureTarget,
        duration_seconds: u32,
        overrides: &PlanOverride,
    ) -> Vec<SearchDirective> {
        let mut tags: Vec<(String, DirectiveOrigin)> = Vec::new();
        let mut push = |tag: String, origin: DirectiveOrigin| {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.iter().any(|(t, _)| *t == tag) {
                tags.push((tag, origin));
            }
        };

        if let Some(genre) = &overrides.genre {
            push(genre.clone(), DirectiveOrigin::Override);
        }

        let languages: Vec<String> = match &overrides.language {
            Some(language) => vec![language.clone()],
            None => target.language_hints.iter().cloned().collect(),
        };
        for language in &languages {
            for tag in language_tags(language) {
                push(tag, DirectiveOrigin::Language);
            }
        }

        for genre in &target.genre_hints {
            push(genre.clone(), DirectiveOrigin::Mood);
        }

        tags.truncate(self.config.max_directives.max(1));

        let wanted =
            (self.expected_tracks(duration_seconds) as f64 * self.config.over_fetch).ceil() as usize;
        let limit = wanted
            .div_ceil(tags.len().max(1))
            .clamp(MIN_DIRECTIVE_LIMIT, MAX_DIRECTIVE_LIMIT);

        debug!(
            "Planned {} directive(s) of {} track(s) for {}s",
            tags.len(),
            limit,
            duration_seconds
        );

        tags.into_iter()
            .map(|(tag, origin)| SearchDirective { tag, limit, origin })
            .collect()
    }

    /// Execute directives against a catalog.
    ///
    /// Directives run concurrently, each under the configured timeout.
    /// Transient failures drop only their directive; an authentication
    /// failure aborts the fetch. Results keep directive order.
    #[instrument(skip_all, fields(catalog = catalog.name(), directives = directives.len()))]
    pub async fn fetch(
        &self,
        catalog: &dyn CatalogClient,
        directives: &[SearchDirective],
        token: Option<&str>,
    ) -> Result<Vec<TrackCandidate>, PlaylistError> {
        let timeout = self.config.fetch_timeout;
        let calls = directives.iter().map(|directive| async move {
            match tokio::time::timeout(timeout, catalog.search(directive, token)).await {
                Ok(result) => result,
                Err(_) => Err(PlaylistError::catalog_transient(format!(
                    "search for '{}' timed out after {:?}",
                    directive.tag, timeout
                ))),
            }
        });

        let mut candidates = Vec::new();
        for (directive, result) in directives.iter().zip(join_all(calls).await) {
            match result {
                Ok(tracks) => {
                    debug!("Directive '{}' returned {} track(s)", directive.tag, tracks.len());
                    candidates.extend(tracks);
                }
                Err(e @ PlaylistError::AuthenticationRequired { .. }) => return Err(e),
                Err(e) => warn!("Dropping directive '{}': {}", directive.tag, e),
            }
        }

        info!("Fetched {} candidate(s)", candidates.len());
        Ok(candidates)
    }

    /// Padding directive sized for the whole duration.
    pub fn fallback(&self, duration_seconds: u32) -> SearchDirective {
        let wanted =
            (self.expected_tracks(duration_seconds) as f64 * self.config.over_fetch).ceil() as usize;
        SearchDirective {
            tag: FALLBACK_TAG.to_string(),
            limit: wanted.clamp(MIN_DIRECTIVE_LIMIT, MAX_DIRECTIVE_LIMIT),
            origin: DirectiveOrigin::Fallback,
        }
    }

    /// [`fetch`](Self::fetch), then pad with the fallback tag when the
    /// distinct tracks found cannot fill `duration_seconds`.
    pub async fn fetch_filled(
        &self,
        catalog: &dyn CatalogClient,
        directives: &[SearchDirective],
        duration_seconds: u32,
        token: Option<&str>,
    ) -> Result<Vec<TrackCandidate>, PlaylistError> {
        let mut candidates = self.fetch(catalog, directives, token).await?;
        if directives.iter().any(|d| d.tag == FALLBACK_TAG) {
            return Ok(candidates);
        }

        let mut seen = HashSet::new();
        let available: u64 = candidates
            .iter()
            .filter(|t| seen.insert(t.id.as_str()))
            .map(|t| u64::from(t.duration_seconds))
            .sum();
        if available >= u64::from(duration_seconds) {
            return Ok(candidates);
        }

        info!(
            "Only {}s of {}s found, padding with '{}'",
            available, duration_seconds, FALLBACK_TAG
        );
        let padding = self
            .fetch(catalog, &[self.fallback(duration_seconds)], token)
            .await?;
        candidates.extend(padding);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::playlist::catalog::StaticCatalog;
    use crate::domains::playlist::mapper::FeatureMapper;
    use crate::domains::playlist::model::{MoodLabel, MoodSignal, TrackSource};

    fn joy_target(language: Option<&str>) -> FeatureTarget {
        FeatureMapper::default().map(
            &MoodSignal::new(MoodLabel::Joy, 0.9).with_language_hint(language.map(str::to_string)),
        )
    }

    fn tracks(prefix: &str, n: usize) -> Vec<TrackCandidate> {
        (0..n)
            .map(|i| {
                TrackCandidate::new(format!("{prefix}{i}"), 200, TrackSource::Recommendation, 0.5)
            })
            .collect()
    }

    #[test]
    fn test_expected_tracks_rounds_up() {
        let planner = QueryPlanner::default();
        assert_eq!(planner.expected_tracks(210), 1);
        assert_eq!(planner.expected_tracks(211), 2);
        assert_eq!(planner.expected_tracks(1800), 9);
    }

    #[test]
    fn test_plan_orders_override_language_mood() {
        let planner = QueryPlanner::default();
        let overrides = PlanOverride {
            language: None,
            genre: Some("Lofi".to_string()),
        };
        let plan = planner.plan(&joy_target(Some("hindi")), 1800, &overrides);
        let tags: Vec<_> = plan.iter().map(|d| d.tag.as_str()).collect();
        assert_eq!(tags[0], "lofi");
        assert_eq!(plan[0].origin, DirectiveOrigin::Override);
        assert_eq!(&tags[1..3], &["bollywood", "hindi"]);
        assert_eq!(plan[3].origin, DirectiveOrigin::Mood);
    }

    #[test]
    fn test_plan_caps_directives_and_dedups() {
        let planner = QueryPlanner::new(PlannerConfig {
            max_directives: 3,
            ..Default::default()
        });
        let overrides = PlanOverride {
            language: Some("english".to_string()),
            genre: Some("pop".to_string()),
        };
        let plan = planner.plan(&joy_target(None), 1800, &overrides);
        assert_eq!(plan.len(), 3);
        let pop_count = plan.iter().filter(|d| d.tag == "pop").count();
        assert_eq!(pop_count, 1);
    }

    #[test]
    fn test_plan_sizes_limits_from_duration() {
        let planner = QueryPlanner::default();
        let short = planner.plan(&joy_target(None), 300, &PlanOverride::default());
        assert!(short.iter().all(|d| d.limit == MIN_DIRECTIVE_LIMIT));

        // 3 hours: 52 tracks expected, 104 over-fetched over 4 directives.
        let long = planner.plan(&joy_target(None), 3 * 3600, &PlanOverride::default());
        assert_eq!(long.len(), 4);
        assert!(long.iter().all(|d| d.limit == 26));
    }

    #[tokio::test]
    async fn test_fetch_drops_failing_directive() {
        let catalog = StaticCatalog::new()
            .with_tag("pop", tracks("p", 3))
            .with_tag("dance", tracks("d", 2))
            .failing_on("funk");
        let planner = QueryPlanner::default();
        let directives: Vec<_> = ["pop", "funk", "dance"]
            .iter()
            .map(|t| SearchDirective {
                tag: t.to_string(),
                limit: 10,
                origin: DirectiveOrigin::Mood,
            })
            .collect();

        let result = planner.fetch(&catalog, &directives, None).await.unwrap();
        let ids: Vec<_> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "d0", "d1"]);
    }

    #[tokio::test]
    async fn test_fetch_filled_pads_sparse_pool() {
        let catalog = StaticCatalog::new()
            .with_tag("ballad", tracks("b", 1))
            .with_tag(FALLBACK_TAG, tracks("pop", 20));
        let planner = QueryPlanner::default();
        let directives = vec![SearchDirective {
            tag: "ballad".to_string(),
            limit: 10,
            origin: DirectiveOrigin::Mood,
        }];

        let result = planner
            .fetch_filled(&catalog, &directives, 1200, None)
            .await
            .unwrap();
        assert_eq!(result[0].id, "b0");
        let total: u32 = result.iter().map(|t| t.duration_seconds).sum();
        assert!(total >= 1200, "total {total}");
    }

    #[tokio::test]
    async fn test_fetch_filled_skips_padding_when_enough() {
        let catalog = StaticCatalog::new()
            .with_tag("ballad", tracks("b", 10))
            .with_tag(FALLBACK_TAG, tracks("pop", 20));
        let planner = QueryPlanner::default();
        let directives = vec![SearchDirective {
            tag: "ballad".to_string(),
            limit: 10,
            origin: DirectiveOrigin::Mood,
        }];

        let result = planner
            .fetch_filled(&catalog, &directives, 1200, None)
            .await
            .unwrap();
        assert!(result.iter().all(|t| t.id.starts_with('b')));
    }

    #[tokio::test]
    async fn test_fetch_surfaces_authentication() {
        let catalog = StaticCatalog::new().requiring_token();
        let planner = QueryPlanner::default();
        let directives = vec![SearchDirective {
            tag: "pop".to_string(),
            limit: 10,
            origin: DirectiveOrigin::Mood,
        }];

        let result = planner.fetch(&catalog, &directives, None).await;
        assert!(matches!(result, Err(PlaylistError::AuthenticationRequired { .. })));
    }

    #[tokio::test]
    async fn test_fetch_times_out_slow_directive() {
        let catalog = StaticCatalog::new()
            .with_tag("pop", tracks("p", 2))
            .with_delay(Duration::from_millis(200));
        let planner = QueryPlanner::new(PlannerConfig {
            fetch_timeout: Duration::from_millis(20),
            ..Default::default()
        });
        let directives = vec![SearchDirective {
            tag: "pop".to_string(),
            limit: 10,
            origin: DirectiveOrigin::Mood,
        }];

        let result = planner.fetch(&catalog, &directives, None).await.unwrap();
        assert!(result.is_empty());
    }
}
