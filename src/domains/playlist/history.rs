//! Per-user listening history.
//!
//! History feeds the familiar share of a playlist. Stores are keyed by a
//! user id; an unknown user simply has no history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::error::PlaylistError;
use super::mapper::mood_profile;
use super::model::{MoodLabel, TrackCandidate, TrackSource};

/// Most recent entries kept per user.
pub const MAX_HISTORY_ENTRIES: usize = 500;

/// One track a user has received before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub track: TrackCandidate,
    /// Mood the track was served for.
    pub mood: String,
    pub played_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(track: TrackCandidate, mood: impl Into<String>) -> Self {
        Self {
            track,
            mood: mood.into(),
            played_at: Utc::now(),
        }
    }
}

/// Storage for listening history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Entries for a user, oldest first.
    async fn entries(&self, user_id: &str) -> Result<Vec<HistoryEntry>, PlaylistError>;

    /// Append entries, keeping at most [`MAX_HISTORY_ENTRIES`].
    async fn record(&self, user_id: &str, entries: Vec<HistoryEntry>) -> Result<(), PlaylistError>;

    /// Drop everything stored for a user.
    async fn clear(&self, user_id: &str) -> Result<(), PlaylistError>;

    /// History as candidates for the familiar pool, newest play per track.
    ///
    /// Tracks without measured features take those of the mood they were
    /// served for, so they can be scored against a new target.
    async fn user_history(&self, user_id: &str) -> Result<Vec<TrackCandidate>, PlaylistError> {
        let entries = self.entries(user_id).await?;
        let mut seen = std::collections::HashSet::new();
        let mut tracks = Vec::new();
        for entry in entries.into_iter().rev() {
            if seen.insert(entry.track.id.clone()) {
                let mut track = entry.track;
                track.source = TrackSource::History;
                if track.features.is_none() {
                    track.features = entry
                        .mood
                        .parse::<MoodLabel>()
                        .ok()
                        .map(|label| mood_profile(label).features());
                }
                tracks.push(track);
            }
        }
        Ok(tracks)
    }
}

fn merge(existing: &mut Vec<HistoryEntry>, new: Vec<HistoryEntry>) {
    existing.extend(new);
    if existing.len() > MAX_HISTORY_ENTRIES {
        let excess = existing.len() - MAX_HISTORY_ENTRIES;
        existing.drain(..excess);
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local history, lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryStore {
    users: Arc<RwLock<HashMap<String, Vec<HistoryEntry>>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn entries(&self, user_id: &str) -> Result<Vec<HistoryEntry>, PlaylistError> {
        Ok(self.users.read().await.get(user_id).cloned().unwrap_or_default())
    }

    async fn record(&self, user_id: &str, entries: Vec<HistoryEntry>) -> Result<(), PlaylistError> {
        let mut users = self.users.write().await;
        merge(users.entry(user_id.to_string()).or_default(), entries);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), PlaylistError> {
        self.users.write().await.remove(user_id);
        Ok(())
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// One JSON file per user inside a directory.
#[derive(Debug)]
pub struct JsonHistoryStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles.
    lock: tokio::sync::Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a user: the SHA-256 of the id, so distinct ids never share
    /// a file and any id is a valid file name.
    fn path_for(&self, user_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    async fn load(&self, path: &Path) -> Result<Vec<HistoryEntry>, PlaylistError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PlaylistError::history(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PlaylistError::history(format!("{}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn entries(&self, user_id: &str) -> Result<Vec<HistoryEntry>, PlaylistError> {
        self.load(&self.path_for(user_id)).await
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn record(&self, user_id: &str, entries: Vec<HistoryEntry>) -> Result<(), PlaylistError> {
        let _guard = self.lock.lock().await;
        let path = self.path_for(user_id);
        let mut existing = self.load(&path).await?;
        merge(&mut existing, entries);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PlaylistError::history(format!("{}: {e}", self.dir.display())))?;
        let json = serde_json::to_vec_pretty(&existing)
            .map_err(|e| PlaylistError::history(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PlaylistError::history(format!("{}: {e}", path.display())))?;

        debug!("Stored {} history entries at {}", existing.len(), path.display());
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), PlaylistError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(self.path_for(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PlaylistError::history(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry::new(
            TrackCandidate::new(id, 200, TrackSource::Recommendation, 0.7),
            "joy",
        )
    }

    #[tokio::test]
    async fn test_memory_store_unknown_user_is_empty() {
        let store = InMemoryHistoryStore::new();
        assert!(store.entries("nobody").await.unwrap().is_empty());
        assert!(store.user_history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_candidates_are_history_sourced_and_unique() {
        let store = InMemoryHistoryStore::new();
        store
            .record("u1", vec![entry("a"), entry("b"), entry("a")])
            .await
            .unwrap();

        let tracks = store.user_history("u1").await.unwrap();
        let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(tracks.iter().all(|t| t.source == TrackSource::History));
    }

    #[tokio::test]
    async fn test_candidates_take_features_from_mood() {
        let store = InMemoryHistoryStore::new();
        let mut unknown = entry("b");
        unknown.mood = "not-a-mood".to_string();
        store.record("u1", vec![entry("a"), unknown]).await.unwrap();

        let tracks = store.user_history("u1").await.unwrap();
        let joy = mood_profile(MoodLabel::Joy).features();
        assert_eq!(tracks[0].features, None);
        assert_eq!(tracks[1].features, Some(joy));
    }

    #[tokio::test]
    async fn test_record_caps_entries() {
        let store = InMemoryHistoryStore::new();
        let many: Vec<_> = (0..MAX_HISTORY_ENTRIES + 10).map(|i| entry(&format!("t{i}"))).collect();
        store.record("u1", many).await.unwrap();
        let entries = store.entries("u1").await.unwrap();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].track.id, "t10");
    }

    #[tokio::test]
    async fn test_json_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history"));
        store.record("user@example.com", vec![entry("a")]).await.unwrap();

        let reopened = JsonHistoryStore::new(dir.path().join("history"));
        let entries = reopened.entries("user@example.com").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mood, "joy");
        assert_eq!(std::fs::read_dir(dir.path().join("history")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_json_store_keeps_similar_ids_apart() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        store.record("alice.smith", vec![entry("private")]).await.unwrap();

        assert!(store.user_history("alice_smith").await.unwrap().is_empty());
        assert!(store.user_history("alice@smith").await.unwrap().is_empty());

        store.clear("alice@smith").await.unwrap();
        store.clear("alice_smith").await.unwrap();
        assert_eq!(store.entries("alice.smith").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_json_store_clear() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        store.record("u1", vec![entry("a")]).await.unwrap();
        store.clear("u1").await.unwrap();
        assert!(store.entries("u1").await.unwrap().is_empty());
        // Clearing twice is fine.
        store.clear("u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_json_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        std::fs::write(store.path_for("u1"), b"not json").unwrap();
        assert!(matches!(store.entries("u1").await, Err(PlaylistError::History(_))));
    }
}
