//! Playlist domain module.
//!
//! Turns a mood query into a playlist. Leaf to root:
//!
//! - `query.rs` - Emoji, duration, language and genre extraction
//! - `classifier.rs` - Mood classification strategies (hosted model, keywords)
//! - `mapper.rs` - Mood label to musical feature target
//! - `planner.rs` - Feature target to bounded catalog searches
//! - `catalog.rs` - Catalog clients (Last.fm, in-memory)
//! - `scoring.rs` - Attribute similarity
//! - `assembler.rs` - History/recommendation blend and duration fitting
//! - `links.rs` - Platform links for tracks and playlists
//! - `history.rs` / `session.rs` - Per-user state
//! - `service.rs` - The end-to-end pipeline

pub mod assembler;
pub mod catalog;
pub mod classifier;
mod error;
pub mod history;
pub mod links;
pub mod mapper;
pub mod model;
pub mod planner;
pub mod query;
pub mod scoring;
pub mod service;
pub mod session;

pub use assembler::{Assembly, PlaylistAssembler};
pub use catalog::{CatalogClient, LastFmCatalog, StaticCatalog};
pub use classifier::{
    ClassificationStrategy, DEFAULT_EMOTION_MODEL, InferenceClassifier, KeywordClassifier,
    MoodClassifier,
};
pub use error::PlaylistError;
pub use history::{HistoryStore, InMemoryHistoryStore, JsonHistoryStore};
pub use mapper::{DEFAULT_CONFIDENCE_THRESHOLD, FeatureMapper};
pub use model::{
    FeatureTarget, MoodLabel, MoodSignal, PlaylistRequest, PlaylistResult, TrackCandidate,
};
pub use planner::{DEFAULT_AVG_TRACK_SECONDS, DEFAULT_MAX_DIRECTIVES, QueryPlanner};
pub use service::PlaylistService;
pub use session::SessionStore;
