//! Playlist tools.

mod analyze;
mod generate;
mod options;

pub use analyze::{AnalyzeMoodParams, AnalyzeMoodTool};
pub use generate::{GenerateMoodPlaylistTool, GeneratePlaylistParams};
pub use options::{SupportedOptionsParams, SupportedOptionsTool};
