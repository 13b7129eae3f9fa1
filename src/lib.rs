//! Mood Playlist MCP Server
//!
//! An MCP server that turns a free-text mood query, emojis included, into a
//! playlist. Queries are classified into a mood, mapped to musical feature
//! targets, searched in a music catalog and blended with the listener's own
//! history.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server and transports
//! - **domains**
//!   - **playlist**: the mood-to-playlist pipeline
//!   - **tools**: MCP tools exposing the pipeline
//!   - **resources**: server status and the mood table
//!   - **prompts**: prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use mood_playlist_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::from_config(config).await;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

pub use core::{Config, Error, McpServer, Result};
