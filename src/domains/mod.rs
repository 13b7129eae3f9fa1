//! Domains module containing business logic organized by bounded contexts.
//!
//! `playlist` holds the mood-to-playlist pipeline; `tools`, `resources` and
//! `prompts` expose it over MCP.

pub mod playlist;
pub mod prompts;
pub mod resources;
pub mod tools;
