//! Tool definitions module.
//!
//! Each tool is defined in its own file: parameters, `execute()`,
//! `http_handler()`, `to_tool()` and `create_route()`.

pub mod common;
pub mod playlist;
pub mod session;

pub use playlist::{
    AnalyzeMoodParams, AnalyzeMoodTool, GenerateMoodPlaylistTool, GeneratePlaylistParams,
    SupportedOptionsParams, SupportedOptionsTool,
};
pub use session::{SessionLogoutParams, SessionLogoutTool, SessionStartParams, SessionStartTool};
