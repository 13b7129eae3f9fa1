//! Session tools.

mod logout;
mod start;

pub use logout::{SessionLogoutParams, SessionLogoutTool};
pub use start::{SessionStartParams, SessionStartTool};
