//! Tool-specific error types.

use thiserror::Error;

/// Errors raised while dispatching a tool call outside of rmcp.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_format_messages() {
        assert_eq!(ToolError::not_found("dance").to_string(), "Tool not found: dance");
        assert!(matches!(
            ToolError::invalid_arguments("missing query"),
            ToolError::InvalidArguments(msg) if msg == "missing query"
        ));
        assert_eq!(
            ToolError::execution_failed("boom").to_string(),
            "Execution failed: boom"
        );
    }
}
