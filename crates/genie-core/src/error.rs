//! Error types for Genie Core

use thiserror::Error;

/// Result type alias using Genie Error
pub type Result<T> = std::result::Result<T, Error>;

/// Genie error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Could not extract a command: {0}")]
    Extraction(String),

    #[error("Command failed{}: {stderr}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    Execution { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

/// Tool-specific errors
///
/// None of these ever leave the tool registry: `ToolRegistry::invoke` turns
/// them into plain text for the model.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool \"{0}\"")]
    NotFound(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidParams { tool: String, reason: String },

    /// A platform call failed; `context` is the tool's own failure prefix.
    #[error("{context}: {source}")]
    Failed {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn failed(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Failed {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display_uses_context() {
        let err = ToolError::failed(
            "Error reading file \"missing.txt\"",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert_eq!(
            err.to_string(),
            "Error reading file \"missing.txt\": No such file or directory"
        );
    }

    #[test]
    fn test_execution_display() {
        let err = Error::Execution {
            code: Some(2),
            stderr: "ls: cannot access 'nope'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command failed with exit code 2: ls: cannot access 'nope'"
        );

        let err = Error::Execution {
            code: None,
            stderr: "killed".to_string(),
        };
        assert_eq!(err.to_string(), "Command failed: killed");
    }
}
