//! Read file tool

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::ToolError;
use crate::tools::{parse_params, BoxFuture, Tool, ToolKind};

use super::resolve_path;

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: String,
}

/// Tool for reading file contents
pub struct ReadFile {
    workspace: PathBuf,
}

impl ReadFile {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

impl Tool for ReadFile {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadFile
    }

    fn description(&self) -> &str {
        "Read the contents of a file given its path"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<String, ToolError>> {
        Box::pin(async move {
            let ReadFileParams { path } = parse_params(self.kind(), params)?;

            let resolved = resolve_path(&self.workspace, &path);
            let content = tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| ToolError::failed(format!("Error reading file \"{}\"", path), e))?;

            Ok(format!(
                "Successfully read file \"{}\" ({} characters):\n\n{}",
                path,
                content.chars().count(),
                content
            ))
        })
    }
}
