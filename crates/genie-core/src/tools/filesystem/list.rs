//! List directory tool

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::ToolError;
use crate::tools::{parse_params, BoxFuture, Tool, ToolKind};

use super::resolve_path;

#[derive(Debug, Deserialize)]
struct ReadDirectoryParams {
    path: String,
}

/// Tool for listing directory contents
pub struct ReadDirectory {
    workspace: PathBuf,
}

impl ReadDirectory {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

impl Tool for ReadDirectory {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadDirectory
    }

    fn description(&self) -> &str {
        "List files and directories in a given directory path"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to list"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<String, ToolError>> {
        Box::pin(async move {
            let ReadDirectoryParams { path } = parse_params(self.kind(), params)?;
            let failed = |e| ToolError::failed(format!("Error reading directory \"{}\"", path), e);

            let resolved = resolve_path(&self.workspace, &path);
            let mut dir = tokio::fs::read_dir(&resolved).await.map_err(failed)?;

            let mut entries = Vec::new();
            while let Some(entry) = dir.next_entry().await.map_err(failed)? {
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                entries.push((entry.file_name().to_string_lossy().to_string(), is_dir));
            }
            entries.sort();

            let listing: Vec<String> = entries
                .iter()
                .map(|(name, is_dir)| {
                    format!("- {} ({})", name, if *is_dir { "directory" } else { "file" })
                })
                .collect();

            Ok(format!(
                "Successfully read directory \"{}\". Found {} items:\n{}",
                path,
                entries.len(),
                listing.join("\n")
            ))
        })
    }
}
