//! Current working directory tool

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::ToolError;
use crate::tools::{parse_params, BoxFuture, Tool, ToolKind};

use super::path_to_display;

#[derive(Debug, Deserialize)]
struct NoParams {}

/// Tool reporting the directory relative paths are resolved against
pub struct CurrentDirectory {
    workspace: PathBuf,
}

impl CurrentDirectory {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

impl Tool for CurrentDirectory {
    fn kind(&self) -> ToolKind {
        ToolKind::CurrentDirectory
    }

    fn description(&self) -> &str {
        "Get the current working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute(&self, params: Value) -> BoxFuture<'_, Result<String, ToolError>> {
        Box::pin(async move {
            let NoParams {} = parse_params(self.kind(), params)?;

            let cwd = dunce::canonicalize(&self.workspace).map_err(|e| {
                ToolError::failed("Error getting the current working directory", e)
            })?;

            Ok(format!(
                "Successfully got the current working directory: {}",
                path_to_display(&cwd)
            ))
        })
    }
}
