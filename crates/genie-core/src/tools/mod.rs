//! Tool system for the Génie
//!
//! Tools are the local capabilities the model may request mid-turn. Each tool has:
//! - A name and description for the LLM
//! - A JSON schema for parameters
//! - An execute method returning plain text
//!
//! The set of tool names is closed ([`ToolKind`]); the registry looks a tool up
//! by kind and never lets a failure escape [`ToolRegistry::invoke`].

pub mod filesystem;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ToolError;

/// Boxed future type for object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The closed set of tools the model can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "getCurrentWorkingDirectory")]
    CurrentDirectory,
    #[serde(rename = "readDirectory")]
    ReadDirectory,
    #[serde(rename = "readFile")]
    ReadFile,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::CurrentDirectory,
        ToolKind::ReadDirectory,
        ToolKind::ReadFile,
    ];

    /// Name advertised to the model
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::CurrentDirectory => "getCurrentWorkingDirectory",
            ToolKind::ReadDirectory => "readDirectory",
            ToolKind::ReadFile => "readFile",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Provider-assigned id pairing the call with its result
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

impl ToolInvocationRequest {
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Text handed back to the model after a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool succeeded (display/logging only, the model just sees text)
    pub success: bool,
    pub content: String,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    /// Render a tool error as text. Platform failures already carry their
    /// "Error ..." prefix, the rest get a generic one.
    pub fn from_error(err: &ToolError) -> Self {
        let content = match err {
            ToolError::Failed { .. } => err.to_string(),
            _ => format!("Error: {}", err),
        };
        Self {
            success: false,
            content,
        }
    }
}

/// Core trait for all tools
pub trait Tool: Send + Sync {
    /// Which entry of the closed tool set this is
    fn kind(&self) -> ToolKind;

    /// Tool name (used by LLM to invoke)
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given parameters
    fn execute(&self, params: Value) -> BoxFuture<'_, Result<String, ToolError>>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize raw model arguments into a tool's typed parameters
pub fn parse_params<T: DeserializeOwned>(kind: ToolKind, params: Value) -> Result<T, ToolError> {
    // Models sometimes send `null` for tools without parameters
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams {
        tool: kind.as_str().to_string(),
        reason: e.to_string(),
    })
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the three read-only tools, resolving relative paths
    /// against `workspace`
    pub fn standard(workspace: PathBuf) -> Self {
        use filesystem::{CurrentDirectory, ReadDirectory, ReadFile};

        let mut registry = Self::new();
        registry.register(Arc::new(CurrentDirectory::new(workspace.clone())));
        registry.register(Arc::new(ReadDirectory::new(workspace.clone())));
        registry.register(Arc::new(ReadFile::new(workspace)));
        registry
    }

    /// Register a tool, replacing any previous tool of the same kind
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    /// All tool definitions, in [`ToolKind`] order
    pub fn describe(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up and run a tool. Always returns text; never fails.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let result = match self.dispatch(name) {
            Ok(tool) => tool.execute(arguments).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(content) => {
                debug!(tool = name, bytes = content.len(), "Tool completed");
                ToolResult::success(content)
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                ToolResult::from_error(&e)
            }
        }
    }

    fn dispatch(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        let kind = name.parse::<ToolKind>()?;
        self.tools
            .get(&kind)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_kind_roundtrip_names() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.as_str().parse::<ToolKind>().unwrap(), kind);
        }
        assert!(matches!(
            "deleteEverything".parse::<ToolKind>(),
            Err(ToolError::NotFound(name)) if name == "deleteEverything"
        ));
    }

    #[test]
    fn test_describe_is_ordered() {
        let registry = ToolRegistry::standard(PathBuf::from("."));
        let names: Vec<String> = registry.describe().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["getCurrentWorkingDirectory", "readDirectory", "readFile"]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text() {
        let registry = ToolRegistry::standard(PathBuf::from("."));
        let result = registry.invoke("writeFile", json!({"path": "x"})).await;
        assert!(!result.success);
        assert_eq!(result.content, "Error: unknown tool \"writeFile\"");
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_text() {
        let registry = ToolRegistry::new();
        let result = registry.invoke("readFile", json!({"path": "x"})).await;
        assert!(!result.success);
        assert!(result.content.starts_with("Error: unknown tool"));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_text() {
        let registry = ToolRegistry::standard(PathBuf::from("."));
        let result = registry.invoke("readFile", json!({"path": 42})).await;
        assert!(!result.success);
        assert!(result.content.starts_with("Error: invalid arguments for readFile"));

        let result = registry.invoke("readDirectory", json!({})).await;
        assert!(!result.success);
        assert!(result.content.contains("missing field `path`"));
    }
}
