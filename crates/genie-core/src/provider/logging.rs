//! LLM request/response logging utilities
//!
//! Set the `LLM_LOG_FILE` environment variable to enable detailed logging
//! of all model calls to a JSON-lines file.

use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

use super::LlmRequest;
use crate::tools::ToolInvocationRequest;

/// Configuration for what to include in the log entry
#[derive(Default)]
pub struct LogConfig<'a> {
    /// The model used for this request
    pub model: &'a str,
    /// Provider name (e.g., "gemini")
    pub provider: Option<&'a str>,
    /// The request as sent
    pub request: Option<&'a LlmRequest>,
    /// Accumulated response text
    pub response_text: Option<&'a str>,
    /// Tool calls the model asked for
    pub tool_calls: Option<&'a [ToolInvocationRequest]>,
    /// Error message if the request failed
    pub error: Option<&'a str>,
}

fn entry_json(config: &LogConfig<'_>) -> serde_json::Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": config.model,
        "provider": config.provider,
        "request": config.request.map(|r| json!({
            "system_prompt": r.system_prompt,
            "messages": r.messages,
            "message_count": r.messages.len(),
            "tools": r.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        })),
        "response": {
            "text": config.response_text,
            "tool_calls": config.tool_calls,
        },
        "error": config.error,
    })
}

/// Append one JSON line for a model call if `LLM_LOG_FILE` is set
pub fn log_llm_interaction(config: LogConfig<'_>) {
    let log_file = match std::env::var("LLM_LOG_FILE") {
        Ok(path) => path,
        Err(_) => return,
    };

    let entry = entry_json(&config);

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(mut file) => {
            let json_str = serde_json::to_string(&entry).unwrap_or_default();
            if let Err(e) = writeln!(file, "{}", json_str) {
                warn!("Failed to write to LLM log file: {}", e);
            }
        }
        Err(e) => {
            warn!("Failed to open LLM log file {}: {}", log_file, e);
        }
    }

    debug!("Logged LLM interaction to {}", log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LlmMessage;
    use serde_json::json;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig {
            model: "test-model",
            ..Default::default()
        };
        assert_eq!(config.model, "test-model");
        assert!(config.provider.is_none());
        assert!(config.request.is_none());
    }

    #[test]
    fn test_entry_includes_request_and_calls() {
        let request = LlmRequest::new(vec![LlmMessage::user("list files")]);
        let calls = vec![ToolInvocationRequest::new(
            "c1",
            "readDirectory",
            json!({"path": "."}),
        )];
        let entry = entry_json(&LogConfig {
            model: "gemini-2.5-flash",
            request: Some(&request),
            tool_calls: Some(&calls),
            ..Default::default()
        });

        assert_eq!(entry["request"]["message_count"], 1);
        assert_eq!(entry["request"]["messages"][0]["role"], "user");
        assert_eq!(entry["response"]["tool_calls"][0]["tool_name"], "readDirectory");
        assert!(entry["error"].is_null());
    }
}
