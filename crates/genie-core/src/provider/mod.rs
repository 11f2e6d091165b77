//! LLM provider boundary
//!
//! The gateway never talks to an HTTP API directly; it goes through the
//! [`ChatBackend`] trait. The production backend is [`GenAIBackend`], built on
//! the genai framework, which covers:
//! - Google Gemini (default)
//! - OpenAI
//! - Anthropic

mod genai_provider;
mod logging;

pub use genai_provider::GenAIBackend;
pub use logging::{log_llm_interaction, LogConfig};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tools::{ToolDefinition, ToolInvocationRequest};

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Google Gemini
    #[default]
    Gemini,
    /// OpenAI (GPT-4o, etc.)
    OpenAI,
    /// Anthropic (Claude)
    Anthropic,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
        }
    }

    /// Get the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-2.5-flash",
            ProviderType::OpenAI => "gpt-4o",
            ProviderType::Anthropic => "claude-sonnet-4-5-20250929",
        }
    }

    /// Environment variables checked for the API key, in order
    pub fn api_key_envs(&self) -> &'static [&'static str] {
        match self {
            ProviderType::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            ProviderType::OpenAI => &["OPENAI_API_KEY"],
            ProviderType::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }
}

/// Message in the model's working context.
///
/// Wider than the transcript: within a turn the gateway also records the
/// model's tool calls and their results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum LlmMessage {
    User { content: String },
    Assistant { content: String },
    /// Assistant message carrying tool calls (and any text emitted before them)
    AssistantToolCalls {
        content: Option<String>,
        tool_calls: Vec<ToolInvocationRequest>,
    },
    /// Result of one tool call
    ToolResult { call_id: String, content: String },
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    pub fn assistant_with_tool_calls(
        content: Option<String>,
        tool_calls: Vec<ToolInvocationRequest>,
    ) -> Self {
        Self::AssistantToolCalls {
            content,
            tool_calls,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
        }
    }
}

/// One model call
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Event produced while a model call streams
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Text(String),
    ToolCall(ToolInvocationRequest),
}

/// Forward-only stream of one model call; ends when the call is complete
pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

/// A remote model able to stream a response
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Start a model call. Connection failures surface here, later failures
    /// as `Err` items of the stream.
    async fn stream_chat(&self, request: LlmRequest) -> Result<EventStream>;

    /// Run a model call to completion and return its text.
    ///
    /// Tool calls in the response are ignored.
    async fn complete(&self, request: LlmRequest) -> Result<String> {
        let mut stream = self.stream_chat(request).await?;
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            if let StreamEvent::Text(chunk) = event? {
                text.push_str(&chunk);
            }
        }
        if text.is_empty() {
            return Err(Error::Gateway("model returned no text".to_string()));
        }
        Ok(text)
    }
}
