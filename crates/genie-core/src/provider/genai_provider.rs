//! GenAI-based backend implementation
//!
//! Uses the genai framework with manual tool control: tool calls are surfaced
//! as stream events and executed by the gateway, never by genai itself.
//!
//! ## LLM Request/Response Logging
//!
//! Set the `LLM_LOG_FILE` environment variable to append a JSON line for every
//! model call. Example: `LLM_LOG_FILE=/tmp/llm.log genie`

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::Client;
use genai::WebConfig;
use std::time::Duration;
use tracing::{debug, error};

use super::logging::{log_llm_interaction, LogConfig};
use super::{ChatBackend, EventStream, LlmMessage, LlmRequest, ProviderType, StreamEvent};
use crate::error::{Error, Result};
use crate::tools::ToolInvocationRequest;

impl From<ToolCall> for ToolInvocationRequest {
    fn from(tc: ToolCall) -> Self {
        Self {
            call_id: tc.call_id,
            tool_name: tc.fn_name,
            arguments: tc.fn_arguments, // Already a serde_json::Value
        }
    }
}

fn to_genai_tool_call(request: &ToolInvocationRequest) -> ToolCall {
    ToolCall {
        call_id: request.call_id.clone(),
        fn_name: request.tool_name.clone(),
        fn_arguments: request.arguments.clone(),
        thought_signatures: None,
    }
}

/// A backend implementation using genai
pub struct GenAIBackend {
    client: Client,
    provider_type: ProviderType,
    model: String,
}

impl GenAIBackend {
    /// Default timeout for LLM API requests (5 minutes)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Default timeout for establishing the connection
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a backend with a specific API key
    pub fn with_api_key(provider_type: ProviderType, api_key: &str, model: Option<&str>) -> Self {
        Self::with_timeouts(
            provider_type,
            api_key,
            model,
            Self::DEFAULT_TIMEOUT,
            Self::DEFAULT_CONNECT_TIMEOUT,
        )
    }

    /// Create a backend with explicit network timeouts
    pub fn with_timeouts(
        provider_type: ProviderType,
        api_key: &str,
        model: Option<&str>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let web_config = WebConfig::default()
            .with_timeout(timeout)
            .with_connect_timeout(connect_timeout);

        let client = Client::builder()
            .with_web_config(web_config)
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Get the provider type
    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_chat_request(request: &LlmRequest) -> ChatRequest {
        let mut chat_req = ChatRequest::default();

        if let Some(system) = &request.system_prompt {
            chat_req = chat_req.with_system(system.as_str());
        }

        for msg in &request.messages {
            chat_req = match msg {
                LlmMessage::User { content } => chat_req.append_message(ChatMessage::user(content.clone())),
                LlmMessage::Assistant { content } => {
                    chat_req.append_message(ChatMessage::assistant(content.clone()))
                }
                LlmMessage::AssistantToolCalls { content, tool_calls } => {
                    // Preamble text goes first; the tool calls must then travel
                    // as a single assistant message
                    let mut req = chat_req;
                    if let Some(text) = content.as_deref().filter(|t| !t.is_empty()) {
                        req = req.append_message(ChatMessage::assistant(text));
                    }
                    let calls: Vec<ToolCall> = tool_calls.iter().map(to_genai_tool_call).collect();
                    req.append_message(calls)
                }
                LlmMessage::ToolResult { call_id, content } => {
                    chat_req.append_message(ToolResponse::new(call_id.clone(), content.clone()))
                }
            };
        }

        if !request.tools.is_empty() {
            let genai_tools: Vec<Tool> = request
                .tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(genai_tools);
        }

        chat_req
    }
}

#[async_trait]
impl ChatBackend for GenAIBackend {
    fn name(&self) -> &str {
        self.provider_type.as_str()
    }

    async fn stream_chat(&self, request: LlmRequest) -> Result<EventStream> {
        let chat_req = Self::build_chat_request(&request);
        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending model request"
        );

        let response = match self.client.exec_chat_stream(&self.model, chat_req, None).await {
            Ok(response) => response,
            Err(e) => {
                // Use Debug format to get full error chain
                let error_msg = format!("GenAI error: {:?}", e);
                log_llm_interaction(LogConfig {
                    model: &self.model,
                    provider: Some(self.provider_type.as_str()),
                    request: Some(&request),
                    error: Some(&error_msg),
                    ..Default::default()
                });
                error!(error = ?e, model = %self.model, "LLM request failed");
                return Err(Error::Gateway(error_msg));
            }
        };

        let model = self.model.clone();
        let provider = self.provider_type.as_str();
        let mut text = String::new();
        let mut tool_calls: Vec<ToolInvocationRequest> = Vec::new();

        let stream = response.stream.filter_map(move |event| {
            let mapped = match event {
                Ok(ChatStreamEvent::Chunk(chunk)) if !chunk.content.is_empty() => {
                    text.push_str(&chunk.content);
                    Some(Ok(StreamEvent::Text(chunk.content)))
                }
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => {
                    // Each ToolCallChunk contains a complete ToolCall
                    let call = ToolInvocationRequest::from(tc.tool_call);
                    tool_calls.push(call.clone());
                    Some(Ok(StreamEvent::ToolCall(call)))
                }
                Ok(ChatStreamEvent::End(_)) => {
                    log_llm_interaction(LogConfig {
                        model: &model,
                        provider: Some(provider),
                        request: Some(&request),
                        response_text: Some(&text),
                        tool_calls: Some(&tool_calls),
                        ..Default::default()
                    });
                    None
                }
                // Start, reasoning and thought signatures are not shown
                Ok(_) => None,
                Err(e) => {
                    let error_msg = format!("GenAI stream error: {:?}", e);
                    log_llm_interaction(LogConfig {
                        model: &model,
                        provider: Some(provider),
                        request: Some(&request),
                        error: Some(&error_msg),
                        ..Default::default()
                    });
                    error!(error = ?e, model = %model, "LLM stream error");
                    Some(Err(Error::Gateway(error_msg)))
                }
            };
            futures::future::ready(mapped)
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDefinition;
    use serde_json::json;

    #[test]
    fn test_default_model_applied() {
        let backend = GenAIBackend::with_api_key(ProviderType::Gemini, "test-key", None);
        assert_eq!(backend.model(), "gemini-2.5-flash");
        assert_eq!(backend.name(), "gemini");

        let backend = GenAIBackend::with_api_key(ProviderType::Gemini, "test-key", Some("gemini-2.5-pro"));
        assert_eq!(backend.model(), "gemini-2.5-pro");
    }

    #[test]
    fn test_tool_call_conversion() {
        let call = ToolCall {
            call_id: "call-7".to_string(),
            fn_name: "readFile".to_string(),
            fn_arguments: json!({"path": "a.txt"}),
            thought_signatures: None,
        };
        let request = ToolInvocationRequest::from(call);
        assert_eq!(request.call_id, "call-7");
        assert_eq!(request.tool_name, "readFile");
        assert_eq!(request.arguments["path"], "a.txt");

        let back = to_genai_tool_call(&request);
        assert_eq!(back.fn_name, "readFile");
    }

    #[test]
    fn test_build_request_keeps_tools() {
        let request = LlmRequest::new(vec![LlmMessage::user("hi")])
            .with_system_prompt("be brief")
            .with_tools(vec![ToolDefinition {
                name: "readFile".to_string(),
                description: "Read".to_string(),
                parameters: json!({"type": "object"}),
            }]);
        let chat_req = GenAIBackend::build_chat_request(&request);
        assert_eq!(chat_req.messages.len(), 1);
        assert_eq!(chat_req.tools.as_ref().map(|t| t.len()), Some(1));
        assert_eq!(chat_req.system.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_build_request_keeps_tool_call_preamble() {
        let call = ToolInvocationRequest::new("c1", "getCurrentWorkingDirectory", json!({}));
        let request = LlmRequest::new(vec![
            LlmMessage::user("where am I?"),
            LlmMessage::assistant_with_tool_calls(Some("Let me check. ".to_string()), vec![call.clone()]),
            LlmMessage::tool_result("c1", "Current working directory: /tmp"),
        ]);
        let chat_req = GenAIBackend::build_chat_request(&request);
        assert_eq!(chat_req.messages.len(), 4);
        assert_eq!(
            chat_req.messages[1].content.first_text(),
            Some("Let me check. ")
        );

        let request = LlmRequest::new(vec![
            LlmMessage::user("where am I?"),
            LlmMessage::assistant_with_tool_calls(None, vec![call]),
        ]);
        let chat_req = GenAIBackend::build_chat_request(&request);
        assert_eq!(chat_req.messages.len(), 2);
    }
}
