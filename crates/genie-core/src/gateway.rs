//! Model gateway
//!
//! Runs one turn against the model: sends the transcript with the tool set,
//! executes the tool calls the model asks for, folds their results back into
//! the working context and streams the final text.
//!
//! A turn is a sequence of *steps*, one model call each. A step that ends with
//! tool calls triggers another step; a step that ends without them finishes
//! the turn. The number of steps per turn is bounded.

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::provider::{ChatBackend, EventStream, LlmMessage, LlmRequest, StreamEvent};
use crate::session::{Message, Role};
use crate::tools::{ToolInvocationRequest, ToolRegistry};

/// Default bound on model calls per turn
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Yielded when a turn ends without the model producing any text
pub const FALLBACK_MESSAGE: &str =
    "I could not come up with an answer using the tools available to me. Please try rephrasing your request.";

/// Appended before the last permitted step
const FINAL_STEP_NOTICE: &str = "You have reached the maximum number of tool calls for this request. \
Do not call any more tools; answer now with the information you already have.";

/// Lazily produced answer text
pub type TextStream = BoxStream<'static, Result<String>>;

/// Result of [`ModelGateway::respond`]
pub struct GatewayResponse {
    tool_calls: Vec<ToolInvocationRequest>,
    text: TextStream,
}

impl GatewayResponse {
    /// Tool calls executed before the first text fragment.
    ///
    /// Calls the model makes after text has started streaming are folded into
    /// the working context but not listed here.
    pub fn tool_calls(&self) -> &[ToolInvocationRequest] {
        &self.tool_calls
    }

    /// Split into the executed tool calls and the text stream
    pub fn into_parts(self) -> (Vec<ToolInvocationRequest>, TextStream) {
        (self.tool_calls, self.text)
    }

    /// Drain the stream into one string
    pub async fn collect_text(self) -> Result<String> {
        let mut text = String::new();
        let mut stream = self.text;
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

/// Sends transcripts to the model and drives tool rounds
#[derive(Clone)]
pub struct ModelGateway {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
}

impl ModelGateway {
    pub fn new(backend: Arc<dyn ChatBackend>, system_prompt: impl Into<String>) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Start a turn for `transcript`.
    ///
    /// Tool rounds that precede the first text fragment are executed before
    /// this returns, so a connection failure or an early model error is
    /// reported here. Later failures arrive as `Err` items of the stream.
    pub async fn respond(
        &self,
        transcript: &[Message],
        tools: Arc<ToolRegistry>,
        max_steps: usize,
    ) -> Result<GatewayResponse> {
        if transcript.is_empty() {
            return Err(Error::Validation("transcript is empty".to_string()));
        }
        if max_steps == 0 {
            return Err(Error::Validation("max_steps must be at least 1".to_string()));
        }

        let context = transcript
            .iter()
            .map(|m| match m.role {
                Role::User => LlmMessage::user(m.content.clone()),
                Role::Assistant => LlmMessage::assistant(m.content.clone()),
            })
            .collect();

        let mut driver = StepDriver {
            backend: self.backend.clone(),
            tools,
            system_prompt: self.system_prompt.clone(),
            context,
            max_steps,
            steps_taken: 0,
            current: None,
            pending_calls: Vec::new(),
            step_text: String::new(),
            produced_text: false,
            executed_calls: Vec::new(),
            done: false,
        };

        let first = match driver.next_fragment().await {
            Some(Err(e)) => return Err(e),
            other => other,
        };
        let tool_calls = driver.executed_calls.clone();

        let rest = stream::unfold(driver, |mut driver| async move {
            driver.next_fragment().await.map(|fragment| (fragment, driver))
        });

        Ok(GatewayResponse {
            tool_calls,
            text: stream::iter(first).chain(rest).boxed(),
        })
    }

    /// One model call without tools or system prompt, returning the whole text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(backend = self.backend.name(), "Requesting completion");
        self.backend
            .complete(LlmRequest::new(vec![LlmMessage::user(prompt)]))
            .await
    }
}

/// Working state of one turn
struct StepDriver {
    backend: Arc<dyn ChatBackend>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    context: Vec<LlmMessage>,
    max_steps: usize,
    steps_taken: usize,
    current: Option<EventStream>,
    pending_calls: Vec<ToolInvocationRequest>,
    /// Text of the current step, kept as the preamble of its tool calls
    step_text: String,
    produced_text: bool,
    executed_calls: Vec<ToolInvocationRequest>,
    done: bool,
}

impl StepDriver {
    async fn next_fragment(&mut self) -> Option<Result<String>> {
        loop {
            if self.done {
                return None;
            }

            if self.current.is_none() {
                match self.start_step().await {
                    Ok(events) => self.current = Some(events),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            let Some(events) = self.current.as_mut() else {
                continue;
            };

            match events.next().await {
                Some(Ok(StreamEvent::Text(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    self.step_text.push_str(&text);
                    self.produced_text = true;
                    return Some(Ok(text));
                }
                Some(Ok(StreamEvent::ToolCall(call))) => {
                    debug!(tool = %call.tool_name, call_id = %call.call_id, "Model requested tool");
                    self.pending_calls.push(call);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.current = None;
                    if self.pending_calls.is_empty() {
                        return self.finish();
                    }
                    if self.steps_taken >= self.max_steps {
                        warn!(
                            ignored = self.pending_calls.len(),
                            max_steps = self.max_steps,
                            "Step limit reached, ignoring tool calls"
                        );
                        self.pending_calls.clear();
                        return self.finish();
                    }
                    self.run_tool_round().await;
                }
            }
        }
    }

    async fn start_step(&mut self) -> Result<EventStream> {
        self.steps_taken += 1;
        if self.steps_taken == self.max_steps && self.steps_taken > 1 {
            self.context.push(LlmMessage::user(FINAL_STEP_NOTICE));
        }

        debug!(
            step = self.steps_taken,
            max_steps = self.max_steps,
            messages = self.context.len(),
            "Starting model step"
        );

        let request = LlmRequest::new(self.context.clone())
            .with_system_prompt(self.system_prompt.clone())
            .with_tools(self.tools.describe());
        self.backend.stream_chat(request).await
    }

    /// Execute the step's tool calls in order and record them with their results
    async fn run_tool_round(&mut self) {
        let calls = std::mem::take(&mut self.pending_calls);
        let preamble = std::mem::take(&mut self.step_text);

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            info!(tool = %call.tool_name, "Executing tool");
            let result = self.tools.invoke(&call.tool_name, call.arguments.clone()).await;
            results.push(LlmMessage::tool_result(call.call_id.clone(), result.content));
        }

        let preamble = (!preamble.is_empty()).then_some(preamble);
        self.context
            .push(LlmMessage::assistant_with_tool_calls(preamble, calls.clone()));
        self.context.extend(results);
        self.executed_calls.extend(calls);
    }

    fn finish(&mut self) -> Option<Result<String>> {
        self.done = true;
        if self.produced_text {
            None
        } else {
            warn!(steps = self.steps_taken, "Model produced no text, using fallback");
            Some(Ok(FALLBACK_MESSAGE.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replays one scripted list of events per call and records requests
    struct ScriptedBackend {
        steps: Mutex<Vec<Vec<StreamEvent>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedBackend {
        fn new(mut steps: Vec<Vec<StreamEvent>>) -> Self {
            steps.reverse();
            Self {
                steps: Mutex::new(steps),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream_chat(&self, request: LlmRequest) -> Result<EventStream> {
            self.requests.lock().unwrap().push(request);
            let events = self.steps.lock().unwrap().pop().unwrap_or_default();
            Ok(stream::iter(events.into_iter().map(Ok)).boxed())
        }
    }

    fn text(s: &str) -> StreamEvent {
        StreamEvent::Text(s.to_string())
    }

    fn cwd_call(id: &str) -> StreamEvent {
        StreamEvent::ToolCall(ToolInvocationRequest::new(
            id,
            "getCurrentWorkingDirectory",
            json!({}),
        ))
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::standard(PathBuf::from(".")))
    }

    #[tokio::test]
    async fn test_plain_answer_streams_fragments() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![text("Hel"), text("lo")]]));
        let gateway = ModelGateway::new(backend.clone(), "sys");

        let response = gateway
            .respond(&[Message::user("hi")], registry(), DEFAULT_MAX_STEPS)
            .await
            .unwrap();
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.collect_text().await.unwrap(), "Hello");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt.as_deref(), Some("sys"));
        assert_eq!(requests[0].tools.len(), 3);
    }

    #[tokio::test]
    async fn test_preamble_text_kept_with_tool_calls() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![text("Let me check. "), cwd_call("c1")],
            vec![text("Done.")],
        ]));
        let gateway = ModelGateway::new(backend.clone(), "sys");

        let response = gateway
            .respond(&[Message::user("where am I?")], registry(), DEFAULT_MAX_STEPS)
            .await
            .unwrap();
        // The first fragment arrives before the tool round
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.collect_text().await.unwrap(), "Let me check. Done.");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            &requests[1].messages[1],
            LlmMessage::AssistantToolCalls { content: Some(c), .. } if c == "Let me check. "
        ));
    }

    #[tokio::test]
    async fn test_final_step_gets_notice() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            vec![cwd_call("c1")],
            vec![cwd_call("c2")],
        ]));
        let gateway = ModelGateway::new(backend.clone(), "sys");

        let response = gateway
            .respond(&[Message::user("loop")], registry(), 2)
            .await
            .unwrap();
        assert_eq!(response.tool_calls().len(), 1);
        assert_eq!(response.collect_text().await.unwrap(), FALLBACK_MESSAGE);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].messages.last(),
            Some(&LlmMessage::user(FINAL_STEP_NOTICE))
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_rejected() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let gateway = ModelGateway::new(backend, "sys");
        assert!(matches!(
            gateway.respond(&[], registry(), 5).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_sends_no_tools() {
        let backend = Arc::new(ScriptedBackend::new(vec![vec![text("<command>ls</command>")]]));
        let gateway = ModelGateway::new(backend.clone(), "sys");

        let text = gateway.complete("list").await.unwrap();
        assert_eq!(text, "<command>ls</command>");

        let requests = backend.requests.lock().unwrap();
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].system_prompt.is_none());
    }
}
