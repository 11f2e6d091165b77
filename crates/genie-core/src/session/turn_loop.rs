//! The conversational turn loop
//!
//! ```text
//! AwaitingInput ──▶ Dispatching ──▶ Streaming ──▶ Idle ──┐
//!       ▲   │                                            │
//!       │   └──▶ Closed (exit keyword / cancellation)    │
//!       └────────────────────────────────────────────────┘
//! ```
//!
//! A gateway failure in Dispatching or Streaming is reported and the loop
//! goes back to AwaitingInput; the user message stays in the transcript and
//! no assistant message is recorded for that turn.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::transcript::{Message, TranscriptStore};
use super::types::{SessionConfig, SessionEnd, TurnState, UserInput};
use crate::error::Error;
use crate::gateway::ModelGateway;
use crate::tools::{ToolInvocationRequest, ToolRegistry};

/// Shown when the user submits a blank line
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a message.";

/// Whether `input` ends the session (`exit` or `quit`, any case)
pub fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Where user lines come from
pub trait InputSource {
    /// Block until the user submits a line or cancels
    fn read_line(&mut self) -> UserInput;
}

/// Where the loop reports progress
pub trait TurnDisplay {
    /// The seeded first message is being sent without a prompt
    fn show_seeded_message(&mut self, message: &str);
    fn input_rejected(&mut self, reason: &str);
    /// A model call is in flight
    fn thinking_started(&mut self);
    /// The answer is about to stream; `tool_calls` ran before it
    fn answer_started(&mut self, tool_calls: &[ToolInvocationRequest]);
    fn fragment(&mut self, text: &str);
    fn answer_finished(&mut self);
    fn turn_failed(&mut self, error: &Error);
    fn cancelled(&mut self);
    fn goodbye(&mut self);
}

/// Drives turns until the user exits or cancels
pub struct TurnLoop<I, D> {
    gateway: ModelGateway,
    tools: Arc<ToolRegistry>,
    input: I,
    display: D,
    transcript: TranscriptStore,
    initial_message: Option<String>,
    max_steps: usize,
    state: TurnState,
}

impl<I: InputSource, D: TurnDisplay> TurnLoop<I, D> {
    /// Tools resolve relative paths against `config.workspace_path`
    pub fn new(gateway: ModelGateway, config: SessionConfig, input: I, display: D) -> Self {
        Self {
            gateway,
            tools: Arc::new(ToolRegistry::standard(config.workspace_path)),
            input,
            display,
            transcript: TranscriptStore::new(),
            initial_message: config.initial_message,
            max_steps: config.max_steps,
            state: TurnState::AwaitingInput,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Whether the seeded message (if any) has been sent
    pub fn first_message_consumed(&self) -> bool {
        self.initial_message.is_none()
    }

    /// Run turns until the session closes
    pub async fn run(&mut self) -> SessionEnd {
        loop {
            if let Some(end) = self.run_turn().await {
                debug!(?end, messages = self.transcript.len(), "Session closed");
                return end;
            }
        }
    }

    /// Run a single turn. Returns `Some` once the session has closed.
    pub async fn run_turn(&mut self) -> Option<SessionEnd> {
        if self.state == TurnState::Closed {
            return Some(SessionEnd::Exited);
        }

        self.state = TurnState::AwaitingInput;
        let content = match self.next_message() {
            Ok(content) => content,
            Err(end) => {
                self.state = TurnState::Closed;
                return Some(end);
            }
        };

        self.state = TurnState::Dispatching;
        if let Err(e) = self.transcript.append(Message::user(content)) {
            self.display.input_rejected(&e.to_string());
            self.state = TurnState::AwaitingInput;
            return None;
        }

        self.display.thinking_started();
        let response = match self
            .gateway
            .respond(self.transcript.as_context(), self.tools.clone(), self.max_steps)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.fail_turn(e);
                return None;
            }
        };

        let (tool_calls, mut text) = response.into_parts();
        self.display.answer_started(&tool_calls);
        self.state = TurnState::Streaming;

        let mut answer = String::new();
        while let Some(fragment) = text.next().await {
            match fragment {
                Ok(fragment) => {
                    self.display.fragment(&fragment);
                    answer.push_str(&fragment);
                }
                Err(e) => {
                    self.fail_turn(e);
                    return None;
                }
            }
        }
        self.display.answer_finished();

        self.state = TurnState::Idle;
        if let Err(e) = self.transcript.append(Message::assistant(answer)) {
            warn!(error = %e, "Assistant message not recorded");
        }
        None
    }

    /// The seeded message on the first turn, otherwise a validated, trimmed line
    fn next_message(&mut self) -> Result<String, SessionEnd> {
        if let Some(seed) = self.initial_message.take() {
            if !seed.trim().is_empty() {
                self.display.show_seeded_message(&seed);
                return Ok(seed);
            }
        }

        loop {
            match self.input.read_line() {
                UserInput::Cancelled => {
                    self.display.cancelled();
                    return Err(SessionEnd::Cancelled);
                }
                UserInput::Line(line) if line.trim().is_empty() => {
                    self.display.input_rejected(EMPTY_INPUT_MESSAGE);
                }
                UserInput::Line(line) if is_exit_keyword(&line) => {
                    self.display.goodbye();
                    return Err(SessionEnd::Exited);
                }
                UserInput::Line(line) => return Ok(line.trim().to_string()),
            }
        }
    }

    fn fail_turn(&mut self, e: Error) {
        error!(error = %e, "Turn failed");
        self.display.turn_failed(&e);
        self.state = TurnState::AwaitingInput;
    }
}
