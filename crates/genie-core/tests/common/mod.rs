//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use genie_core::provider::EventStream;
use genie_core::session::{InputSource, TurnDisplay, UserInput};
use genie_core::tools::ToolInvocationRequest;
use genie_core::{ChatBackend, Error, LlmRequest, Result, StreamEvent};
use serde_json::json;
use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// What one scripted model call does
pub enum Step {
    /// Stream these events and end
    Events(Vec<StreamEvent>),
    /// Fail before streaming anything
    ConnectError(String),
    /// Stream these events, then fail
    FailAfter(Vec<StreamEvent>, String),
}

/// Replays scripted steps in order and records every request
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_chat(&self, request: LlmRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Events(vec![StreamEvent::Text("(script exhausted)".into())]));

        match step {
            Step::Events(events) => Ok(stream::iter(events.into_iter().map(Ok)).boxed()),
            Step::ConnectError(msg) => Err(Error::Gateway(msg)),
            Step::FailAfter(events, msg) => Ok(stream::iter(
                events
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(Error::Gateway(msg)))),
            )
            .boxed()),
        }
    }
}

/// A model that asks for a tool on every call and never answers
#[derive(Default)]
pub struct AlwaysToolCalling {
    requests: Mutex<Vec<LlmRequest>>,
}

impl AlwaysToolCalling {
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for AlwaysToolCalling {
    fn name(&self) -> &str {
        "always-tools"
    }

    async fn stream_chat(&self, request: LlmRequest) -> Result<EventStream> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let call = tool_call(
            &format!("call-{}", requests.len()),
            "getCurrentWorkingDirectory",
            json!({}),
        );
        Ok(stream::iter(vec![Ok(call)]).boxed())
    }
}

pub fn text(s: &str) -> StreamEvent {
    StreamEvent::Text(s.to_string())
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> StreamEvent {
    StreamEvent::ToolCall(ToolInvocationRequest::new(id, name, arguments))
}

/// Feeds scripted lines, then cancels
pub struct ScriptedInput {
    lines: VecDeque<UserInput>,
    pub reads: usize,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| UserInput::line(*l)).collect(),
            reads: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> UserInput {
        self.reads += 1;
        self.lines.pop_front().unwrap_or(UserInput::Cancelled)
    }
}

/// Records everything the loop reports
#[derive(Default)]
pub struct RecordingDisplay {
    pub events: Vec<String>,
    pub answers: Vec<String>,
    current: String,
}

impl TurnDisplay for RecordingDisplay {
    fn show_seeded_message(&mut self, message: &str) {
        self.events.push(format!("seeded:{message}"));
    }

    fn input_rejected(&mut self, reason: &str) {
        self.events.push(format!("rejected:{reason}"));
    }

    fn thinking_started(&mut self) {
        self.events.push("thinking".to_string());
    }

    fn answer_started(&mut self, tool_calls: &[ToolInvocationRequest]) {
        let names: Vec<&str> = tool_calls.iter().map(|c| c.tool_name.as_str()).collect();
        self.events.push(format!("answer:[{}]", names.join(",")));
    }

    fn fragment(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn answer_finished(&mut self) {
        self.answers.push(std::mem::take(&mut self.current));
        self.events.push("finished".to_string());
    }

    fn turn_failed(&mut self, error: &Error) {
        self.current.clear();
        self.events.push(format!("failed:{error}"));
    }

    fn cancelled(&mut self) {
        self.events.push("cancelled".to_string());
    }

    fn goodbye(&mut self) {
        self.events.push("goodbye".to_string());
    }
}

/// A workspace with two files and one directory
pub fn setup_workspace() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let base = dir.path();

    fs::create_dir_all(base.join("src")).unwrap();
    fs::write(base.join("notes.txt"), "buy milk\n").unwrap();
    fs::write(base.join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();

    dir
}
