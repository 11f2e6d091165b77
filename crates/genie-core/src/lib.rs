//! Genie Core - a terminal assistant driven by an LLM
//!
//! This crate provides the core functionality for the `genie` binary:
//! - Read-only tools the model can call (working directory, listing, reading)
//! - The model gateway running bounded tool rounds and streaming answers
//! - The conversational turn loop and its transcript
//! - The command advisor behind `genie run`

pub mod advisor;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod tools;

pub use advisor::{
    command_prompt, extract_command, CommandAdvisor, ExecutionOutput, ShellCommandPlan,
    ShellExecutor, SystemShell,
};
pub use config::{AgentConfig, Config, ConfigManager, ProviderConfig, ShellConfig};
pub use error::{Error, Result, ToolError};
pub use gateway::{GatewayResponse, ModelGateway, TextStream, DEFAULT_MAX_STEPS, FALLBACK_MESSAGE};
pub use prompt::SYSTEM_PROMPT;
pub use provider::{ChatBackend, GenAIBackend, LlmMessage, LlmRequest, ProviderType, StreamEvent};
pub use session::{
    InputSource, Message, Role, SessionConfig, SessionEnd, TranscriptStore, TurnDisplay, TurnLoop,
    TurnState, UserInput,
};
pub use tools::{Tool, ToolDefinition, ToolInvocationRequest, ToolKind, ToolRegistry, ToolResult};
