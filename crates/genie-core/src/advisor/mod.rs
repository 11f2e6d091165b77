//! Command advisor
//!
//! Turns a natural-language task into a single shell command. The model is
//! asked to reason freely and then wrap the command in `<command>` tags; the
//! advisor extracts it and never runs it. Running is left to a
//! [`ShellExecutor`], after the user confirmed.

mod executor;

pub use executor::{ExecutionOutput, ShellExecutor, SystemShell};

use tracing::debug;

use crate::error::{Error, Result};
use crate::gateway::ModelGateway;

const OPEN_TAG: &str = "<command>";
const CLOSE_TAG: &str = "</command>";

/// A command proposed by the model, not yet executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommandPlan {
    pub raw_command: String,
}

/// Build the advisor prompt for `task`
pub fn command_prompt(task: &str) -> String {
    format!(
        "What is the Linux Shell command to perform this task: {task}\n\
         You can write your reasoning first, and then output the command between the {OPEN_TAG} and the {CLOSE_TAG} tags."
    )
}

/// Text between the first `<command>` and the next `</command>`, trimmed
pub fn extract_command(text: &str) -> Result<String> {
    let (_, after_open) = text
        .split_once(OPEN_TAG)
        .ok_or_else(|| Error::Extraction(format!("no {OPEN_TAG} tag in the answer")))?;
    let (inner, _) = after_open
        .split_once(CLOSE_TAG)
        .ok_or_else(|| Error::Extraction(format!("no {CLOSE_TAG} tag after {OPEN_TAG}")))?;

    let command = inner.trim();
    if command.is_empty() {
        return Err(Error::Extraction("the command between the tags is empty".to_string()));
    }
    Ok(command.to_string())
}

/// Asks the model for a shell command
pub struct CommandAdvisor {
    gateway: ModelGateway,
}

impl CommandAdvisor {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    /// Ask for a command performing `task`
    pub async fn propose(&self, task: &str) -> Result<ShellCommandPlan> {
        if task.trim().is_empty() {
            return Err(Error::Validation("describe the task to perform".to_string()));
        }

        let answer = self.gateway.complete(&command_prompt(task)).await?;
        debug!(chars = answer.len(), "Advisor answer received");

        Ok(ShellCommandPlan {
            raw_command: extract_command(&answer)?,
        })
    }
}
