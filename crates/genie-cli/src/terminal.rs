//! Terminal collaborators for the turn loop
//!
//! Line input comes from rustyline; output is styled with console and the
//! wait for the model is shown with an indicatif spinner.

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

use genie_core::session::{InputSource, TurnDisplay, UserInput};
use genie_core::tools::ToolInvocationRequest;
use genie_core::Error;

pub const THINKING_MESSAGE: &str = "🧞 The génie is thinking...";

/// Start a spinner with `message`
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Heading line, e.g. the session intro
pub fn intro(text: &str) {
    println!();
    println!("{}", style(text).bold().cyan());
    println!();
}

pub fn outro(text: &str) {
    println!();
    println!("{}", style(text).bold().cyan());
}

pub fn error_line(text: &str) {
    eprintln!("{}", style(text).red());
}

/// Ask before running an advised command. Declining or an unusable
/// terminal both count as "no".
pub fn confirm_execution() -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Do you want to execute this command?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Reads user lines with history and line editing
pub struct LineInput {
    editor: DefaultEditor,
}

impl LineInput {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl InputSource for LineInput {
    fn read_line(&mut self) -> UserInput {
        println!("{}", style("You:").bold().green());
        match self.editor.readline(&format!("{} ", style("›").dim())) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).ok();
                }
                UserInput::Line(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => UserInput::Cancelled,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                UserInput::Cancelled
            }
        }
    }
}

/// Prints the conversation to stdout
#[derive(Default)]
pub struct ConsoleDisplay {
    spinner: Option<ProgressBar>,
    verbose: bool,
}

impl ConsoleDisplay {
    pub fn new(verbose: bool) -> Self {
        Self {
            spinner: None,
            verbose,
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl TurnDisplay for ConsoleDisplay {
    fn show_seeded_message(&mut self, message: &str) {
        println!("{}", style("You:").bold().green());
        println!("{}", message);
    }

    fn input_rejected(&mut self, reason: &str) {
        println!("{}", style(reason).yellow());
    }

    fn thinking_started(&mut self) {
        self.spinner = Some(spinner(THINKING_MESSAGE));
    }

    fn answer_started(&mut self, tool_calls: &[ToolInvocationRequest]) {
        self.stop_spinner();
        if self.verbose {
            for call in tool_calls {
                println!(
                    "  {} {}",
                    style("[Used:").dim(),
                    style(format!("{}]", call.tool_name)).yellow()
                );
            }
        }
        println!("{}", style("🧞 The Génie:").bold().magenta());
    }

    fn fragment(&mut self, text: &str) {
        print!("{}", text);
        std::io::stdout().flush().ok();
    }

    fn answer_finished(&mut self) {
        println!();
        println!();
    }

    fn turn_failed(&mut self, error: &Error) {
        self.stop_spinner();
        println!();
        error_line("An error occured.");
        eprintln!("{}", style(error).dim());
    }

    fn cancelled(&mut self) {
        self.stop_spinner();
        error_line("Operation cancelled.");
    }

    fn goodbye(&mut self) {
        outro("👋 Thanks for chatting! Goodbye!");
    }
}
