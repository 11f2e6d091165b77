//! Conversation session
//!
//! - `TranscriptStore`: the ordered message history
//! - `TurnLoop`: reads input, runs a turn through the gateway, records the answer
//! - `InputSource` / `TurnDisplay`: the terminal collaborators a frontend provides

mod transcript;
mod turn_loop;
mod types;

pub use transcript::{Message, Role, TranscriptStore};
pub use turn_loop::{is_exit_keyword, InputSource, TurnDisplay, TurnLoop, EMPTY_INPUT_MESSAGE};
pub use types::{SessionConfig, SessionEnd, TurnState, UserInput};
