//! Read-only filesystem tools

mod cwd;
mod list;
mod path_utils;
mod read;

// Re-export tools
pub use cwd::CurrentDirectory;
pub use list::ReadDirectory;
pub use read::ReadFile;

// Re-export path utilities for use by other modules
pub use path_utils::{path_to_display, resolve_path};
