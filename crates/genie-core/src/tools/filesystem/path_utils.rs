//! Path helpers shared by the filesystem tools.

use std::path::{Path, PathBuf};

/// Convert a path to a display string with consistent forward slash separators.
pub fn path_to_display(path: &Path) -> String {
    // Always use forward slashes for consistent cross-platform output
    path.to_string_lossy().replace('\\', "/")
}

/// Resolve a model-supplied path against the session working directory.
///
/// Absolute paths are kept as-is; relative ones (including `.`) are joined
/// onto `workspace`. No boundary check is applied: the tools are read-only.
pub fn resolve_path(workspace: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        workspace.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_display() {
        assert_eq!(path_to_display(Path::new("src/main.rs")), "src/main.rs");

        let path_str = "src\\main.rs";
        assert_eq!(
            path_to_display(Path::new(path_str)),
            path_str.replace('\\', "/")
        );
    }

    #[test]
    fn test_resolve_relative() {
        let ws = Path::new("/work");
        assert_eq!(resolve_path(ws, "notes.txt"), PathBuf::from("/work/notes.txt"));
        assert_eq!(resolve_path(ws, "."), PathBuf::from("/work/."));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_resolve_absolute() {
        let ws = Path::new("/work");
        assert_eq!(resolve_path(ws, "/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}
