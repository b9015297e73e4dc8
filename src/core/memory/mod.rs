use crate::core::entities::MemorySnippet;
use std::path::Path;
use tracing::debug;

/// Subdirectory of the state dir holding dated decision records.
const DECISIONS_DIR: &str = "decisions";

/// Standalone snippet files picked up from the state dir root.
const STANDALONE_FILES: [&str; 2] = ["patterns.md", "learnings.md"];

/// Load recent grounding snippets from the project state directory.
///
/// Decision records are read from `<state_dir>/decisions/`, newest first by
/// file name (records carry date-stamped names), capped at `limit`; the
/// standalone `patterns.md` / `learnings.md` files are appended when
/// present. The content is opaque text; no schema is imposed. A missing or
/// unreadable state directory yields an empty list, never an error.
pub fn load_memory(state_dir: &Path, limit: usize) -> Vec<MemorySnippet> {
    let mut snippets = Vec::new();

    let decisions = state_dir.join(DECISIONS_DIR);
    match std::fs::read_dir(&decisions) {
        Ok(entries) => {
            let mut files: Vec<_> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            files.sort();
            files.reverse();
            for path in files.into_iter().take(limit) {
                if let Some(snippet) = read_snippet(&path) {
                    snippets.push(snippet);
                }
            }
        }
        Err(err) => {
            debug!(path = %decisions.display(), %err, "no decision records loaded");
        }
    }

    for name in STANDALONE_FILES {
        let path = state_dir.join(name);
        if path.is_file() {
            if let Some(snippet) = read_snippet(&path) {
                snippets.push(snippet);
            }
        }
    }

    snippets
}

fn read_snippet(path: &Path) -> Option<MemorySnippet> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %path.display(), %err, "skipping unreadable memory file");
            return None;
        }
    };
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Some(MemorySnippet {
        label,
        content: trimmed.to_string(),
    })
}
