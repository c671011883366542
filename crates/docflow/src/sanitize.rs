//! Helpers for sanitizing data before it enters log lines and span fields.
//!
//! Upload paths can reveal a user's directory layout, and model replies
//! or document text can be arbitrarily long. Nothing logged by the workflow
//! should carry either in full.

use std::path::Path;

/// Default character budget for free text in log lines.
pub const LOG_TEXT_LIMIT: usize = 120;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Shortens free text to at most `max_chars` characters on a char boundary
/// and flattens newlines so the result stays on one log line.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    let count = flat.chars().count();
    if count <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars).collect();
    format!("{}… ({} chars)", kept, count)
}
