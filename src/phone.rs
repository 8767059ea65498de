use std::path::{Path, PathBuf};

pub const SESSION_EXTENSION: &str = "session";

/// Strips `+`, parentheses, dashes and whitespace. Returns `None` unless
/// the remainder is a non-empty run of ASCII digits.
pub fn normalize(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | '(' | ')' | '-') && !c.is_whitespace())
        .collect();

    (!normalized.is_empty() && normalized.bytes().all(|b| b.is_ascii_digit())).then_some(normalized)
}

pub fn session_path(sessions_dir: &Path, normalized: &str) -> PathBuf {
    sessions_dir.join(format!("{normalized}.{SESSION_EXTENSION}"))
}
