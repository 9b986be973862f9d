use serde::Serialize;
use std::fs;
use std::path::Path;

/// Canonical text form: `\n` line endings and a trailing newline on any
/// non-empty content.
pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, normalize_text_artifact(content))
}

/// Pretty-printed JSON with a trailing newline, so repeated saves of the same
/// value produce identical bytes.
pub fn to_json_artifact<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value).map(|json| normalize_text_artifact(&json))
}
