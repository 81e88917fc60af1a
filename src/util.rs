use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Longest name Kubernetes accepts for a DNS-1123 label.
pub const MAX_METADATA_NAME_LEN: usize = 63;

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

fn invalid_label_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9\-]").expect("regex for label characters"))
}

/// Coerce `name` into a DNS-1123 label usable as a Kubernetes object name.
///
/// Lowercases, maps every other character to `-`, cuts to 63 bytes and
/// swaps a leading `-` for `a` and a trailing one for `z`.
pub fn normalize_metadata_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = invalid_label_chars().replace_all(&lowered, "-");
    let mut label = truncate_string(&replaced, MAX_METADATA_NAME_LEN);
    if label.starts_with('-') {
        label.replace_range(..1, "a");
    }
    if label.ends_with('-') {
        let last = label.len() - 1;
        label.replace_range(last.., "z");
    }
    label
}
