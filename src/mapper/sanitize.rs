//! Filesystem-safe text for path segments.

/// Characters rejected by at least one common filesystem
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove illegal characters, then trim leading/trailing dots and spaces
pub fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == ' ').to_string()
}

/// Sanitize `value`, using `default` when nothing usable remains
pub fn sanitize_or(value: Option<&str>, default: &str) -> String {
    let sanitized = value.map(sanitize_segment).unwrap_or_default();
    if sanitized.is_empty() {
        default.to_string()
    } else {
        sanitized
    }
}
