/// Case-insensitive substring check. An empty needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Cut a string to `max_chars` characters, appending an ellipsis if anything
/// was dropped. Counts characters, not bytes.
pub fn truncate_preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}…", &s[..byte_idx]),
    }
}

/// Format epoch milliseconds for display, e.g. "Mar 04, 2025 18:20".
pub fn format_millis(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(dt) if millis > 0 => dt.format("%b %d, %Y %H:%M").to_string(),
        _ => "unknown".to_string(),
    }
}
