use chrono::Local;

/// Keep at most `max_chars` characters of `text`. Counts chars, not bytes,
/// so multi-byte text is never split mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Today's date on the local clock, `YYYY-MM-DD`.
pub fn today_local() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
