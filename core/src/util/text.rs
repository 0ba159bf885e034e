/// Cut `s` to at most `max` chars, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Log-friendly preview: truncated with a `...` marker when cut.
pub fn preview(s: &str, max: usize) -> String {
    let cut = truncate_chars(s, max);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}
