//! Shared utility functions.

/// Truncates a string to a maximum number of characters with ellipsis.
pub fn truncate_string(input: &str, max_length: usize) -> String {
    if input.chars().count() <= max_length {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_length.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Splits chat text into whitespace-separated arguments.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Formats a duration as whole seconds, rounding up, for chat replies.
pub fn format_seconds(duration: std::time::Duration) -> String {
    let secs = duration.as_millis().div_ceil(1000);
    if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}
