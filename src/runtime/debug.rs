/// Truncate a string for the fixed width columns of the verbose trace.
pub fn format_str(value: &str, max_length: usize) -> String {
    if value.chars().count() <= max_length {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_length.saturating_sub(3)).collect();
    format!("{}...", kept)
}
