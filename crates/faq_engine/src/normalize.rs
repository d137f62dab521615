/// Lowercases and trims. Used for override triggers and duplicate detection.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Splits lowercased text into runs of word characters, keeping runs of two
/// or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}
