//! Token estimation for prompt budgeting

/// Estimate the BPE token count of prompt text.
///
/// Numbers, timestamps and selector punctuation tokenize densely (~2.5
/// chars/token); prose runs closer to ~4 chars/token.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let total = text.chars().count();
    let dense = text
        .chars()
        .filter(|c| c.is_ascii_digit() || "{}[]()=~\"'.:,_-".contains(*c))
        .count();
    let dense_fraction = (dense as f64 / total as f64 * 1.5).min(1.0);
    let chars_per_token = dense_fraction * 2.5 + (1.0 - dense_fraction) * 4.0;

    (total as f64 / chars_per_token).ceil().max(1.0) as usize
}
