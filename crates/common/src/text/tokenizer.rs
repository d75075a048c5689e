//! Index-term normalization
//!
//! Lowercases, treats every non-alphanumeric character as a separator and
//! drops empty tokens. Pure and locale-independent: `char::to_lowercase`
//! applies the Unicode default case mapping.

/// Split text into lowercase index terms
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            // Lowercasing may add combining marks ('İ' -> "i\u{307}"); keep term characters only
            current.extend(ch.to_lowercase().filter(|lc| lc.is_alphanumeric()));
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Render tokens back into text accepted by [`tokenize`]
pub fn tokens_to_text(tokens: &[String]) -> String {
    tokens.join(" ")
}
