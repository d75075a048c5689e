//! Character-safe truncation and query cleanup

/// Appended to text that was cut short
pub const TRUNCATION_MARKER: &str = " ...";

/// Words dropped from encyclopedia queries
const QUERY_STOPWORDS: &[&str] = &[
    "what", "about", "how", "is", "in", "the", "a", "an", "for", "on", "of", "and",
];

/// Truncate `text` to at most `max_chars` characters.
///
/// Cuts on a character boundary, preferring the last space inside the
/// budget, and appends [`TRUNCATION_MARKER`]. The marker counts toward the
/// budget; when the budget is too small to hold it the text is cut hard.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }

    let budget = max_chars - marker_len;
    let byte_end = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..byte_end];

    let cut = match head.rfind(' ') {
        Some(pos) if !head[..pos].trim_end().is_empty() => head[..pos].trim_end(),
        _ => head,
    };

    format!("{cut}{TRUNCATION_MARKER}")
}

/// Reduce a free-text topic to keywords for encyclopedia search
pub fn clean_query_for_wiki(query: &str) -> String {
    super::tokenize(query)
        .into_iter()
        .filter(|t| !QUERY_STOPWORDS.contains(&t.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
