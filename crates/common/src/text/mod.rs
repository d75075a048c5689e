//! Text utilities shared by indexing and prompt assembly

mod tokenizer;
mod truncate;

pub use tokenizer::{tokenize, tokens_to_text};
pub use truncate::{clean_query_for_wiki, truncate_text, TRUNCATION_MARKER};
