pub mod analyzer;

pub use analyzer::{split_sentences, split_words, AttentionAnalyzer};
