pub mod cache;
pub mod provider;

pub use cache::{CacheStats, EmbeddingCache};
pub use provider::{EmbeddingProvider, HashingEmbedder};
