pub mod index;
pub mod math;
pub mod neighbors;

pub use index::VectorIndex;
pub use neighbors::CorpusIndex;
