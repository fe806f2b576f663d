//! Vector knowledge store: per-row documents, a flat L2 nearest-neighbor
//! index, and an atomically swapped generation of both.

pub mod document;
pub mod index;
pub mod store;

pub use index::FlatIndex;
pub use store::VectorStore;
