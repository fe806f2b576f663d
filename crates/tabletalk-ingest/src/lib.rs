//! Tabular ingestion: parses an uploaded delimited dataset into normalized
//! rows.
//!
//! This is the leaf of the ingestion pipeline. A malformed file aborts the
//! whole ingestion; partial row sets are never published downstream.

pub mod dataset;
pub mod reader;

pub use dataset::Dataset;
pub use reader::{has_supported_extension, ingest_path, ingest_reader};
