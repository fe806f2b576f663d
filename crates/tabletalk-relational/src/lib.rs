//! Relational knowledge store: projects ingested rows into a single SQLite
//! table and executes generated queries against it.

pub mod schema;
pub mod store;

pub use schema::SchemaDescriptor;
pub use store::SqlKnowledgeStore;
