//! Opaque model capabilities consumed by the rest of the system.
//!
//! Two seams: text embedding (for the vector knowledge store) and chat
//! completion (for the query router and tag classifier). Both are traits
//! with an OpenAI-backed production implementation and deterministic mocks
//! for tests.

pub mod chat;
pub mod embedding;
pub mod openai;

pub use chat::{ChatModel, DynChatModel, MockChatModel};
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding};
pub use openai::OpenAiBackend;
