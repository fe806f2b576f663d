//! Conversational query engine: routes each turn through the configured
//! retrieval strategy, manages per-session history, and schedules background
//! tag classification.

pub mod engine;
pub mod error;
pub mod prompts;
pub mod router;
pub mod tags;

pub use engine::ChatEngine;
pub use error::ChatError;
pub use router::{QueryRouter, FALLBACK_REPLY};
pub use tags::TagClassifier;
