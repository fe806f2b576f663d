//! SQLite-backed persistence for conversation and user records.

pub mod db;
pub mod error;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use error::StoreError;
pub use repository::{ConversationRepository, UserRepository};
