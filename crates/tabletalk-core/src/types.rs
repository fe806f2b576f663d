//! Domain types shared across the Tabletalk crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Stable lowercase name used in prompts and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A conversation, keyed by a caller-supplied session identifier.
///
/// Created lazily on the first turn for an unseen session id. Exactly two
/// messages are appended per turn (user then assistant). Tags are a full
/// overwrite from the background classifier, never a merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Caller-supplied session identifier, used as the primary key.
    pub session_id: String,
    /// Owning user.
    pub user_id: String,
    /// Ordered message history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Topical tags, initially empty.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A registered user. The identifier is server-generated; email is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    /// Already-hashed credential. Hashing itself happens upstream.
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            name: None,
            company: None,
            hashed_password: hashed_password.into(),
            created_at: Utc::now(),
        }
    }
}

/// Partial update for a user profile. Only non-None fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
}

impl UserUpdate {
    /// True when the update carries nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.company.is_none()
    }
}

/// The reply for one completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub response: String,
    pub session_id: String,
    /// Wall-clock seconds spent handling the turn, rounded to two decimals.
    pub processing_time: f64,
}
