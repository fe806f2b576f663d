//! Repository implementations for SQLite-backed persistence.
//!
//! Provides ConversationRepository and UserRepository operating on the
//! Database struct using raw SQL.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::OptionalExtension;
use tracing::debug;

use tabletalk_core::types::{ChatMessage, Conversation, User, UserUpdate};

use crate::db::Database;
use crate::error::StoreError;

/// Repository for conversation records.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch a conversation, or create an empty one for an unseen session id.
    ///
    /// Uses INSERT OR IGNORE so two simultaneous first turns for the same
    /// session id both land on the single created record.
    pub fn get_or_create(&self, session_id: &str, user_id: &str) -> Result<Conversation, StoreError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO conversations (session_id, user_id) VALUES (?1, ?2)",
                rusqlite::params![session_id, user_id],
            )?;
            conn.query_row(
                "SELECT session_id, user_id, messages, tags, created_at
                 FROM conversations WHERE session_id = ?1",
                rusqlite::params![session_id],
                row_to_conversation,
            )
            .map_err(StoreError::from)
        })
    }

    /// Find a conversation by session id.
    pub fn find(&self, session_id: &str) -> Result<Option<Conversation>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT session_id, user_id, messages, tags, created_at
                 FROM conversations WHERE session_id = ?1",
                rusqlite::params![session_id],
                row_to_conversation,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    /// Append one message to a conversation's history.
    ///
    /// The read-modify-write runs inside a single connection lock scope, so
    /// appends from one process never interleave mid-update.
    pub fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let json: String = conn
                .query_row(
                    "SELECT messages FROM conversations WHERE session_id = ?1",
                    rusqlite::params![session_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("session {}", session_id)))?;

            let mut messages: Vec<ChatMessage> = serde_json::from_str(&json)
                .map_err(|e| StoreError::Backend(format!("corrupt message history: {}", e)))?;
            messages.push(message.clone());

            let updated = serde_json::to_string(&messages)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            conn.execute(
                "UPDATE conversations SET messages = ?1 WHERE session_id = ?2",
                rusqlite::params![updated, session_id],
            )?;
            Ok(())
        })
    }

    /// Overwrite a conversation's tags. Full replacement, never a merge.
    pub fn set_tags(&self, session_id: &str, tags: &[String]) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let json = serde_json::to_string(tags)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            let changed = conn.execute(
                "UPDATE conversations SET tags = ?1 WHERE session_id = ?2",
                rusqlite::params![json, session_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("session {}", session_id)));
            }
            debug!(session_id, ?tags, "Conversation tags updated");
            Ok(())
        })
    }

    /// Hard-delete a conversation. The next turn for this session id starts
    /// from scratch with empty history and tags.
    pub fn reset(&self, session_id: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM conversations WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?;
            if deleted == 0 {
                return Err(StoreError::NotFound(format!("session {}", session_id)));
            }
            Ok(())
        })
    }

    /// Number of stored messages for a session. Zero for unknown sessions.
    pub fn message_count(&self, session_id: &str) -> Result<usize, StoreError> {
        Ok(self
            .find(session_id)?
            .map(|c| c.messages.len())
            .unwrap_or(0))
    }

    /// All conversations owned by one user, oldest first.
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Conversation>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, user_id, messages, tags, created_at
                 FROM conversations WHERE user_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(rusqlite::params![user_id], row_to_conversation)?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

/// Repository for user records.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a user with a server-generated id.
    ///
    /// Performs a pre-create existence check on the email; the UNIQUE
    /// constraint backs it up against the concurrent-create race.
    pub fn create(
        &self,
        email: &str,
        hashed_password: &str,
        name: Option<&str>,
        company: Option<&str>,
    ) -> Result<User, StoreError> {
        if self.find_by_email(email)?.is_some() {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }

        let mut user = User::new(email, hashed_password);
        user.name = name.map(|s| s.to_string());
        user.company = company.map(|s| s.to_string());

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, company, hashed_password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.name,
                    user.company,
                    user.hashed_password,
                    user.created_at.timestamp(),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::DuplicateEmail(email.to_string())
                }
                other => StoreError::from(other),
            })?;
            Ok(())
        })?;

        Ok(user)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, name, company, hashed_password, created_at
                 FROM users WHERE id = ?1",
                rusqlite::params![id],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, name, company, hashed_password, created_at
                 FROM users WHERE email = ?1",
                rusqlite::params![email],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    /// Apply a partial profile update. Only non-None fields are written.
    pub fn update(&self, id: &str, update: &UserUpdate) -> Result<User, StoreError> {
        if !update.is_empty() {
            self.db.with_conn(|conn| {
                if let Some(ref name) = update.name {
                    conn.execute(
                        "UPDATE users SET name = ?1 WHERE id = ?2",
                        rusqlite::params![name, id],
                    )?;
                }
                if let Some(ref company) = update.company {
                    conn.execute(
                        "UPDATE users SET company = ?1 WHERE id = ?2",
                        rusqlite::params![company, id],
                    )?;
                }
                Ok(())
            })?;
        }

        self.find_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }
}

// -- Row mappers --

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let messages_json: String = row.get(2)?;
    let tags_json: String = row.get(3)?;
    let created_at: i64 = row.get(4)?;

    Ok(Conversation {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        messages: serde_json::from_str(&messages_json).unwrap_or_default(),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        created_at: Utc
            .timestamp_opt(created_at, 0)
            .single()
            .unwrap_or_else(Utc::now),
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at: i64 = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        company: row.get(3)?,
        hashed_password: row.get(4)?,
        created_at: Utc
            .timestamp_opt(created_at, 0)
            .single()
            .unwrap_or_else(Utc::now),
    })
}
