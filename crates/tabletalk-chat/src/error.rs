//! Turn-level errors surfaced to the caller.

use tabletalk_core::error::TabletalkError;
use tabletalk_storage::StoreError;
use thiserror::Error;

/// Errors from the conversational engine.
///
/// Only precondition failures reach the caller as errors: knowledge base not
/// loaded, unknown user, unknown session on reset, invalid message. Model
/// outages inside a turn degrade to a fallback answer instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("knowledge base not loaded, upload a dataset first")]
    NotReady,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("message exceeds the {0}-character limit")]
    MessageTooLong(usize),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("model error: {0}")]
    Model(String),
}

impl From<TabletalkError> for ChatError {
    fn from(err: TabletalkError) -> Self {
        match err {
            TabletalkError::NotInitialized(_) => ChatError::NotReady,
            TabletalkError::Model(msg) => ChatError::Model(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_maps_to_not_ready() {
        let err: ChatError = TabletalkError::NotInitialized("no index".to_string()).into();
        assert!(matches!(err, ChatError::NotReady));
    }

    #[test]
    fn test_model_error_keeps_message() {
        let err: ChatError = TabletalkError::Model("timeout".to_string()).into();
        assert!(matches!(err, ChatError::Model(msg) if msg == "timeout"));
    }

    #[test]
    fn test_store_error_maps_to_storage() {
        let err: ChatError = StoreError::Backend("disk full".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ChatError::SessionNotFound("abc".to_string()).to_string(),
            "session not found: abc"
        );
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds the 2000-character limit"
        );
    }
}
