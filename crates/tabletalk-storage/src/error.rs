//! Error type for the record stores.

use tabletalk_core::error::TabletalkError;

/// Errors from conversation and user persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An account with this email already exists.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for TabletalkError {
    fn from(err: StoreError) -> Self {
        TabletalkError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StoreError::NotFound("session abc".to_string()).to_string(),
            "not found: session abc"
        );
        assert_eq!(
            StoreError::DuplicateEmail("a@example.com".to_string()).to_string(),
            "email already registered: a@example.com"
        );
    }

    #[test]
    fn test_conversion_to_tabletalk_error() {
        let err: TabletalkError = StoreError::Backend("disk full".to_string()).into();
        assert!(matches!(err, TabletalkError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
