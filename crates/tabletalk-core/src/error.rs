use thiserror::Error;

/// Top-level error type for the Tabletalk system.
///
/// Each variant corresponds to a failure class in the ingestion or query
/// pipeline. Subsystem crates define their own error types and implement
/// `From<SubsystemError> for TabletalkError` so that the `?` operator works
/// seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TabletalkError {
    /// Malformed upload. Aborts the whole ingestion; nothing partial is
    /// published downstream.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Parsing succeeded but the vector store could not be materialized.
    /// The previously loaded knowledge base is left untouched.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// Parsing succeeded but the relational store could not be materialized.
    /// The previously loaded table and schema are left untouched.
    #[error("Load error: {0}")]
    Load(String),

    /// A query was attempted before any successful ingestion.
    #[error("Knowledge base not initialized: {0}")]
    NotInitialized(String),

    /// A generated query failed to execute. The relational store converts
    /// this to descriptive text before it reaches the router, so this
    /// variant only surfaces from direct store usage.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// An embedding or completion call failed.
    #[error("Model error: {0}")]
    Model(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for TabletalkError {
    fn from(err: toml::de::Error) -> Self {
        TabletalkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TabletalkError {
    fn from(err: toml::ser::Error) -> Self {
        TabletalkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TabletalkError {
    fn from(err: serde_json::Error) -> Self {
        TabletalkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Tabletalk operations.
pub type Result<T> = std::result::Result<T, TabletalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabletalkError::Parse("ragged row at line 3".to_string());
        assert_eq!(err.to_string(), "Parse error: ragged row at line 3");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(TabletalkError, &str)> = vec![
            (
                TabletalkError::Parse("bad header".to_string()),
                "Parse error: bad header",
            ),
            (
                TabletalkError::IndexBuild("no documents".to_string()),
                "Index build error: no documents",
            ),
            (
                TabletalkError::Load("type conflict".to_string()),
                "Load error: type conflict",
            ),
            (
                TabletalkError::NotInitialized("upload a dataset first".to_string()),
                "Knowledge base not initialized: upload a dataset first",
            ),
            (
                TabletalkError::QueryExecution("no such column".to_string()),
                "Query execution error: no such column",
            ),
            (
                TabletalkError::Model("timeout".to_string()),
                "Model error: timeout",
            ),
            (
                TabletalkError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                TabletalkError::Config("missing field".to_string()),
                "Configuration error: missing field",
            ),
            (
                TabletalkError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabletalkError = io_err.into();
        assert!(matches!(err, TabletalkError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: TabletalkError = parsed.unwrap_err().into();
        assert!(matches!(err, TabletalkError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: TabletalkError = parsed.unwrap_err().into();
        assert!(matches!(err, TabletalkError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = TabletalkError::NotInitialized("no index".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("NotInitialized"));
        assert!(debug_str.contains("no index"));
    }
}
