//! CLI argument definitions for the Tabletalk application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use tabletalk_core::config::RetrievalMode;

/// Tabletalk — a conversational query engine over uploaded tabular datasets.
#[derive(Parser, Debug)]
#[command(name = "tabletalk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Retrieval strategy: semantic (vector retrieval) or sql (query translation).
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Dataset file to ingest at startup.
    #[arg(long = "dataset")]
    pub dataset: Option<PathBuf>,
}

/// clap-friendly mirror of [`RetrievalMode`].
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Semantic,
    Sql,
}

impl From<ModeArg> for RetrievalMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Semantic => RetrievalMode::Semantic,
            ModeArg::Sql => RetrievalMode::Sql,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TABLETALK_CONFIG env var > ~/.tabletalk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TABLETALK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > TABLETALK_DATA_DIR env var.
    /// Returns `None` if neither is overridden (use config default).
    pub fn resolve_data_dir(&self) -> Option<String> {
        if let Some(ref p) = self.data_dir {
            return Some(p.to_string_lossy().to_string());
        }
        std::env::var("TABLETALK_DATA_DIR").ok()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > TABLETALK_LOG_LEVEL env var.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        if let Some(ref level) = self.log_level {
            return Some(level.clone());
        }
        std::env::var("TABLETALK_LOG_LEVEL").ok()
    }

    /// Resolve the retrieval mode.
    ///
    /// Priority: --mode flag > TABLETALK_MODE env var.
    /// Returns `None` if not overridden.
    pub fn resolve_mode(&self) -> Option<RetrievalMode> {
        if let Some(mode) = self.mode {
            return Some(mode.into());
        }
        match std::env::var("TABLETALK_MODE").ok().as_deref() {
            Some("semantic") => Some(RetrievalMode::Semantic),
            Some("sql") => Some(RetrievalMode::Sql),
            _ => None,
        }
    }
}

/// Default config file path (~/.tabletalk/config.toml).
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".tabletalk").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_beats_env() {
        let args = CliArgs::parse_from(["tabletalk", "--log-level", "debug"]);
        assert_eq!(args.resolve_log_level().as_deref(), Some("debug"));
    }

    #[test]
    fn test_mode_arg_maps() {
        let args = CliArgs::parse_from(["tabletalk", "--mode", "sql"]);
        assert!(matches!(args.resolve_mode(), Some(RetrievalMode::Sql)));

        let args = CliArgs::parse_from(["tabletalk"]);
        // No flag and (in a clean environment) no env var.
        if std::env::var("TABLETALK_MODE").is_err() {
            assert!(args.resolve_mode().is_none());
        }
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::parse_from(["tabletalk", "--config", "/tmp/custom.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
    }
}
