use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TabletalkError};

/// Top-level configuration for the Tabletalk application.
///
/// Loaded from `~/.tabletalk/config.toml` by default. Each section
/// corresponds to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabletalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for TabletalkConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            retrieval: RetrievalConfig::default(),
            model: ModelConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl TabletalkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TabletalkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TabletalkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for SQLite databases.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.tabletalk/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Retrieval strategy. A deployment runs one or the other; the strategy is
/// chosen at startup, never negotiated per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Dense semantic retrieval over per-row documents.
    Semantic,
    /// Natural-language-to-SQL translation against the relational table.
    Sql,
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Which retrieval strategy this deployment runs.
    pub mode: RetrievalMode,
    /// Search breadth for semantic retrieval. Wide on purpose: a single
    /// address can hold many units, and duplicates collapse later.
    pub top_k: usize,
    /// Batch size for embedding calls. Throughput only; must not change
    /// results versus unbatched computation.
    pub embed_batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Semantic,
            top_k: 15,
            embed_batch_size: 100,
        }
    }
}

/// Model backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Chat completion model name.
    pub chat_model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Temperature for answer generation. Low for factual accuracy.
    pub answer_temperature: f32,
    /// Temperature for tag classification.
    pub tag_temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            answer_temperature: 0.3,
            tag_temperature: 0.1,
        }
    }
}

/// Conversation handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Schedule tag classification when the stored message count is a
    /// multiple of this value. Zero disables classification.
    pub tag_update_interval: usize,
    /// Maximum inbound message length in characters.
    pub max_message_len: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            tag_update_interval: 4,
            max_message_len: 2000,
        }
    }
}
