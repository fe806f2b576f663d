//! The engine facade: ingestion plus the per-turn pipeline.
//!
//! One turn: validate the message, verify the user, fetch-or-create the
//! conversation, route through the configured strategy, append the user and
//! assistant messages in order, and conditionally schedule a background tag
//! refresh. The reply carries wall-clock processing time.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use tabletalk_core::config::{RetrievalMode, TabletalkConfig};
use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::types::{ChatMessage, Conversation, TurnReply};
use tabletalk_ingest::{has_supported_extension, ingest_path};
use tabletalk_model::{ChatModel, EmbeddingService};
use tabletalk_relational::SqlKnowledgeStore;
use tabletalk_storage::{ConversationRepository, StoreError, UserRepository};
use tabletalk_vector::VectorStore;

use crate::error::ChatError;
use crate::router::QueryRouter;
use crate::tags::TagClassifier;

/// Conversational query engine over one knowledge base.
pub struct ChatEngine<E: EmbeddingService, M: ChatModel> {
    config: TabletalkConfig,
    vector: Arc<VectorStore<E>>,
    relational: Arc<SqlKnowledgeStore>,
    router: QueryRouter<E, M>,
    classifier: TagClassifier<M>,
    conversations: Arc<ConversationRepository>,
    users: Arc<UserRepository>,
}

impl<E: EmbeddingService + 'static, M: ChatModel + 'static> ChatEngine<E, M> {
    pub fn new(
        config: TabletalkConfig,
        vector: Arc<VectorStore<E>>,
        relational: Arc<SqlKnowledgeStore>,
        model: Arc<M>,
        conversations: Arc<ConversationRepository>,
        users: Arc<UserRepository>,
    ) -> Self {
        let router = QueryRouter::new(
            config.retrieval.mode,
            config.retrieval.top_k,
            Arc::clone(&vector),
            Arc::clone(&relational),
            Arc::clone(&model),
        );
        let classifier = TagClassifier::new(model);
        Self {
            config,
            vector,
            relational,
            router,
            classifier,
            conversations,
            users,
        }
    }

    /// Ingest a dataset file into the knowledge base for the configured mode.
    ///
    /// Rejects unsupported extensions before reading anything. A parse or
    /// materialization failure leaves the prior knowledge base intact.
    pub async fn ingest(&self, path: &Path) -> Result<()> {
        if !has_supported_extension(path) {
            return Err(TabletalkError::Parse(format!(
                "unsupported file type: {}",
                path.display()
            )));
        }

        let dataset = ingest_path(path)?;
        info!(
            dataset = %dataset.name,
            rows = dataset.row_count(),
            mode = ?self.config.retrieval.mode,
            "Ingesting dataset"
        );

        match self.config.retrieval.mode {
            RetrievalMode::Semantic => self.vector.build(&dataset).await,
            RetrievalMode::Sql => self.relational.load(&dataset).map(|_| ()),
        }
    }

    /// Whether the configured strategy can answer turns yet.
    pub fn is_ready(&self) -> bool {
        self.router.is_ready()
    }

    /// Handle one conversational turn.
    pub async fn answer_turn(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> std::result::Result<TurnReply, ChatError> {
        let start = Instant::now();

        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        // The limit counts characters, not bytes.
        let max_len = self.config.chat.max_message_len;
        if message.chars().count() > max_len {
            return Err(ChatError::MessageTooLong(max_len));
        }

        self.users
            .find_by_id(user_id)?
            .ok_or_else(|| ChatError::UserNotFound(user_id.to_string()))?;

        let conversation = self.conversations.get_or_create(session_id, user_id)?;

        let response = self.router.route(&conversation.messages, message).await?;

        self.conversations
            .append_message(session_id, &ChatMessage::user(message))?;
        self.conversations
            .append_message(session_id, &ChatMessage::assistant(&response))?;

        // Two messages were just appended; refresh tags on every interval-th
        // message, without delaying this turn's reply.
        let message_count = conversation.messages.len() + 2;
        let interval = self.config.chat.tag_update_interval;
        if interval > 0 && message_count % interval == 0 {
            self.classifier
                .spawn_update(Arc::clone(&self.conversations), session_id.to_string());
        }

        let processing_time = round2(start.elapsed().as_secs_f64());
        Ok(TurnReply {
            response,
            session_id: session_id.to_string(),
            processing_time,
        })
    }

    /// Drop a session's stored history and tags entirely.
    ///
    /// The next turn for this session id starts a brand-new record.
    pub fn reset(&self, session_id: &str) -> std::result::Result<(), ChatError> {
        match self.conversations.reset(session_id) {
            Ok(()) => {
                info!(session_id = %session_id, "Conversation reset");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                Err(ChatError::SessionNotFound(session_id.to_string()))
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Reset failed");
                Err(e.into())
            }
        }
    }

    /// Fetch a stored conversation, if any.
    pub fn conversation(
        &self,
        session_id: &str,
    ) -> std::result::Result<Option<Conversation>, ChatError> {
        Ok(self.conversations.find(session_id)?)
    }
}

fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
