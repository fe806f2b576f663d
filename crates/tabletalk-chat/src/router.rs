//! The query router: one of two strategies per deployment.
//!
//! Semantic mode retrieves a context blob from the vector store and answers
//! with a single completion. Sql mode runs the translate / execute /
//! synthesize pipeline against the relational store. In both modes a model
//! failure mid-turn degrades to a fixed fallback answer rather than an error,
//! so a downstream outage never fails the caller's turn.

use std::sync::Arc;

use tracing::{debug, warn};

use tabletalk_core::config::RetrievalMode;
use tabletalk_core::types::ChatMessage;
use tabletalk_model::chat::strip_fences;
use tabletalk_model::{ChatModel, EmbeddingService};
use tabletalk_relational::SqlKnowledgeStore;
use tabletalk_vector::VectorStore;

use crate::error::ChatError;
use crate::prompts;

/// Answer returned when a model invocation fails mid-turn.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error and can't respond right now.";

/// Routes a turn through the configured retrieval strategy.
pub struct QueryRouter<E: EmbeddingService, M: ChatModel> {
    mode: RetrievalMode,
    top_k: usize,
    vector: Arc<VectorStore<E>>,
    relational: Arc<SqlKnowledgeStore>,
    model: Arc<M>,
}

impl<E: EmbeddingService, M: ChatModel> QueryRouter<E, M> {
    pub fn new(
        mode: RetrievalMode,
        top_k: usize,
        vector: Arc<VectorStore<E>>,
        relational: Arc<SqlKnowledgeStore>,
        model: Arc<M>,
    ) -> Self {
        Self {
            mode,
            top_k,
            vector,
            relational,
            model,
        }
    }

    /// Whether the configured strategy's knowledge base has been loaded.
    pub fn is_ready(&self) -> bool {
        match self.mode {
            RetrievalMode::Semantic => self.vector.is_initialized(),
            RetrievalMode::Sql => self.relational.schema().is_some(),
        }
    }

    /// Answer the latest utterance given the prior history.
    ///
    /// Returns `NotReady` when the knowledge base for the configured mode has
    /// not been loaded; every other failure inside the turn degrades to
    /// [`FALLBACK_REPLY`].
    pub async fn route(&self, history: &[ChatMessage], latest: &str) -> Result<String, ChatError> {
        match self.mode {
            RetrievalMode::Semantic => self.answer_semantic(history, latest).await,
            RetrievalMode::Sql => self.answer_sql(history, latest).await,
        }
    }

    async fn answer_semantic(
        &self,
        history: &[ChatMessage],
        latest: &str,
    ) -> Result<String, ChatError> {
        let context = match self.vector.retrieve(latest, self.top_k).await {
            Ok(context) => context,
            Err(tabletalk_core::error::TabletalkError::NotInitialized(_)) => {
                return Err(ChatError::NotReady);
            }
            Err(e) => {
                warn!(error = %e, "Context retrieval failed");
                return Ok(FALLBACK_REPLY.to_string());
            }
        };

        let system_prompt =
            prompts::semantic_answer_prompt(&prompts::history_text(history), &context, latest);
        match self.model.complete(&system_prompt, history).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = %e, "Answer completion failed");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    async fn answer_sql(
        &self,
        history: &[ChatMessage],
        latest: &str,
    ) -> Result<String, ChatError> {
        // Fail closed: without a schema there is nothing to translate
        // against, and the model must not be invoked at all.
        let Some(schema) = self.relational.schema() else {
            return Err(ChatError::NotReady);
        };

        let translate_prompt = prompts::sql_generation_prompt(
            &schema.to_prompt_text(),
            &prompts::history_text(history),
            latest,
        );
        let query = match self.model.complete(&translate_prompt, &[]).await {
            Ok(raw) => strip_fences(&raw).trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Query translation failed");
                return Ok(FALLBACK_REPLY.to_string());
            }
        };
        debug!(query = %query, "Generated query");

        // The generated query runs unvalidated; a semantically wrong or
        // malformed query comes back as an embedded error string that the
        // synthesis stage is expected to reason over. Known risk area.
        let result_text = self.relational.execute(&query);

        let synth_prompt = prompts::synthesis_prompt(latest, &query, &result_text);
        match self.model.complete(&synth_prompt, &[]).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = %e, "Answer synthesis failed");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}
