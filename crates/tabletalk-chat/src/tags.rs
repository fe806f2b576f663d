//! Background tag classification.
//!
//! Tags are best-effort enrichment: classification failures are swallowed
//! and never touch the stored tags, and the task runs detached so the turn's
//! response is never delayed waiting on it.

use std::sync::Arc;

use tracing::{debug, info};

use tabletalk_model::ChatModel;
use tabletalk_storage::ConversationRepository;

use crate::prompts;

/// Upper bound on tags kept from one classification.
pub const MAX_TAGS: usize = 3;

/// Summarizes a conversation into short topical labels.
pub struct TagClassifier<M: ChatModel> {
    model: Arc<M>,
}

impl<M: ChatModel + 'static> TagClassifier<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    /// Classify a rendered history into 0-3 tags.
    ///
    /// Any failure (model outage, malformed JSON, wrong shape) yields an
    /// empty vec; it is logged and never propagated.
    pub async fn classify(&self, history: &str) -> Vec<String> {
        match self.model.complete_json(&prompts::tag_prompt(history)).await {
            Ok(value) => parse_tags(&value),
            Err(e) => {
                debug!(error = %e, "Tag classification failed");
                Vec::new()
            }
        }
    }

    /// Schedule a detached tag refresh for one session.
    ///
    /// The task refetches the latest history before classifying, so it sees
    /// messages appended after scheduling. It owns its lifetime: dropping or
    /// cancelling the caller does not cancel it. An empty classification
    /// leaves the stored tags unchanged.
    pub fn spawn_update(&self, repo: Arc<ConversationRepository>, session_id: String) {
        let model = Arc::clone(&self.model);
        tokio::spawn(async move {
            let conversation = match repo.find(&session_id) {
                Ok(Some(conversation)) => conversation,
                Ok(None) => return,
                Err(e) => {
                    debug!(session_id = %session_id, error = %e, "Tag refresh could not load session");
                    return;
                }
            };

            let classifier = TagClassifier { model };
            let history = prompts::history_text(&conversation.messages);
            let tags = classifier.classify(&history).await;
            if tags.is_empty() {
                return;
            }

            match repo.set_tags(&session_id, &tags) {
                Ok(()) => info!(session_id = %session_id, ?tags, "Conversation tags refreshed"),
                Err(e) => debug!(session_id = %session_id, error = %e, "Tag refresh could not save tags"),
            }
        });
    }
}

/// Extract up to [`MAX_TAGS`] non-empty string tags from `{"tags": [...]}`.
fn parse_tags(value: &serde_json::Value) -> Vec<String> {
    value
        .get("tags")
        .and_then(|tags| tags.as_array())
        .map(|array| {
            array
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .take(MAX_TAGS)
                .collect()
        })
        .unwrap_or_default()
}
