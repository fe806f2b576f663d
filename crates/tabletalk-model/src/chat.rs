//! Chat completion trait and the scripted mock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tabletalk_core::error::TabletalkError;
use tabletalk_core::types::ChatMessage;

/// A chat completion capability.
///
/// `complete` takes a system prompt plus prior conversation messages and
/// returns the model's text. `complete_json` is the structured variant used
/// for tag extraction; implementations are expected to return a parsed JSON
/// object or fail with a `Model` error.
pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<String, TabletalkError>> + Send;

    fn complete_json(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, TabletalkError>> + Send;
}

/// Object-safe version of [`ChatModel`] for dynamic dispatch, mirroring
/// [`crate::embedding::DynEmbeddingService`]. A blanket implementation
/// covers every `ChatModel`.
pub trait DynChatModel: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        system_prompt: &'a str,
        history: &'a [ChatMessage],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, TabletalkError>> + Send + 'a>,
    >;

    fn complete_json_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<serde_json::Value, TabletalkError>>
                + Send
                + 'a,
        >,
    >;
}

impl<T: ChatModel> DynChatModel for T {
    fn complete_boxed<'a>(
        &'a self,
        system_prompt: &'a str,
        history: &'a [ChatMessage],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, TabletalkError>> + Send + 'a>,
    > {
        Box::pin(self.complete(system_prompt, history))
    }

    fn complete_json_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<serde_json::Value, TabletalkError>>
                + Send
                + 'a,
        >,
    > {
        Box::pin(self.complete_json(prompt))
    }
}

/// Strip markdown code fences a model may wrap around JSON or SQL output.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language marker on the opening fence line.
    let inner = match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ---------------------------------------------------------------------------
// MockChatModel - scripted replies for testing
// ---------------------------------------------------------------------------

/// Scripted chat model for tests.
///
/// Replies are popped from a queue (front first); when the queue runs dry,
/// a fixed fallback is returned. Every call is counted, which lets tests
/// assert fail-closed paths never reach the model. An error flag makes all
/// calls fail, for exercising the degraded-answer path.
#[derive(Debug, Default)]
pub struct MockChatModel {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail: bool,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with a `Model` error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Queue replies to return in order.
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Total completion calls made (text and JSON combined).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> String {
        self.replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop())
            .unwrap_or_else(|| "mock reply".to_string())
    }
}

impl ChatModel for MockChatModel {
    async fn complete(
        &self,
        _system_prompt: &str,
        _history: &[ChatMessage],
    ) -> Result<String, TabletalkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TabletalkError::Model("mock failure".to_string()));
        }
        Ok(self.next_reply())
    }

    async fn complete_json(&self, _prompt: &str) -> Result<serde_json::Value, TabletalkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TabletalkError::Model("mock failure".to_string()));
        }
        let reply = self.next_reply();
        serde_json::from_str(strip_fences(&reply))
            .map_err(|e| TabletalkError::Model(format!("mock reply is not JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replies_in_order() {
        let model = MockChatModel::with_replies(&["first", "second"]);
        assert_eq!(model.complete("sys", &[]).await.unwrap(), "first");
        assert_eq!(model.complete("sys", &[]).await.unwrap(), "second");
        // Queue exhausted: fixed fallback.
        assert_eq!(model.complete("sys", &[]).await.unwrap(), "mock reply");
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let model = MockChatModel::new();
        assert_eq!(model.call_count(), 0);
        model.complete("sys", &[]).await.unwrap();
        let _ = model.complete_json("{}").await;
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let model = MockChatModel::failing();
        assert!(model.complete("sys", &[]).await.is_err());
        assert!(model.complete_json("prompt").await.is_err());
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_json_parses_object() {
        let model = MockChatModel::with_replies(&[r#"{"tags": ["Pricing"]}"#]);
        let value = model.complete_json("prompt").await.unwrap();
        assert_eq!(value["tags"][0], "Pricing");
    }

    #[tokio::test]
    async fn test_mock_json_rejects_non_json() {
        let model = MockChatModel::with_replies(&["not json at all"]);
        assert!(model.complete_json("prompt").await.is_err());
    }

    #[test]
    fn test_strip_fences_plain_text() {
        assert_eq!(strip_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_fences("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_strip_fences_with_language() {
        let fenced = "```sql\nSELECT Rent FROM listings\n```";
        assert_eq!(strip_fences(fenced), "SELECT Rent FROM listings");
    }

    #[test]
    fn test_strip_fences_json() {
        let fenced = "```json\n{\"tags\": []}\n```";
        assert_eq!(strip_fences(fenced), "{\"tags\": []}");
    }

    #[test]
    fn test_strip_fences_bare_fence() {
        let fenced = "```\nhello\n```";
        assert_eq!(strip_fences(fenced), "hello");
    }

    #[tokio::test]
    async fn test_mock_json_strips_fences() {
        let model = MockChatModel::with_replies(&["```json\n{\"tags\": [\"A\"]}\n```"]);
        let value = model.complete_json("prompt").await.unwrap();
        assert_eq!(value["tags"][0], "A");
    }

    #[tokio::test]
    async fn test_dyn_chat_model_via_box() {
        let boxed: Box<dyn DynChatModel> = Box::new(MockChatModel::with_replies(&["boxed"]));
        let reply = boxed.complete_boxed("sys", &[]).await.unwrap();
        assert_eq!(reply, "boxed");
    }
}
