//! OpenAI-backed implementation of the embedding and chat capabilities.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateEmbeddingRequestArgs,
};
use async_openai::Client;
use tracing::debug;

use tabletalk_core::config::ModelConfig;
use tabletalk_core::error::TabletalkError;
use tabletalk_core::types::{ChatMessage, Role as MessageRole};

use crate::chat::{strip_fences, ChatModel};
use crate::embedding::EmbeddingService;

/// Output dimensionality of text-embedding-3-small.
const EMBEDDING_DIMENSIONS: usize = 1536;

/// Embedding and chat completion backed by the OpenAI API.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    config: ModelConfig,
}

impl OpenAiBackend {
    /// Build a backend with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(openai_config),
            config,
        }
    }

    /// Build a backend from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: ModelConfig) -> Result<Self, TabletalkError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| TabletalkError::Config("OPENAI_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key, config))
    }

    fn system_message(text: &str) -> Result<ChatCompletionRequestMessage, TabletalkError> {
        ChatCompletionRequestSystemMessageArgs::default()
            .content(text)
            .build()
            .map(Into::into)
            .map_err(|e| TabletalkError::Model(format!("request message: {}", e)))
    }

    fn to_request_message(
        message: &ChatMessage,
    ) -> Result<ChatCompletionRequestMessage, TabletalkError> {
        match message.role {
            MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(Into::into),
            MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(Into::into),
        }
        .map_err(|e| TabletalkError::Model(format!("request message: {}", e)))
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("chat_model", &self.config.chat_model)
            .field("embedding_model", &self.config.embedding_model)
            .finish()
    }
}

impl EmbeddingService for OpenAiBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, TabletalkError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| TabletalkError::Model("embedding response was empty".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, TabletalkError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Newlines degrade embedding quality on this family of models.
        let cleaned: Vec<String> = texts.iter().map(|t| t.replace('\n', " ")).collect();

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.config.embedding_model)
            .input(cleaned)
            .build()
            .map_err(|e| TabletalkError::Model(format!("embedding request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| TabletalkError::Model(format!("embedding call failed: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        debug!(count = data.len(), "Embedded batch");
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

impl ChatModel for OpenAiBackend {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, TabletalkError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Self::system_message(system_prompt)?);
        for message in history {
            messages.push(Self::to_request_message(message)?);
        }

        let request = CreateChatCompletionRequest {
            model: self.config.chat_model.clone(),
            messages,
            temperature: Some(self.config.answer_temperature),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TabletalkError::Model(format!("completion call failed: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| TabletalkError::Model("completion returned no content".to_string()))
    }

    async fn complete_json(&self, prompt: &str) -> Result<serde_json::Value, TabletalkError> {
        let request = CreateChatCompletionRequest {
            model: self.config.chat_model.clone(),
            messages: vec![Self::system_message(prompt)?],
            temperature: Some(self.config.tag_temperature),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TabletalkError::Model(format!("completion call failed: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TabletalkError::Model("completion returned no content".to_string()))?;

        serde_json::from_str(strip_fences(&content))
            .map_err(|e| TabletalkError::Model(format!("completion is not valid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestUserMessageContent;

    #[test]
    fn test_from_env_without_key() {
        // Only meaningful when the variable is absent in the test environment.
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(OpenAiBackend::from_env(ModelConfig::default()).is_err());
        }
    }

    #[test]
    fn test_system_message_variant() {
        let msg = OpenAiBackend::system_message("be helpful").unwrap();
        assert!(matches!(msg, ChatCompletionRequestMessage::System(_)));
    }

    #[test]
    fn test_to_request_message_roles() {
        let user = OpenAiBackend::to_request_message(&ChatMessage::user("hi")).unwrap();
        match user {
            ChatCompletionRequestMessage::User(inner) => match inner.content {
                Some(ChatCompletionRequestUserMessageContent::Text(text)) => {
                    assert_eq!(text, "hi")
                }
                other => panic!("unexpected content shape: {:?}", other),
            },
            other => panic!("unexpected message variant: {:?}", other),
        }

        let assistant =
            OpenAiBackend::to_request_message(&ChatMessage::assistant("hello")).unwrap();
        match assistant {
            ChatCompletionRequestMessage::Assistant(inner) => {
                assert_eq!(inner.content.as_deref(), Some("hello"));
            }
            other => panic!("unexpected message variant: {:?}", other),
        }
    }

    #[test]
    fn test_debug_omits_client() {
        let backend = OpenAiBackend::new("sk-test", ModelConfig::default());
        let debug = format!("{:?}", backend);
        assert!(debug.contains("gpt-4o-mini"));
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_dimensions() {
        let backend = OpenAiBackend::new("sk-test", ModelConfig::default());
        assert_eq!(EmbeddingService::dimensions(&backend), 1536);
    }
}
