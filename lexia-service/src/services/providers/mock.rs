//! Mock completion provider for testing.

use super::{ChatMessage, Completion, CompletionProvider, ProviderError, Role};
use async_trait::async_trait;

/// Mock provider echoing the last user message.
pub struct MockCompletionProvider {
    enabled: bool,
}

impl MockCompletionProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock completion provider not enabled".to_string(),
            ));
        }

        // Simulate some processing
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let input_tokens: i32 = messages.iter().map(|m| m.content.len() as i32 / 4).sum();

        Ok(Completion {
            text: Some(format!("Réponse simulée pour: {}", last_user)),
            input_tokens,
            output_tokens: 10,
        })
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock completion provider not enabled".to_string(),
            ))
        }
    }
}
