//! Chat resolution - turns any chat message into a usable response
//!
//! Wraps the parse pipeline with a timeout and the fallback policy. From
//! the caller's side resolution never fails: when the model is missing,
//! slow, or talks nonsense, the answer degrades to "show every quest".

use crate::core::error::{LedgerError, Result};
use crate::llm::client::TextGenerator;
use crate::llm::parser::{parse_chat, ChatResponse};
use crate::llm::prompt::PromptContext;
use std::sync::Arc;
use std::time::Duration;

/// Resolves chat messages through the language model
#[derive(Clone)]
pub struct ChatResolver {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl ChatResolver {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    /// A resolver with no model; every message gets the fallback
    pub fn offline() -> Self {
        Self {
            generator: None,
            timeout: Duration::from_secs(1),
        }
    }

    pub fn has_model(&self) -> bool {
        self.generator.is_some()
    }

    /// Resolve a message, falling back on any failure
    pub async fn resolve(&self, message: &str, context: &PromptContext) -> ChatResponse {
        match self.try_resolve(message, context).await {
            Ok(response) => {
                tracing::info!(action = response.json.name(), "Chat message resolved");
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat resolution failed, using fallback");
                ChatResponse::fallback()
            }
        }
    }

    /// Resolve a message, reporting the stage that failed
    pub async fn try_resolve(&self, message: &str, context: &PromptContext) -> Result<ChatResponse> {
        let generator = self
            .generator
            .as_deref()
            .ok_or_else(|| LedgerError::ModelInvocation("No language model configured".into()))?;

        tokio::time::timeout(self.timeout, parse_chat(generator, message, context))
            .await
            .map_err(|_| {
                LedgerError::ModelInvocation(format!(
                    "Model call exceeded {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
    }
}
