//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use dungeon_taskmaster::core::error::{LedgerError, Result};
use dungeon_taskmaster::llm::client::TextGenerator;
use std::sync::Mutex;
use std::time::Duration;

/// What the scripted model does on its next call
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    Hang(Duration),
}

/// Plays back replies in order, repeating the last one; records prompts
pub struct ScriptedModel {
    replies: Mutex<Vec<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(vec![Reply::Text(reply.into())])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.next_reply() {
            Reply::Text(text) => Ok(text),
            Reply::Fail(msg) => Err(LedgerError::ModelInvocation(msg)),
            Reply::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Ok(String::new())
            }
        }
    }
}

/// A well-formed model reply around `action`
pub fn model_reply(action: serde_json::Value, friendly_reply: &str) -> String {
    serde_json::json!({ "json": action, "friendly_reply": friendly_reply }).to_string()
}
