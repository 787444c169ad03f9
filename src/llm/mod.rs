//! Language model integration: prompt, client, and response parsing

pub mod client;
pub mod parser;
pub mod prompt;

pub use client::{ApiFormat, LlmClient, TextGenerator};
pub use parser::{parse_chat, ActionIntent, ChatResponse, FALLBACK_REPLY};
pub use prompt::{build_prompt, PromptContext};
