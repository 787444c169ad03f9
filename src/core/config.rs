//! Server and model configuration
//!
//! Values are layered: documented defaults, then an optional TOML file, then
//! environment variables. Command-line flags are applied last by `main`.

use crate::core::error::{LedgerError, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration for the HTTP server and the language model
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // === SERVER ===
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Upper bound for any single HTTP request, in seconds
    ///
    /// Must exceed `llm_timeout_secs`, otherwise a slow model call is cut off
    /// by the server before the fallback can answer.
    pub request_timeout_secs: u64,

    // === LANGUAGE MODEL ===
    /// API key; without one the chat endpoint always answers with the fallback
    pub llm_api_key: Option<String>,

    /// Endpoint URL. The request format is picked from the host name.
    pub llm_api_url: String,

    /// Model name sent to the provider
    pub llm_model: String,

    /// Timeout for one model call, in seconds
    pub llm_timeout_secs: u64,

    /// Output token cap for one model call
    pub llm_max_tokens: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            request_timeout_secs: 60,

            llm_api_key: None,
            llm_api_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            llm_model: "gemini-1.5-flash".into(),
            llm_timeout_secs: 30,
            llm_max_tokens: 1024,
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Apply environment overrides through `lookup`
    ///
    /// `LLM_API_KEY` wins over `GEMINI_API_KEY` when both are set.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            if !key.trim().is_empty() {
                self.llm_api_key = Some(key);
            }
        }
        if let Some(url) = lookup("LLM_API_URL") {
            self.llm_api_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm_model = model;
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| LedgerError::Config(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(secs) = lookup("LLM_TIMEOUT_SECS") {
            self.llm_timeout_secs = secs.parse().map_err(|_| {
                LedgerError::Config(format!("LLM_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        Ok(())
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.llm_timeout_secs == 0 {
            return Err(LedgerError::Config("llm_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs <= self.llm_timeout_secs {
            return Err(LedgerError::Config(format!(
                "request_timeout_secs ({}) should be > llm_timeout_secs ({})",
                self.request_timeout_secs, self.llm_timeout_secs
            )));
        }
        if self.llm_api_url.trim().is_empty() {
            return Err(LedgerError::Config("llm_api_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
