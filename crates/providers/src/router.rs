use crate::ollama::OllamaClient;
use crate::openai::OpenAIClient;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::agent_api::ChatMessage;
use shared::settings::{ProviderConfig, OLLAMA};

/// Anything that can turn a prompt into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable model id, used in citations.
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Local Ollama server.
    Local,
    /// Any gateway speaking the OpenAI chat-completions API (OpenRouter by default).
    OpenAiCompatible,
}

impl ProviderKind {
    pub fn for_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(OLLAMA) {
            ProviderKind::Local
        } else {
            ProviderKind::OpenAiCompatible
        }
    }
}

pub struct ProviderRouter {
    name: String,
    config: ProviderConfig,
    model: String,
}

impl ProviderRouter {
    pub fn new(name: &str, config: ProviderConfig, model: &str) -> Self {
        Self {
            name: name.to_string(),
            config,
            model: model.to_string(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        ProviderKind::for_name(&self.name)
    }

    pub fn ollama(&self) -> Option<OllamaClient> {
        match self.kind() {
            ProviderKind::Local => Some(OllamaClient::new(Some(&self.config.base_url))),
            ProviderKind::OpenAiCompatible => None,
        }
    }
}

#[async_trait]
impl LanguageModel for ProviderRouter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("No model selected for {}", self.name));
        }
        match self.kind() {
            ProviderKind::Local => {
                let client = OllamaClient::new(Some(&self.config.base_url));
                Ok(client.generate(&self.model, prompt).await?)
            }
            ProviderKind::OpenAiCompatible => {
                let client = OpenAIClient::from_provider(&self.config, &self.model)?;
                client.generate(&[ChatMessage::user(prompt)]).await
            }
        }
    }
}
