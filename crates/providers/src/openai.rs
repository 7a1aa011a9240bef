use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::settings::ProviderConfig;
use std::sync::LazyLock;
use std::time::Duration;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(300))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

const REFERER: &str = "https://shandu.ai";
const APP_TITLE: &str = "Shandu AI Research Assistant";
const ERROR_DETAIL_CHARS: usize = 800;

/// Ids some gateways reject, mapped to ones they accept.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("google/gemini-2.0-flash-thinking-exp", "google/gemini-pro"),
    (
        "deepseek-ai/deepseek-coder-33b-instruct",
        "deepseek-coder-33b-instruct",
    ),
    ("anthropic/claude-3-opus", "claude-3-opus"),
];

pub fn map_model_name(model: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|(from, _)| *from == model)
        .map(|(_, to)| *to)
        .unwrap_or(model)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter and any other OpenAI-compatible gateway.
pub struct OpenAIClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn from_provider(provider: &ProviderConfig, model: &str) -> Result<Self> {
        if !provider.has_key() {
            return Err(anyhow!("No API key configured for this provider"));
        }
        if provider.base_url.trim().is_empty() {
            return Err(anyhow!("No base URL configured for this provider"));
        }
        Ok(Self {
            http: SHARED_HTTP.clone(),
            api_key: provider.api_key.trim().to_string(),
            model: map_model_name(model).to_string(),
            base_url: provider.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
        };
        tracing::debug!(model = %self.model, "chat completion: POST {}", url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(ERROR_DETAIL_CHARS).collect();
            if detail.trim().is_empty() {
                return Err(anyhow!("provider error: {}", status));
            }
            return Err(anyhow!("provider error: {}\n{}", status, detail));
        }
        let body: ChatResponse = resp.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("provider returned no completion"))?;
        Ok(text)
    }
}
