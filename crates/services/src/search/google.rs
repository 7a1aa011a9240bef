//! Google results through SerpAPI.

use super::{SearchBackend, SEARCH_HTTP};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use shared::research::{SearchEngine, SearchHit};
use shared::settings::SearchSettings;
use std::env;

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct GoogleSearch {
    api_key: Option<String>,
    endpoint: String,
}

impl GoogleSearch {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: SERPAPI_ENDPOINT.to_string(),
        }
    }

    /// `SERPAPI_KEY` from the environment, else the key in the config file.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        let key = env::var("SERPAPI_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| settings.serpapi_key.clone());
        Self::new(key)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl SearchBackend for GoogleSearch {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no SerpAPI key configured (set SERPAPI_KEY)"))?;
        let url = format!(
            "{}?engine=google&q={}&num={}&api_key={}",
            self.endpoint,
            urlencoding::encode(query),
            max_results,
            urlencoding::encode(key)
        );
        let resp = SEARCH_HTTP.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            // error pages are not always JSON
            let text = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<SerpResponse>(&text)
                .ok()
                .and_then(|b| b.error);
            return Err(match detail {
                Some(err) => anyhow!("SerpAPI returned {}: {}", status, err),
                None => anyhow!("SerpAPI returned {}", status),
            });
        }
        let body: SerpResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(anyhow!("SerpAPI: {}", err));
        }

        Ok(body
            .organic_results
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                engine: SearchEngine::Google,
                ai_summary: None,
            })
            .collect())
    }
}
