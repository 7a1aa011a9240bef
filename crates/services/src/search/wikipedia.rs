//! Wikipedia full-text search via the MediaWiki API.

use super::{SearchBackend, SEARCH_HTTP, SNIPPET_CHARS};
use crate::page_fetch::{ellipsize, strip_tags};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use shared::research::{SearchEngine, SearchHit};

#[derive(Debug, Deserialize)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
    #[serde(default)]
    error: Option<WikiError>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct WikiError {
    #[serde(default)]
    info: String,
}

pub struct WikipediaSearch {
    lang: String,
    endpoint: String,
}

impl WikipediaSearch {
    pub fn new(lang: &str) -> Self {
        let lang = if lang.trim().is_empty() { "en" } else { lang.trim() };
        Self {
            lang: lang.to_string(),
            endpoint: format!("https://{}.wikipedia.org/w/api.php", lang),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn article_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.lang,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }
}

#[async_trait]
impl SearchBackend for WikipediaSearch {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}?action=query&list=search&format=json&utf8=1&srlimit={}&srsearch={}",
            self.endpoint,
            max_results,
            urlencoding::encode(query)
        );
        let resp = SEARCH_HTTP.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("Wikipedia returned {}", resp.status()));
        }
        let body: WikiResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(anyhow!("Wikipedia: {}", err.info));
        }

        let pages = body.query.map(|q| q.search).unwrap_or_default();
        Ok(pages
            .into_iter()
            .take(max_results)
            .map(|page| SearchHit {
                url: self.article_url(&page.title),
                snippet: ellipsize(&strip_tags(&page.snippet), SNIPPET_CHARS),
                title: page.title,
                engine: SearchEngine::Wikipedia,
                ai_summary: None,
            })
            .collect())
    }
}
