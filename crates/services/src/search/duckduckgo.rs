//! DuckDuckGo's HTML endpoint, scraped. No API key needed.

use super::{SearchBackend, SEARCH_HTTP};
use crate::page_fetch::{fetch_page_summary, html_decode, strip_tags};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use shared::research::{SearchEngine, SearchHit};
use std::sync::LazyLock;

const DDG_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const PAGE_TEXT_CHARS: usize = 500;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap()
});
static SNIPPET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#).unwrap());

pub struct DuckDuckGoSearch {
    endpoint: String,
    /// Fetch the page itself when DuckDuckGo gives no snippet.
    fill_missing_snippets: bool,
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            endpoint: DDG_ENDPOINT.to_string(),
            fill_missing_snippets: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn fill_missing_snippets(mut self, enabled: bool) -> Self {
        self.fill_missing_snippets = enabled;
        self
    }
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        let resp = SEARCH_HTTP.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("DuckDuckGo returned {}", resp.status()));
        }
        let html = resp.text().await?;
        let mut hits = parse_results(&html, max_results);

        if self.fill_missing_snippets {
            for hit in hits.iter_mut().filter(|h| h.snippet.is_empty()) {
                match fetch_page_summary(&hit.url, PAGE_TEXT_CHARS).await {
                    Ok(page) => hit.snippet = page.snippet(PAGE_TEXT_CHARS),
                    Err(e) => tracing::debug!("no page text for {}: {:#}", hit.url, e),
                }
            }
        }
        Ok(hits)
    }
}

/// Pull (title, snippet, url) out of the result page.
///
/// A snippet belongs to the title link before it, so each title only looks
/// for one up to the next title link.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let titles: Vec<regex::Captures> = TITLE_RE.captures_iter(html).collect();

    titles
        .iter()
        .enumerate()
        .filter_map(|(i, cap)| {
            let whole = cap.get(0)?;
            let href = html_decode(cap.get(1)?.as_str());
            let title = strip_tags(cap.get(2)?.as_str());
            let block_end = titles
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |next| next.start());
            let snippet = SNIPPET_RE
                .captures(&html[whole.end()..block_end])
                .and_then(|c| c.get(1))
                .map(|m| strip_tags(m.as_str()))
                .unwrap_or_default();
            Some(SearchHit {
                title,
                url: resolve_redirect(&href),
                snippet,
                engine: SearchEngine::DuckDuckGo,
                ai_summary: None,
            })
        })
        .filter(|hit| !hit.title.is_empty())
        .take(max_results)
        .collect()
}

/// DuckDuckGo links go through `/l/?uddg=<encoded target>`.
fn resolve_redirect(href: &str) -> String {
    let Some(encoded) = href.split("uddg=").nth(1) else {
        return href.to_string();
    };
    let encoded = encoded.split('&').next().unwrap_or(encoded);
    urlencoding::decode(encoded)
        .map(|u| u.into_owned())
        .unwrap_or_else(|_| href.to_string())
}
