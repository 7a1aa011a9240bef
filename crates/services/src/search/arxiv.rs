//! ArXiv preprint search over the Atom export API.

use super::{SearchBackend, SEARCH_HTTP, SNIPPET_CHARS};
use crate::page_fetch::{collapse_whitespace, ellipsize, html_decode};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::research::{SearchEngine, SearchHit};

const ARXIV_ENDPOINT: &str = "https://export.arxiv.org/api/query";

pub struct ArxivSearch {
    endpoint: String,
}

impl ArxivSearch {
    pub fn new() -> Self {
        Self {
            endpoint: ARXIV_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl Default for ArxivSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for ArxivSearch {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}?search_query={}&max_results={}&sortBy=relevance",
            self.endpoint,
            urlencoding::encode(&format!("all:{}", query)),
            max_results
        );
        tracing::debug!("ArXiv search URL: {}", url);
        let resp = SEARCH_HTTP.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("ArXiv returned {}", resp.status()));
        }
        let xml = resp.text().await?;
        let mut hits = parse_feed(&xml);
        hits.truncate(max_results);
        Ok(hits)
    }
}

/// Turn the Atom feed into hits: entry title, abstract page id, summary.
pub fn parse_feed(xml: &str) -> Vec<SearchHit> {
    entries(xml)
        .into_iter()
        .filter_map(|entry| {
            let url = tag_text(entry, "id")?;
            let title = collapse_whitespace(&html_decode(&tag_text(entry, "title")?));
            let summary = collapse_whitespace(&html_decode(
                &tag_text(entry, "summary").unwrap_or_default(),
            ));
            Some(SearchHit {
                title,
                url,
                snippet: ellipsize(&summary, SNIPPET_CHARS),
                engine: SearchEngine::Arxiv,
                ai_summary: None,
            })
        })
        .collect()
}

fn entries(xml: &str) -> Vec<&str> {
    const OPEN: &str = "<entry>";
    const CLOSE: &str = "</entry>";
    let mut found = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start..].find(CLOSE) else {
            break;
        };
        let end = start + len + CLOSE.len();
        found.push(&rest[start..end]);
        rest = &rest[end..];
    }
    found
}

/// Text of the first `<tag ...>text</tag>`.
fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut from = 0;
    // skip longer tags sharing the prefix, e.g. <id> vs <idx>
    loop {
        let pos = from + xml[from..].find(&open)?;
        let after = xml[pos + open.len()..].chars().next()?;
        if after == '>' || after.is_whitespace() {
            let content_start = pos + xml[pos..].find('>')? + 1;
            let content_end = content_start + xml[content_start..].find(&close)?;
            return Some(xml[content_start..content_end].trim().to_string());
        }
        from = pos + open.len();
    }
}
