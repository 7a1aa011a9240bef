//! Fetch a web page and boil it down to title, description and leading text.

use anyhow::{anyhow, Result};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; Shandu/0.1; +https://shandu.ai)";
const PAGE_TIMEOUT: Duration = Duration::from_secs(5);
const TEXT_WIDTH: usize = 200;

static PAGE_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(PAGE_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
});

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").unwrap());
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)([a-z:_-]+)\s*=\s*["']([^"']*)["']"#).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text: String,
}

impl PageSummary {
    /// Best single snippet: the meta description, else the leading text,
    /// else the page title.
    pub fn snippet(&self, max_chars: usize) -> String {
        let best = [
            self.description.as_deref(),
            Some(self.text.as_str()),
            self.title.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default();
        truncate_chars(best, max_chars)
    }
}

pub async fn fetch_page_summary(url: &str, max_text_chars: usize) -> Result<PageSummary> {
    let resp = PAGE_HTTP.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("{} returned {}", url, resp.status()));
    }
    let html = resp.text().await?;
    Ok(summarize_html(&html, max_text_chars))
}

pub fn summarize_html(html: &str, max_text_chars: usize) -> PageSummary {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH);
    PageSummary {
        title: extract_title(html),
        description: extract_meta_description(html),
        text: truncate_chars(&collapse_whitespace(&text), max_text_chars),
    }
}

pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(&html_decode(m.as_str())))
        .filter(|t| !t.is_empty())
}

/// `<meta name="description">` or `<meta property="og:description">`.
pub fn extract_meta_description(html: &str) -> Option<String> {
    for tag in META_RE.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            let name = attr[1].to_lowercase();
            let value = attr[2].to_string();
            match name.as_str() {
                "name" | "property" => key = Some(value.to_lowercase()),
                "content" => content = Some(value),
                _ => {}
            }
        }
        if matches!(key.as_deref(), Some("description") | Some("og:description")) {
            if let Some(c) = content.filter(|c| !c.trim().is_empty()) {
                return Some(html_decode(c.trim()));
            }
        }
    }
    None
}

/// Remove markup from a fragment, e.g. search-result snippets with `<span>` highlights.
pub fn strip_tags(fragment: &str) -> String {
    collapse_whitespace(&html_decode(&TAG_RE.replace_all(fragment, "")))
}

/// `&amp;` goes last so escaped entities like `&amp;lt;` decode only once.
pub fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate and mark the cut with `...`, as result snippets are shown.
pub fn ellipsize(s: &str, max: usize) -> String {
    format!("{}...", truncate_chars(s, max))
}
