//! Records produced by research and search actions.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A generated report plus the citations that back it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResults {
    pub content: String,
    pub sources: Vec<String>,
    pub timestamp: String,
}

impl ResearchResults {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn push_source(&mut self, source: impl Into<String>) {
        self.sources.push(source.into());
    }

    /// Content followed by a numbered citation list, one line per source.
    pub fn to_markdown(&self) -> String {
        let mut md = self.content.clone();
        if !self.sources.is_empty() {
            md.push_str("\n\n## Sources\n");
            for (idx, source) in self.sources.iter().enumerate() {
                md.push_str(&format!("{}. {}\n", idx + 1, source));
            }
        }
        md
    }
}

/// Default file name offered when saving a report.
pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("research_report_{}.md", at.format("%Y%m%d_%H%M%S"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    Google,
    DuckDuckGo,
    Wikipedia,
    Arxiv,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 4] = [
        SearchEngine::Google,
        SearchEngine::DuckDuckGo,
        SearchEngine::Wikipedia,
        SearchEngine::Arxiv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::DuckDuckGo => "duckduckgo",
            SearchEngine::Wikipedia => "wikipedia",
            SearchEngine::Arxiv => "arxiv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SearchEngine::Google => "Google",
            SearchEngine::DuckDuckGo => "DuckDuckGo",
            SearchEngine::Wikipedia => "Wikipedia",
            SearchEngine::Arxiv => "ArXiv",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(SearchEngine::Google),
            "duckduckgo" | "ddg" => Ok(SearchEngine::DuckDuckGo),
            "wikipedia" | "wiki" => Ok(SearchEngine::Wikipedia),
            "arxiv" => Ok(SearchEngine::Arxiv),
            other => Err(format!("unknown search engine: {}", other)),
        }
    }
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub engine: SearchEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

impl SearchHit {
    /// Plain-text form used when hits are folded into a prompt.
    pub fn as_prompt_text(&self) -> String {
        format!("Title: {}\nLink: {}\nContent: {}\n", self.title, self.url, self.snippet)
    }
}

/// Markdown rendering of a hit list, as shown in the Search tab and history.
pub fn render_hits_markdown(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!("### {}\n", hit.title));
        if let Some(summary) = hit.ai_summary.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("**AI summary:** {}\n\n", summary.trim()));
        }
        if !hit.snippet.is_empty() {
            out.push_str(&format!("{}\n\n", hit.snippet));
        }
        out.push_str(&format!("[Open source]({}) · {}\n\n", hit.url, hit.engine));
    }
    out
}

/// How much detail the report should go into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 3] = [DetailLevel::Low, DetailLevel::Medium, DetailLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Low => "low",
            DetailLevel::Medium => "medium",
            DetailLevel::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_markdown_numbers_sources_in_order() {
        let results = ResearchResults::new("Body").with_sources(vec![
            "first".into(),
            "second".into(),
            "third".into(),
        ]);
        let md = results.to_markdown();
        assert!(md.starts_with("Body\n\n## Sources\n"));
        let lines: Vec<&str> = md.lines().skip_while(|l| *l != "## Sources").skip(1).collect();
        assert_eq!(lines, vec!["1. first", "2. second", "3. third"]);
    }

    #[test]
    fn test_markdown_without_sources_is_content() {
        let results = ResearchResults::new("Only content");
        assert_eq!(results.to_markdown(), "Only content");
    }

    #[test]
    fn test_push_source_appends_line() {
        let mut results = ResearchResults::new("x").with_sources(vec!["a".into()]);
        results.push_source("Model: llama3");
        assert!(results.to_markdown().ends_with("1. a\n2. Model: llama3\n"));
    }

    #[test]
    fn test_timestamp_format() {
        let results = ResearchResults::new("x");
        assert!(chrono::NaiveDateTime::parse_from_str(&results.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_report_file_name() {
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(report_file_name(at), "research_report_20250309_140507.md");
    }

    #[test]
    fn test_engine_parse_and_serde() {
        assert_eq!("DDG".parse::<SearchEngine>(), Ok(SearchEngine::DuckDuckGo));
        assert!("bing".parse::<SearchEngine>().is_err());
        assert_eq!(serde_json::to_string(&SearchEngine::Arxiv).unwrap(), "\"arxiv\"");
    }

    #[test]
    fn test_render_hits_markdown() {
        let hits = vec![SearchHit {
            title: "Rust".into(),
            url: "https://www.rust-lang.org".into(),
            snippet: "A language".into(),
            engine: SearchEngine::Google,
            ai_summary: Some("Systems language".into()),
        }];
        let md = render_hits_markdown(&hits);
        assert!(md.contains("### Rust"));
        assert!(md.contains("**AI summary:** Systems language"));
        assert!(md.contains("[Open source](https://www.rust-lang.org) · Google"));
        assert_eq!(render_hits_markdown(&[]), "No results found.");
    }
}
