//! Search-then-write pipeline behind a deep research request.

use crate::prompts::{error_report, research_prompt};
use anyhow::Result;
use chrono::Local;
use providers::LanguageModel;
use services::SearchBackend;
use shared::research::{DetailLevel, ResearchResults, TIMESTAMP_FORMAT};
use std::sync::Arc;

/// Aspects searched before writing, in prompt order: background, market, cases.
pub const ASPECTS: [&str; 3] = [
    "current status statistics",
    "market analysis trends",
    "case studies examples",
];

const DIGEST_RESULTS: usize = 5;

pub struct ResearchGraph {
    llm: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchBackend>,
}

impl ResearchGraph {
    pub fn new(llm: Arc<dyn LanguageModel>, search: Arc<dyn SearchBackend>) -> Self {
        Self { llm, search }
    }

    /// Digest of web results for one aspect. Never fails: errors become text.
    pub async fn search_latest_data(&self, topic: &str, aspect: &str) -> String {
        let query = format!("{} {} latest research data statistics", topic, aspect);
        match self.search.search(&query, DIGEST_RESULTS).await {
            Ok(hits) if hits.is_empty() => "No results found.".to_string(),
            Ok(hits) => hits
                .iter()
                .map(|h| h.as_prompt_text())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                tracing::warn!("search for '{}' failed: {:#}", query, e);
                format!("Search failed: {:#}", e)
            }
        }
    }

    /// Run the whole pipeline. A failure yields a result holding the error report.
    pub async fn analyze_topic(&self, topic: &str, detail: DetailLevel) -> ResearchResults {
        match self.try_analyze(topic, detail).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("research on '{}' failed: {:#}", topic, e);
                ResearchResults::new(error_report(&format!("{:#}", e)))
            }
        }
    }

    async fn try_analyze(&self, topic: &str, detail: DetailLevel) -> Result<ResearchResults> {
        let [background, market, cases] = ASPECTS;
        let background = self.search_latest_data(topic, background).await;
        let market = self.search_latest_data(topic, market).await;
        let cases = self.search_latest_data(topic, cases).await;

        let prompt = research_prompt(topic, &background, &market, &cases, detail);
        tracing::info!(model = self.llm.model_name(), "writing report for '{}'", topic);
        let content = self.llm.complete(&prompt).await?;

        Ok(ResearchResults::new(content).with_sources(vec![
            "Based on AI model analysis".to_string(),
            format!("Research time: {}", Local::now().format(TIMESTAMP_FORMAT)),
        ]))
    }
}
