//! Entry point for the two user actions: deep research and multi-engine search.

use crate::prompts::{direct_prompt, summary_prompt};
use crate::research_graph::ResearchGraph;
use providers::{LanguageModel, ProviderKind, ProviderRouter};
use services::search::DuckDuckGoSearch;
use services::{SearchBackend, SearchOutcome, SearchService, WebSearch};
use shared::research::{DetailLevel, ResearchResults, SearchEngine};
use shared::settings::ResearchConfig;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("Please enter a research topic")]
    EmptyQuery,
    #[error("Please select at least one search engine")]
    NoEngines,
    #[error("Please configure an API key for {0} first")]
    MissingApiKey(String),
    #[error("No model selected for {0}")]
    NoModel(String),
    #[error(transparent)]
    Generation(#[from] anyhow::Error),
}

pub struct DeepResearcher {
    provider: String,
    kind: ProviderKind,
    has_key: bool,
    llm: Arc<dyn LanguageModel>,
    search: Arc<SearchService>,
    web: Arc<dyn SearchBackend>,
}

impl DeepResearcher {
    /// Wire the active provider, selected model and search engines from config.
    pub fn from_config(config: &ResearchConfig) -> Self {
        let (provider, provider_config) = config.active();
        let model = config.current_model().unwrap_or_default();
        let has_key = provider_config.has_key();
        let router = ProviderRouter::new(&provider, provider_config, &model);

        let search = SearchService::from_settings(&config.search);
        let web = search.web_search().unwrap_or_else(|| {
            WebSearch::new(
                search.backend(SearchEngine::Google),
                Arc::new(DuckDuckGoSearch::new()),
            )
        });

        Self {
            kind: router.kind(),
            provider,
            has_key,
            llm: Arc::new(router),
            search: Arc::new(search),
            web: Arc::new(web),
        }
    }

    pub fn new(
        provider: &str,
        has_key: bool,
        llm: Arc<dyn LanguageModel>,
        search: Arc<SearchService>,
        web: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            kind: ProviderKind::for_name(provider),
            has_key,
            llm,
            search,
            web,
        }
    }

    pub fn model(&self) -> &str {
        self.llm.model_name()
    }

    fn check_ready(&self) -> Result<(), ResearchError> {
        if self.kind == ProviderKind::OpenAiCompatible && !self.has_key {
            return Err(ResearchError::MissingApiKey(self.provider.clone()));
        }
        if self.llm.model_name().trim().is_empty() {
            return Err(ResearchError::NoModel(self.provider.clone()));
        }
        Ok(())
    }

    /// Produce a Markdown research report on `query`.
    ///
    /// Local models answer directly. Remote models go through the
    /// search-then-write [`ResearchGraph`], whose failures come back as an
    /// error report rather than an `Err`.
    pub async fn research(
        &self,
        query: &str,
        detail: DetailLevel,
    ) -> Result<ResearchResults, ResearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        self.check_ready()?;
        tracing::info!(
            provider = %self.provider,
            model = self.model(),
            detail = detail.as_str(),
            "starting research on '{}'",
            query
        );

        let mut results = match self.kind {
            ProviderKind::Local => {
                let text = self.llm.complete(&direct_prompt(query, detail)).await?;
                ResearchResults::new(text)
            }
            ProviderKind::OpenAiCompatible => {
                ResearchGraph::new(self.llm.clone(), self.web.clone())
                    .analyze_topic(query, detail)
                    .await
            }
        };
        results.push_source(format!("Model: {}", self.model()));
        Ok(results)
    }

    /// Search the chosen engines; optionally let a local model summarize each hit.
    pub async fn search(
        &self,
        query: &str,
        engines: &[SearchEngine],
        max_results: usize,
        summarize: bool,
    ) -> Result<SearchOutcome, ResearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        if engines.is_empty() {
            return Err(ResearchError::NoEngines);
        }

        let mut outcome = self.search.search(query, engines, max_results).await;

        if summarize && self.kind == ProviderKind::Local && !self.model().is_empty() {
            for hit in outcome.hits.iter_mut() {
                match self.llm.complete(&summary_prompt(&hit.snippet)).await {
                    Ok(summary) => hit.ai_summary = Some(summary),
                    Err(e) => tracing::warn!("summary for '{}' failed: {:#}", hit.title, e),
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research_graph::tests::{RecordingSearch, ScriptedModel};

    fn researcher(
        provider: &str,
        has_key: bool,
        model: Arc<ScriptedModel>,
        web: Arc<RecordingSearch>,
    ) -> DeepResearcher {
        let service = SearchService::empty().with_backend(SearchEngine::DuckDuckGo, web.clone());
        DeepResearcher::new(provider, has_key, model, Arc::new(service), web)
    }

    #[tokio::test]
    async fn test_research_rejects_empty_query() {
        let r = researcher("OpenRouter", true, ScriptedModel::ok("x"), RecordingSearch::new(false));
        assert!(matches!(
            r.research("   ", DetailLevel::Medium).await,
            Err(ResearchError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_research_requires_key_for_remote_provider() {
        let r = researcher("OpenRouter", false, ScriptedModel::ok("x"), RecordingSearch::new(false));
        let err = r.research("topic", DetailLevel::Medium).await.unwrap_err();
        assert!(matches!(err, ResearchError::MissingApiKey(ref p) if p == "OpenRouter"));
    }

    #[tokio::test]
    async fn test_ollama_research_skips_search_and_key() {
        let search = RecordingSearch::new(false);
        let model = ScriptedModel::ok("local answer");
        let r = researcher("Ollama", false, model.clone(), search.clone());

        let results = r.research("topic", DetailLevel::Low).await.unwrap();

        assert_eq!(results.content, "local answer");
        assert_eq!(results.sources, vec!["Model: scripted".to_string()]);
        assert!(search.queries.lock().is_empty());
        assert!(model.prompts.lock()[0].contains("\"topic\""));
    }

    #[tokio::test]
    async fn test_ollama_research_error_is_returned() {
        let r = researcher(
            "Ollama",
            false,
            ScriptedModel::failing("connection refused"),
            RecordingSearch::new(false),
        );
        let err = r.research("topic", DetailLevel::Low).await.unwrap_err();
        assert!(matches!(err, ResearchError::Generation(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_remote_research_cites_model_last() {
        let search = RecordingSearch::new(false);
        let r = researcher("OpenRouter", true, ScriptedModel::ok("report"), search.clone());

        let results = r.research("topic", DetailLevel::High).await.unwrap();

        assert_eq!(results.sources.len(), 3);
        assert_eq!(results.sources[2], "Model: scripted");
        assert_eq!(search.queries.lock().len(), 3);
        assert!(results.to_markdown().contains("3. Model: scripted"));
    }

    #[tokio::test]
    async fn test_search_adds_local_summaries() {
        let r = researcher("Ollama", false, ScriptedModel::ok("short"), RecordingSearch::new(false));
        let outcome = r
            .search("rust", &[SearchEngine::DuckDuckGo], 5, true)
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].ai_summary.as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_failed_summary_keeps_hit() {
        let model = ScriptedModel::failing("model crashed");
        let r = researcher("Ollama", false, model.clone(), RecordingSearch::new(false));
        let outcome = r
            .search("rust", &[SearchEngine::DuckDuckGo], 5, true)
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].snippet, "figures");
        assert_eq!(outcome.hits[0].ai_summary, None);
        assert!(outcome.warnings.is_empty());
        assert_eq!(model.prompts.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_search_without_summaries_for_remote_provider() {
        let model = ScriptedModel::ok("short");
        let r = researcher("OpenRouter", true, model.clone(), RecordingSearch::new(false));
        let outcome = r
            .search("rust", &[SearchEngine::DuckDuckGo, SearchEngine::Arxiv], 5, true)
            .await
            .unwrap();
        assert_eq!(outcome.hits[0].ai_summary, None);
        assert_eq!(outcome.warnings, vec!["ArXiv search is not available"]);
        assert!(model.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_search_needs_an_engine() {
        let r = researcher("Ollama", false, ScriptedModel::ok("x"), RecordingSearch::new(false));
        assert!(matches!(
            r.search("rust", &[], 5, false).await,
            Err(ResearchError::NoEngines)
        ));
    }
}
