//! Web, encyclopedia and preprint search.
//!
//! Every engine sits behind [`SearchBackend`]. [`SearchService`] runs the
//! engines a user picked one after another and keeps going when one fails;
//! [`WebSearch`] is the Google-then-DuckDuckGo chain the research graph uses.

pub mod arxiv;
pub mod duckduckgo;
pub mod google;
pub mod wikipedia;

pub use arxiv::ArxivSearch;
pub use duckduckgo::DuckDuckGoSearch;
pub use google::GoogleSearch;
pub use wikipedia::WikipediaSearch;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use shared::research::{SearchEngine, SearchHit};
use shared::settings::SearchSettings;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::page_fetch::USER_AGENT;

pub(crate) const SNIPPET_CHARS: usize = 200;

pub(crate) static SEARCH_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
});

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// Hits from every engine that answered, plus one warning per engine that did not.
#[derive(Debug, Default, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub warnings: Vec<String>,
}

pub struct SearchService {
    backends: HashMap<SearchEngine, Arc<dyn SearchBackend>>,
}

impl SearchService {
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// All four engines, configured from the settings file and environment.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::empty()
            .with_backend(
                SearchEngine::Google,
                Arc::new(GoogleSearch::from_settings(settings)),
            )
            .with_backend(SearchEngine::DuckDuckGo, Arc::new(DuckDuckGoSearch::new()))
            .with_backend(
                SearchEngine::Wikipedia,
                Arc::new(WikipediaSearch::new(&settings.wikipedia_lang)),
            )
            .with_backend(SearchEngine::Arxiv, Arc::new(ArxivSearch::new()))
    }

    pub fn with_backend(mut self, engine: SearchEngine, backend: Arc<dyn SearchBackend>) -> Self {
        self.backends.insert(engine, backend);
        self
    }

    pub fn backend(&self, engine: SearchEngine) -> Option<Arc<dyn SearchBackend>> {
        self.backends.get(&engine).cloned()
    }

    /// Query each engine in order. Failures become warnings, never errors.
    pub async fn search(
        &self,
        query: &str,
        engines: &[SearchEngine],
        max_results: usize,
    ) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut done: Vec<SearchEngine> = Vec::new();

        for engine in engines {
            if done.contains(engine) {
                continue;
            }
            done.push(*engine);

            let Some(backend) = self.backends.get(engine) else {
                outcome
                    .warnings
                    .push(format!("{} search is not available", engine));
                continue;
            };

            match backend.search(query, max_results).await {
                Ok(mut hits) => {
                    hits.truncate(max_results);
                    tracing::info!(engine = engine.as_str(), count = hits.len(), "search done");
                    outcome.hits.extend(hits);
                }
                Err(e) => {
                    tracing::warn!(engine = engine.as_str(), "search failed: {:#}", e);
                    outcome
                        .warnings
                        .push(format!("{} search failed: {:#}", engine, e));
                }
            }
        }

        outcome
    }

    /// Google first, DuckDuckGo when Google errors or comes back empty.
    pub fn web_search(&self) -> Option<WebSearch> {
        let fallback = self.backend(SearchEngine::DuckDuckGo)?;
        Some(WebSearch {
            primary: self.backend(SearchEngine::Google),
            fallback,
        })
    }
}

pub struct WebSearch {
    primary: Option<Arc<dyn SearchBackend>>,
    fallback: Arc<dyn SearchBackend>,
}

impl WebSearch {
    pub fn new(primary: Option<Arc<dyn SearchBackend>>, fallback: Arc<dyn SearchBackend>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SearchBackend for WebSearch {
    fn name(&self) -> &'static str {
        "web"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if let Some(primary) = &self.primary {
            match primary.search(query, max_results).await {
                Ok(hits) if !hits.is_empty() => return Ok(hits),
                Ok(_) => tracing::debug!("{} returned nothing, falling back", primary.name()),
                Err(e) => tracing::debug!("{} failed, falling back: {:#}", primary.name(), e),
            }
        }
        self.fallback.search(query, max_results).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::thread::JoinHandle;

    pub(crate) struct Canned {
        pub name: &'static str,
        pub engine: SearchEngine,
        pub titles: Vec<&'static str>,
        pub fail: bool,
    }

    #[async_trait]
    impl SearchBackend for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            if self.fail {
                return Err(anyhow!("{} is down", self.name));
            }
            Ok(self
                .titles
                .iter()
                .map(|t| SearchHit {
                    title: t.to_string(),
                    url: format!("https://example.com/{}", t),
                    snippet: String::new(),
                    engine: self.engine,
                    ai_summary: None,
                })
                .collect())
        }
    }

    /// Local server on a free port, with its base URL.
    pub(crate) fn bind_local() -> (tiny_http::Server, String) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        (server, format!("http://127.0.0.1:{}", port))
    }

    /// Answer one request per `(status, body)` in order; yields the request paths.
    pub(crate) fn serve_sequence(
        server: tiny_http::Server,
        responses: Vec<(u16, String)>,
    ) -> JoinHandle<Vec<String>> {
        std::thread::spawn(move || {
            let mut paths = Vec::new();
            for (status, body) in responses {
                let request = server.recv().unwrap();
                paths.push(request.url().to_string());
                request
                    .respond(tiny_http::Response::from_string(body).with_status_code(status))
                    .unwrap();
            }
            paths
        })
    }

    /// One-shot HTTP server returning `body`; yields the request path+query.
    pub(crate) fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
        let (server, base) = bind_local();
        let paths = serve_sequence(server, vec![(200, body.to_string())]);
        let handle = std::thread::spawn(move || paths.join().unwrap().remove(0));
        (base, handle)
    }

    fn canned(engine: SearchEngine, titles: Vec<&'static str>, fail: bool) -> Arc<dyn SearchBackend> {
        Arc::new(Canned {
            name: engine.as_str(),
            engine,
            titles,
            fail,
        })
    }

    #[tokio::test]
    async fn test_search_runs_engines_in_order_and_keeps_going() {
        let service = SearchService::empty()
            .with_backend(SearchEngine::Google, canned(SearchEngine::Google, vec!["g1"], true))
            .with_backend(
                SearchEngine::Wikipedia,
                canned(SearchEngine::Wikipedia, vec!["w1", "w2", "w3"], false),
            )
            .with_backend(SearchEngine::Arxiv, canned(SearchEngine::Arxiv, vec!["a1"], false));

        let outcome = service
            .search(
                "rust",
                &[SearchEngine::Arxiv, SearchEngine::Google, SearchEngine::Wikipedia],
                2,
            )
            .await;

        let titles: Vec<&str> = outcome.hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "w1", "w2"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("Google search failed"));
    }

    #[tokio::test]
    async fn test_search_reports_missing_engine_once() {
        let service = SearchService::empty();
        let outcome = service
            .search("q", &[SearchEngine::Arxiv, SearchEngine::Arxiv], 5)
            .await;
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.warnings, vec!["ArXiv search is not available"]);
    }

    #[tokio::test]
    async fn test_web_search_falls_back() {
        let web = WebSearch::new(
            Some(canned(SearchEngine::Google, vec![], false)),
            canned(SearchEngine::DuckDuckGo, vec!["d1"], false),
        );
        let hits = web.search("q", 5).await.unwrap();
        assert_eq!(hits[0].engine, SearchEngine::DuckDuckGo);

        let web = WebSearch::new(
            Some(canned(SearchEngine::Google, vec!["g1"], false)),
            canned(SearchEngine::DuckDuckGo, vec!["d1"], false),
        );
        let hits = web.search("q", 5).await.unwrap();
        assert_eq!(hits[0].title, "g1");
    }
}
