use crate::utils::friendly_error;
use agent_host::DeepResearcher;
use chrono::Local;
use providers::{OllamaClient, OllamaError};
use services::{ConfigStore, SearchOutcome};
use shared::history::{History, HistoryKind, HistoryPayload};
use shared::research::{report_file_name, DetailLevel, ResearchResults, SearchEngine, SearchHit};
use shared::settings::{self, ResearchConfig, OLLAMA};
use std::future::Future;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

pub const MIN_RESULTS: usize = 5;
pub const MAX_RESULTS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Research,
    Search,
    History,
    Tools,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Research, Tab::Search, Tab::History, Tab::Tools];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Research => "Deep research",
            Tab::Search => "Search",
            Tab::History => "History",
            Tab::Tools => "Tools",
        }
    }
}

/// What a worker thread sends back when it is done.
pub enum JobResult {
    Research {
        query: String,
        result: Result<ResearchResults, String>,
    },
    Search {
        query: String,
        result: Result<SearchOutcome, String>,
    },
    Probe(Result<Vec<String>, OllamaError>),
    ModelTest(Result<String, OllamaError>),
    Failed(String),
}

pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Fields of the "Add provider" form.
#[derive(Default)]
pub struct NewProviderForm {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub models: String,
}

pub struct AppState {
    store: ConfigStore,
    pub config: ResearchConfig,
    pub tab: Tab,
    pub history: History,
    pub notice: Option<Notice>,

    // sidebar
    pub key_input: String,
    pub url_input: String,
    pub show_key: bool,
    pub adding_provider: bool,
    pub new_provider: NewProviderForm,

    // research tab
    pub research_query: String,
    pub detail: DetailLevel,
    pub report: Option<String>,

    // search tab
    pub search_query: String,
    pub engines: Vec<SearchEngine>,
    pub max_results: usize,
    pub ai_summary: bool,
    pub hits: Vec<SearchHit>,
    pub search_warnings: Vec<String>,
    pub searched: bool,

    // tools tab
    pub probe: Option<Result<Vec<String>, OllamaError>>,
    pub test_model: String,
    pub test_prompt: String,
    pub test_output: Option<Result<String, String>>,

    job_rx: Option<Receiver<JobResult>>,
    pub busy: Option<(String, Instant)>,
}

impl AppState {
    pub fn new(store: ConfigStore, config: ResearchConfig) -> Self {
        let engines = config.search.default_engines.clone();
        let max_results = config.search.max_results.clamp(MIN_RESULTS, MAX_RESULTS);
        let mut state = Self {
            store,
            config,
            tab: Tab::Research,
            history: History::new(),
            notice: None,
            key_input: String::new(),
            url_input: String::new(),
            show_key: false,
            adding_provider: false,
            new_provider: NewProviderForm::default(),
            research_query: String::new(),
            detail: DetailLevel::default(),
            report: None,
            search_query: String::new(),
            engines,
            max_results,
            ai_summary: false,
            hits: Vec::new(),
            search_warnings: Vec::new(),
            searched: false,
            probe: None,
            test_model: String::new(),
            test_prompt: "Hello! Please introduce yourself briefly.".to_string(),
            test_output: None,
            job_rx: None,
            busy: None,
        };
        state.load_credential_inputs();
        state
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: true,
        });
    }

    fn save_config(&mut self) {
        if let Err(e) = self.store.save(&self.config) {
            tracing::warn!("could not save config: {:#}", e);
            self.error(format!("Could not save settings: {:#}", e));
        }
    }

    // ---- provider configuration ----

    fn load_credential_inputs(&mut self) {
        let (_, provider) = self.config.active();
        self.key_input = provider.api_key;
        self.url_input = provider.base_url;
    }

    pub fn select_provider(&mut self, name: &str) {
        self.config.set_active(name);
        self.load_credential_inputs();
        self.save_config();
    }

    pub fn apply_credentials(&mut self) {
        let (name, _) = self.config.active();
        let key = self.key_input.trim().to_string();
        if let Err(msg) = settings::validate_api_key(&name, &key) {
            self.error(msg);
            return;
        }
        if self.url_input.trim().is_empty() {
            self.error("Base URL cannot be empty");
            return;
        }
        let url = self.url_input.trim().to_string();
        self.config.set_credentials(&name, &key, &url);
        self.save_config();
        self.info(format!("Saved settings for {}", name));
    }

    pub fn select_model(&mut self, model: &str) {
        self.config.select_model(model);
        self.save_config();
    }

    pub fn add_provider(&mut self) {
        let form = std::mem::take(&mut self.new_provider);
        let models = settings::parse_model_list(&form.models);
        match self.config.add_custom_provider(
            form.name.trim(),
            form.base_url.trim(),
            form.api_key.trim(),
            models,
        ) {
            Ok(()) => {
                self.adding_provider = false;
                self.select_provider(form.name.trim());
                self.info(format!("Added provider {}", form.name.trim()));
            }
            Err(msg) => {
                self.new_provider = form;
                self.error(msg);
            }
        }
    }

    pub fn remove_provider(&mut self, name: &str) {
        if self.config.remove_provider(name) {
            self.load_credential_inputs();
            self.save_config();
            self.info(format!("Removed provider {}", name));
        }
    }

    // ---- background jobs ----

    /// Run `job` on a worker thread with its own Tokio runtime.
    fn spawn_job<F, Fut>(&mut self, label: &str, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = JobResult>,
    {
        let (tx, rx) = channel::<JobResult>();
        self.job_rx = Some(rx);
        self.busy = Some((label.to_string(), Instant::now()));
        self.notice = None;

        std::thread::spawn(move || {
            let result = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(job()),
                Err(e) => JobResult::Failed(format!("Failed to start async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
    }

    pub fn start_research(&mut self) {
        if self.is_busy() {
            return;
        }
        let query = self.research_query.trim().to_string();
        let detail = self.detail;
        let researcher = DeepResearcher::from_config(&self.config);
        self.spawn_job("Researching...", move || async move {
            let result = researcher
                .research(&query, detail)
                .await
                .map_err(|e| e.to_string());
            JobResult::Research { query, result }
        });
    }

    pub fn start_search(&mut self) {
        if self.is_busy() {
            return;
        }
        let query = self.search_query.trim().to_string();
        let engines = self.engines.clone();
        let max = self.max_results;
        let summarize = self.ai_summary;
        let researcher = DeepResearcher::from_config(&self.config);
        self.spawn_job("Searching...", move || async move {
            let result = researcher
                .search(&query, &engines, max, summarize)
                .await
                .map_err(|e| e.to_string());
            JobResult::Search { query, result }
        });
    }

    fn ollama_client(&self) -> OllamaClient {
        let base = self
            .config
            .provider(OLLAMA)
            .map(|p| p.base_url.clone())
            .filter(|u| !u.trim().is_empty());
        OllamaClient::new(base.as_deref())
    }

    pub fn start_probe(&mut self) {
        if self.is_busy() {
            return;
        }
        let client = self.ollama_client();
        self.spawn_job("Checking Ollama...", move || async move {
            JobResult::Probe(client.probe().await)
        });
    }

    pub fn start_model_test(&mut self) {
        if self.is_busy() {
            return;
        }
        if self.test_model.is_empty() {
            self.error("Pick a model to test");
            return;
        }
        let client = self.ollama_client();
        let model = self.test_model.clone();
        let prompt = self.test_prompt.clone();
        self.spawn_job("Generating...", move || async move {
            JobResult::ModelTest(client.generate(&model, &prompt).await)
        });
    }

    /// Pick up a finished job, if any. Call once per frame.
    pub fn poll_jobs(&mut self) {
        let Some(rx) = &self.job_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(std::sync::mpsc::TryRecvError::Empty) => return,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                JobResult::Failed("The background task stopped unexpectedly".to_string())
            }
        };
        self.job_rx = None;
        self.busy = None;
        self.apply_result(result);
    }

    pub fn apply_result(&mut self, result: JobResult) {
        match result {
            JobResult::Research { query, result } => match result {
                Ok(results) => {
                    let markdown = results.to_markdown();
                    self.history.record(
                        HistoryKind::Research,
                        &query,
                        HistoryPayload::Report(markdown.clone()),
                    );
                    self.report = Some(markdown);
                }
                Err(e) => self.error(friendly_error(&e)),
            },
            JobResult::Search { query, result } => match result {
                Ok(outcome) => {
                    self.history.record(
                        HistoryKind::Search,
                        &query,
                        HistoryPayload::Hits(outcome.hits.clone()),
                    );
                    if !outcome.hits.is_empty() {
                        self.info(format!("Found {} results", outcome.hits.len()));
                    }
                    self.hits = outcome.hits;
                    self.search_warnings = outcome.warnings;
                    self.searched = true;
                }
                Err(e) => self.error(friendly_error(&e)),
            },
            JobResult::Probe(result) => {
                if let Ok(models) = &result {
                    tracing::info!("Ollama reports {} models", models.len());
                    if self.test_model.is_empty() {
                        self.test_model = models.first().cloned().unwrap_or_default();
                    }
                    self.config.set_models(OLLAMA, models.clone());
                    self.save_config();
                }
                self.probe = Some(result);
            }
            JobResult::ModelTest(result) => {
                self.test_output = Some(result.map_err(|e| friendly_error(&e.to_string())));
            }
            JobResult::Failed(e) => self.error(e),
        }
    }

    // ---- report export ----

    pub fn save_report(&mut self) {
        let Some(report) = self.report.clone() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(report_file_name(Local::now()))
            .add_filter("Markdown", &["md"])
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, report) {
            Ok(()) => self.info(format!("Saved report to {}", path.display())),
            Err(e) => self.error(format!("Could not save report: {}", e)),
        }
    }

    pub fn copy_report(&mut self) {
        let Some(report) = self.report.clone() else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut c| c.set_text(report)) {
            Ok(()) => self.info("Report copied to clipboard"),
            Err(e) => self.error(format!("Clipboard unavailable: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        (dir, AppState::new(store, ResearchConfig::default()))
    }

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.into(),
            url: "https://example.com".into(),
            snippet: String::new(),
            engine: SearchEngine::Wikipedia,
            ai_summary: None,
        }
    }

    #[test]
    fn test_each_completed_action_adds_one_history_entry() {
        let (_dir, mut s) = state();

        s.apply_result(JobResult::Search {
            query: "rust".into(),
            result: Ok(SearchOutcome {
                hits: vec![hit("a"), hit("b")],
                warnings: vec![],
            }),
        });
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.hits.len(), 2);

        s.apply_result(JobResult::Research {
            query: "rust".into(),
            result: Ok(ResearchResults::new("report").with_sources(vec!["Model: m".into()])),
        });
        assert_eq!(s.history.len(), 2);
        assert!(s.report.as_deref().unwrap().contains("1. Model: m"));
    }

    #[test]
    fn test_failed_action_adds_no_history() {
        let (_dir, mut s) = state();
        s.apply_result(JobResult::Research {
            query: "rust".into(),
            result: Err("401 Unauthorized".into()),
        });
        assert!(s.history.is_empty());
        let notice = s.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert!(notice.text.contains("API key"));
    }

    #[test]
    fn test_deleting_history_shrinks_by_one() {
        let (_dir, mut s) = state();
        for q in ["one", "two"] {
            s.apply_result(JobResult::Search {
                query: q.into(),
                result: Ok(SearchOutcome::default()),
            });
        }
        let (_, newest) = s.history.newest_first().next().unwrap();
        let id = newest.id;
        assert!(s.history.remove(id));
        assert_eq!(s.history.len(), 1);
    }

    #[test]
    fn test_invalid_openrouter_key_is_not_saved() {
        let (dir, mut s) = state();
        s.key_input = "not-a-key".into();
        s.apply_credentials();
        assert!(s.notice.as_ref().unwrap().is_error);
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_probe_result_updates_ollama_models() {
        let (dir, mut s) = state();
        s.apply_result(JobResult::Probe(Ok(vec!["llama3:8b".into()])));
        assert_eq!(s.test_model, "llama3:8b");
        assert_eq!(
            s.config.provider(OLLAMA).unwrap().models,
            vec!["llama3:8b".to_string()]
        );
        assert!(dir.path().join("config.json").exists());
    }

    #[test]
    fn test_add_provider_rejects_incomplete_form() {
        let (_dir, mut s) = state();
        s.adding_provider = true;
        s.new_provider.name = "Local gateway".into();
        s.add_provider();
        assert!(s.adding_provider);
        assert_eq!(s.new_provider.name, "Local gateway");
        assert!(s.notice.as_ref().unwrap().is_error);
    }
}
