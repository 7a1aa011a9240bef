//! Client for a local Ollama server.
//!
//! Covers the two endpoints the app needs: `GET /api/tags` to list installed
//! models (doubling as the connectivity probe) and `POST /api/generate` for
//! single-shot completions.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::net::TcpStream;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const PORT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_CHARS: usize = 200;
const PLAIN_ANSWER_PREFIX: &str = "Answer directly in plain text, not JSON: ";

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(PORT_CHECK_TIMEOUT)
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("invalid Ollama URL: {0}")]
    InvalidUrl(String),

    #[error("port {port} on {host} is not open, make sure `ollama serve` is running")]
    PortClosed { host: String, port: u16 },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("Ollama returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse Ollama response: {0}")]
    Parse(String),
}

impl OllamaError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            OllamaError::Timeout(timeout.as_secs())
        } else if err.is_decode() {
            OllamaError::Parse(err.to_string())
        } else {
            OllamaError::Connection(err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

/// Older servers list bare names, newer ones full objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelEntry {
    Named { name: String },
    Bare(String),
}

impl ModelEntry {
    fn into_name(self) -> String {
        match self {
            ModelEntry::Named { name } => name,
            ModelEntry::Bare(name) => name,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Installed models split the way the model picker shows them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModelCategories {
    pub general: Vec<String>,
    pub code: Vec<String>,
    pub other: Vec<String>,
}

impl ModelCategories {
    pub fn groups(&self) -> [(&'static str, &[String]); 3] {
        [
            ("General", self.general.as_slice()),
            ("Code", self.code.as_slice()),
            ("Other", self.other.as_slice()),
        ]
    }
}

pub fn categorize_models(names: &[String]) -> ModelCategories {
    let mut cats = ModelCategories::default();
    for name in names {
        let lower = name.to_lowercase();
        if lower.contains("coder") {
            cats.code.push(name.clone());
        } else if ["llama", "mixtral", "glm"].iter().any(|k| lower.contains(k)) {
            cats.general.push(name.clone());
        } else {
            cats.other.push(name.clone());
        }
    }
    cats
}

pub struct OllamaClient {
    http: Client,
    base: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<&str>) -> Self {
        let base = base_url
            .map(str::to_string)
            .filter(|b| !b.trim().is_empty())
            .or_else(|| env::var("OLLAMA_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            http: SHARED_HTTP.clone(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn host_port(&self) -> Result<(String, u16), OllamaError> {
        let parsed =
            url::Url::parse(&self.base).map_err(|e| OllamaError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| OllamaError::InvalidUrl(self.base.clone()))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| OllamaError::InvalidUrl(self.base.clone()))?;
        Ok((host, port))
    }

    /// Check the server is reachable and return the installed model names.
    pub async fn probe(&self) -> Result<Vec<String>, OllamaError> {
        let (host, port) = self.host_port()?;
        if !port_open(&host, port, PORT_CHECK_TIMEOUT).await {
            return Err(OllamaError::PortClosed { host, port });
        }

        let url = format!("{}/api/tags", self.base);
        tracing::debug!("ollama probe: GET {}", url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| OllamaError::from_reqwest(e, PROBE_TIMEOUT))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| OllamaError::from_reqwest(e, PROBE_TIMEOUT))?;
        if !status.is_success() {
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_CHARS),
            });
        }

        let tags: TagsResponse =
            serde_json::from_str(&body).map_err(|e| OllamaError::Parse(e.to_string()))?;
        Ok(tags.models.into_iter().map(ModelEntry::into_name).collect())
    }

    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base);
        let req = GenerateRequest {
            model,
            prompt: format!("{}{}", PLAIN_ANSWER_PREFIX, prompt),
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
            },
        };
        tracing::debug!(model, "ollama generate: POST {}", url);
        let resp = self
            .http
            .post(&url)
            .json(&req)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| OllamaError::from_reqwest(e, GENERATE_TIMEOUT))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| OllamaError::from_reqwest(e, GENERATE_TIMEOUT))?;
        if !status.is_success() {
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_CHARS),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| OllamaError::Parse(e.to_string()))?;
        Ok(unwrap_solution(&parsed.response))
    }
}

pub async fn port_open(host: &str, port: u16, wait: Duration) -> bool {
    matches!(
        tokio::time::timeout(wait, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Some models answer with `{"solution": [{...}]}` despite the prompt; flatten
/// the first solution into `key: value` lines.
fn unwrap_solution(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(trimmed) {
        let first = map
            .get("solution")
            .and_then(|s| s.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_object());
        if let Some(solution) = first {
            return solution
                .iter()
                .map(|(k, v)| match v.as_str() {
                    Some(s) => format!("{}: {}", k, s),
                    None => format!("{}: {}", k, v),
                })
                .collect::<Vec<_>>()
                .join("\n");
        }
    }
    trimmed.to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread::JoinHandle;

    /// Serve canned responses, one per request, and hand back what was received.
    fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<(String, String)>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let mut request = server.recv().unwrap();
                let mut received = String::new();
                request.as_reader().read_to_string(&mut received).unwrap();
                seen.push((request.url().to_string(), received));
                request
                    .respond(tiny_http::Response::from_string(body).with_status_code(status))
                    .unwrap();
            }
            seen
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_probe_fails_when_port_closed() {
        let port = closed_port();
        let client = OllamaClient::new(Some(&format!("http://127.0.0.1:{}", port)));
        match client.probe().await {
            Err(OllamaError::PortClosed { port: p, .. }) => assert_eq!(p, port),
            other => panic!("expected PortClosed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_lists_models() {
        let body = r#"{"models":[{"name":"llama3:8b","size":1},"qwen2.5-coder"]}"#;
        let (base, handle) = serve(vec![(200, body.to_string())]);
        let client = OllamaClient::new(Some(&base));
        let models = client.probe().await.unwrap();
        assert_eq!(models, vec!["llama3:8b", "qwen2.5-coder"]);
        let seen = handle.join().unwrap();
        assert_eq!(seen[0].0, "/api/tags");
    }

    #[tokio::test]
    async fn test_probe_reports_status() {
        let (base, handle) = serve(vec![(500, "boom".to_string())]);
        let client = OllamaClient::new(Some(&base));
        match client.probe().await {
            Err(OllamaError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Status, got {:?}", other),
        }
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_probe_reports_bad_json() {
        let (base, handle) = serve(vec![(200, "<html>".to_string())]);
        let client = OllamaClient::new(Some(&base));
        assert!(matches!(client.probe().await, Err(OllamaError::Parse(_))));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_generate_sends_options_and_prefix() {
        let (base, handle) = serve(vec![(200, r#"{"response":"  hello  "}"#.to_string())]);
        let client = OllamaClient::new(Some(&base));
        let text = client.generate("llama3", "introduce yourself").await.unwrap();
        assert_eq!(text, "hello");

        let seen = handle.join().unwrap();
        assert_eq!(seen[0].0, "/api/generate");
        let sent: serde_json::Value = serde_json::from_str(&seen[0].1).unwrap();
        assert_eq!(sent["model"], "llama3");
        assert_eq!(sent["stream"], false);
        assert_eq!(sent["options"]["top_p"].as_f64().map(|v| (v * 10.0).round()), Some(9.0));
        assert!(sent["prompt"]
            .as_str()
            .unwrap()
            .ends_with("introduce yourself"));
    }

    #[test]
    fn test_unwrap_solution() {
        let raw = r#"{"solution":[{"answer":"42","why":"because"}]}"#;
        assert_eq!(unwrap_solution(raw), "answer: 42\nwhy: because");
        assert_eq!(unwrap_solution(" plain text "), "plain text");
        assert_eq!(unwrap_solution(r#"{"other":1}"#), r#"{"other":1}"#);
    }

    #[test]
    fn test_categorize_models() {
        let names: Vec<String> = ["llama3", "deepseek-coder", "phi3", "glm4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cats = categorize_models(&names);
        assert_eq!(cats.general, vec!["llama3", "glm4"]);
        assert_eq!(cats.code, vec!["deepseek-coder"]);
        assert_eq!(cats.other, vec!["phi3"]);
    }
}
