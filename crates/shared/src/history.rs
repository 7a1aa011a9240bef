//! Session history of search and research actions.
//!
//! Lives only in memory for the lifetime of the process.

use crate::research::{render_hits_markdown, SearchHit};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TITLE_QUERY_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Search,
    Research,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Search => "search",
            HistoryKind::Research => "research",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum HistoryPayload {
    /// A Markdown report.
    Report(String),
    Hits(Vec<SearchHit>),
}

impl HistoryPayload {
    pub fn to_markdown(&self) -> String {
        match self {
            HistoryPayload::Report(md) => md.clone(),
            HistoryPayload::Hits(hits) => render_hits_markdown(hits),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub kind: HistoryKind,
    pub query: String,
    pub payload: HistoryPayload,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    /// Header line, e.g. `#3 RESEARCH: quantum computing...`
    pub fn title(&self, number: usize) -> String {
        let query: String = self.query.chars().take(TITLE_QUERY_CHARS).collect();
        format!("#{} {}: {}...", number, self.kind.as_str().to_uppercase(), query)
    }
}

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: HistoryKind, query: &str, payload: HistoryPayload) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push(HistoryEntry {
            id,
            kind,
            query: query.to_string(),
            payload,
            timestamp: Local::now(),
        });
        id
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries in reverse insertion order, paired with their 1-based display number.
    pub fn newest_first(&self) -> impl Iterator<Item = (usize, &HistoryEntry)> {
        let len = self.entries.len();
        self.entries
            .iter()
            .rev()
            .enumerate()
            .map(move |(idx, entry)| (len - idx, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
