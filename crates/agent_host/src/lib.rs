//! Research orchestration.
//!
//! [`DeepResearcher`] is what the UI talks to. It validates a request, picks
//! the direct local path or the search-then-write [`ResearchGraph`], and runs
//! multi-engine searches with optional per-hit summaries.

pub mod deep_researcher;
pub mod prompts;
pub mod research_graph;

pub use deep_researcher::{DeepResearcher, ResearchError};
pub use research_graph::ResearchGraph;
