//! LLM provider clients: local Ollama and OpenAI-compatible gateways.

pub mod ollama;
pub mod openai;
pub mod router;

pub use ollama::{categorize_models, ModelCategories, OllamaClient, OllamaError};
pub use openai::OpenAIClient;
pub use router::{LanguageModel, ProviderKind, ProviderRouter};
