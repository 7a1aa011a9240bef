pub mod config_store;
pub mod page_fetch;
pub mod search;

pub use config_store::ConfigStore;
pub use search::{SearchBackend, SearchOutcome, SearchService, WebSearch};
