pub mod history;
pub mod research;

pub mod settings {
    use crate::research::SearchEngine;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    pub const OPENROUTER: &str = "OpenRouter";
    pub const OLLAMA: &str = "Ollama";
    pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
    pub const OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
    pub const OPENROUTER_KEY_PREFIX: &str = "sk-or-v1-";

    const OPENROUTER_MODELS: &[&str] = &[
        "google/gemini-2.0-flash-thinking-exp:free",
        "google/gemini-2.0-flash-thinking-exp-1219:free",
        "google/gemini-2.0-flash-lite-preview-02-05:free",
        "google/gemini-2.0-pro-exp-02-05:free",
        "deepseek/deepseek-r1-distill-llama-70b:free",
        "deepseek/deepseek-chat:free",
        "deepseek/deepseek-r1:free",
    ];

    fn default_lang() -> String {
        "en".to_string()
    }

    fn default_engines() -> Vec<SearchEngine> {
        vec![SearchEngine::Google, SearchEngine::Wikipedia]
    }

    fn default_max_results() -> usize {
        15
    }

    /// One LLM service definition as stored in the config file.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProviderConfig {
        pub base_url: String,
        #[serde(default)]
        pub api_key: String,
        #[serde(default)]
        pub models: Vec<String>,
    }

    impl ProviderConfig {
        pub fn has_key(&self) -> bool {
            !self.api_key.trim().is_empty()
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SearchSettings {
        /// SerpAPI key for Google results. `SERPAPI_KEY` in the environment wins.
        #[serde(default)]
        pub serpapi_key: Option<String>,
        #[serde(default = "default_lang")]
        pub wikipedia_lang: String,
        #[serde(default = "default_engines")]
        pub default_engines: Vec<SearchEngine>,
        #[serde(default = "default_max_results")]
        pub max_results: usize,
    }

    impl Default for SearchSettings {
        fn default() -> Self {
            Self {
                serpapi_key: None,
                wikipedia_lang: default_lang(),
                default_engines: default_engines(),
                max_results: default_max_results(),
            }
        }
    }

    /// Contents of `~/.shandu/config.json`.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ResearchConfig {
        #[serde(default)]
        pub providers: BTreeMap<String, ProviderConfig>,
        #[serde(default)]
        pub custom_providers: BTreeMap<String, ProviderConfig>,
        #[serde(default)]
        pub active_provider: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub selected_model: Option<String>,
        #[serde(default)]
        pub search: SearchSettings,
    }

    impl Default for ResearchConfig {
        fn default() -> Self {
            let mut providers = BTreeMap::new();
            providers.insert(OPENROUTER.to_string(), default_provider(OPENROUTER));
            providers.insert(OLLAMA.to_string(), default_provider(OLLAMA));
            Self {
                providers,
                custom_providers: BTreeMap::new(),
                active_provider: OPENROUTER.to_string(),
                selected_model: None,
                search: SearchSettings::default(),
            }
        }
    }

    /// Built-in definition for a well-known provider name.
    pub fn default_provider(name: &str) -> ProviderConfig {
        match name {
            OPENROUTER => ProviderConfig {
                base_url: OPENROUTER_BASE_URL.into(),
                api_key: String::new(),
                models: OPENROUTER_MODELS.iter().map(|m| m.to_string()).collect(),
            },
            OLLAMA => ProviderConfig {
                base_url: OLLAMA_BASE_URL.into(),
                api_key: String::new(),
                models: Vec::new(),
            },
            _ => ProviderConfig::default(),
        }
    }

    impl ResearchConfig {
        /// Built-in and custom providers merged; a custom entry shadows a built-in one.
        pub fn all_providers(&self) -> BTreeMap<String, ProviderConfig> {
            let mut all = self.providers.clone();
            for (name, cfg) in &self.custom_providers {
                all.insert(name.clone(), cfg.clone());
            }
            all
        }

        pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
            self.custom_providers
                .get(name)
                .or_else(|| self.providers.get(name))
        }

        pub fn is_custom(&self, name: &str) -> bool {
            self.custom_providers.contains_key(name)
        }

        /// The active provider, falling back to OpenRouter when the stored name is unknown.
        pub fn active(&self) -> (String, ProviderConfig) {
            if let Some(cfg) = self.provider(&self.active_provider) {
                return (self.active_provider.clone(), cfg.clone());
            }
            let cfg = self
                .provider(OPENROUTER)
                .cloned()
                .unwrap_or_else(|| default_provider(OPENROUTER));
            (OPENROUTER.to_string(), cfg)
        }

        pub fn set_active(&mut self, name: &str) {
            if self.provider(name).is_some() && self.active_provider != name {
                self.active_provider = name.to_string();
                self.selected_model = None;
            }
        }

        /// Model to use: the explicit selection, else the active provider's first model.
        pub fn current_model(&self) -> Option<String> {
            if let Some(model) = &self.selected_model {
                return Some(model.clone());
            }
            let (_, cfg) = self.active();
            cfg.models.first().cloned()
        }

        pub fn select_model(&mut self, model: &str) {
            self.selected_model = Some(model.to_string());
        }

        pub fn add_custom_provider(
            &mut self,
            name: &str,
            base_url: &str,
            api_key: &str,
            models: Vec<String>,
        ) -> Result<(), String> {
            let name = name.trim();
            if name.is_empty() || base_url.trim().is_empty() || api_key.trim().is_empty() {
                return Err("Name, base URL and API key are all required".into());
            }
            self.custom_providers.insert(
                name.to_string(),
                ProviderConfig {
                    base_url: base_url.trim().to_string(),
                    api_key: api_key.trim().to_string(),
                    models,
                },
            );
            Ok(())
        }

        /// Remove a provider from both maps. Returns whether anything was removed.
        pub fn remove_provider(&mut self, name: &str) -> bool {
            let custom = self.custom_providers.remove(name).is_some();
            let builtin = self.providers.remove(name).is_some();
            if self.active_provider == name {
                self.active_provider = OPENROUTER.to_string();
                self.selected_model = None;
            }
            custom || builtin
        }

        /// Update key and base URL of a provider and make it the active one.
        pub fn set_credentials(&mut self, name: &str, api_key: &str, base_url: &str) {
            if let Some(cfg) = self.custom_providers.get_mut(name) {
                cfg.api_key = api_key.to_string();
                cfg.base_url = base_url.to_string();
            } else {
                let cfg = self
                    .providers
                    .entry(name.to_string())
                    .or_insert_with(|| default_provider(name));
                cfg.api_key = api_key.to_string();
                cfg.base_url = base_url.to_string();
            }
            self.set_active(name);
        }

        /// Replace the model list of a provider (used after probing Ollama).
        pub fn set_models(&mut self, name: &str, models: Vec<String>) {
            if let Some(cfg) = self.custom_providers.get_mut(name) {
                cfg.models = models;
            } else if let Some(cfg) = self.providers.get_mut(name) {
                cfg.models = models;
            }
        }
    }

    /// Check a key against the provider's known format.
    pub fn validate_api_key(provider: &str, key: &str) -> Result<(), String> {
        if provider == OPENROUTER && !key.is_empty() && !key.starts_with(OPENROUTER_KEY_PREFIX) {
            return Err(format!(
                "OpenRouter API keys start with {}; get one at https://openrouter.ai/keys",
                OPENROUTER_KEY_PREFIX
            ));
        }
        Ok(())
    }

    /// Split a multi-line text box into model ids.
    pub fn parse_model_list(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn is_free_model(provider: &str, model: &str) -> bool {
        provider == OLLAMA || model.to_lowercase().contains("free")
    }

    /// Group a provider's models for display.
    pub fn model_groups<'a>(provider: &str, models: &'a [String]) -> Vec<(&'static str, Vec<&'a str>)> {
        if provider != OPENROUTER {
            return vec![("All models", models.iter().map(String::as_str).collect())];
        }
        let mut gemini = Vec::new();
        let mut deepseek = Vec::new();
        let mut other = Vec::new();
        for m in models {
            let lower = m.to_lowercase();
            if lower.contains("gemini") {
                gemini.push(m.as_str());
            } else if lower.contains("deepseek") {
                deepseek.push(m.as_str());
            } else {
                other.push(m.as_str());
            }
        }
        [("Gemini", gemini), ("DeepSeek", deepseek), ("Other", other)]
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".into(),
                content: content.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::settings::*;

    #[test]
    fn test_default_config_has_openrouter_active() {
        let cfg = ResearchConfig::default();
        let (name, provider) = cfg.active();
        assert_eq!(name, OPENROUTER);
        assert_eq!(provider.base_url, OPENROUTER_BASE_URL);
        assert_eq!(
            cfg.current_model().as_deref(),
            Some("google/gemini-2.0-flash-thinking-exp:free")
        );
    }

    #[test]
    fn test_custom_provider_shadows_builtin() {
        let mut cfg = ResearchConfig::default();
        cfg.add_custom_provider(OPENROUTER, "https://proxy.local/v1", "k", vec!["m".into()])
            .unwrap();
        assert_eq!(cfg.all_providers()[OPENROUTER].base_url, "https://proxy.local/v1");
        assert!(cfg.is_custom(OPENROUTER));
    }

    #[test]
    fn test_add_custom_provider_requires_fields() {
        let mut cfg = ResearchConfig::default();
        assert!(cfg.add_custom_provider("Mine", "", "key", vec![]).is_err());
        assert!(cfg.add_custom_provider("  ", "http://x", "key", vec![]).is_err());
        assert!(cfg.custom_providers.is_empty());
    }

    #[test]
    fn test_set_credentials_activates_provider() {
        let mut cfg = ResearchConfig::default();
        cfg.select_model("deepseek/deepseek-chat:free");
        cfg.set_credentials(OLLAMA, "", "http://10.0.0.2:11434");
        assert_eq!(cfg.active_provider, OLLAMA);
        assert_eq!(cfg.providers[OLLAMA].base_url, "http://10.0.0.2:11434");
        // switching provider drops a selection that belonged to the old one
        assert_eq!(cfg.selected_model, None);
    }

    #[test]
    fn test_remove_active_provider_falls_back() {
        let mut cfg = ResearchConfig::default();
        cfg.add_custom_provider("Local", "http://x", "k", vec![]).unwrap();
        cfg.set_active("Local");
        assert!(cfg.remove_provider("Local"));
        assert_eq!(cfg.active_provider, OPENROUTER);
        assert!(!cfg.remove_provider("Local"));
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key(OPENROUTER, "sk-or-v1-abc").is_ok());
        assert!(validate_api_key(OPENROUTER, "sk-abc").is_err());
        assert!(validate_api_key(OPENROUTER, "").is_ok());
        assert!(validate_api_key("Other", "anything").is_ok());
    }

    #[test]
    fn test_parse_model_list() {
        let models = parse_model_list("gpt-4o\n\n  llama3 \n");
        assert_eq!(models, vec!["gpt-4o", "llama3"]);
    }

    #[test]
    fn test_model_groups_openrouter() {
        let cfg = ResearchConfig::default();
        let models = &cfg.providers[OPENROUTER].models;
        let groups = model_groups(OPENROUTER, models);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Gemini");
        assert_eq!(groups[0].1.len(), 4);
        assert_eq!(groups[1].1.len(), 3);
        assert!(is_free_model(OPENROUTER, models[0].as_str()));
        assert!(!is_free_model(OPENROUTER, "openai/gpt-4o"));
        assert!(is_free_model(OLLAMA, "llama3"));
    }

    #[test]
    fn test_old_config_file_still_loads() {
        let json = r#"{
            "providers": {"OpenRouter": {"base_url": "https://openrouter.ai/api/v1", "api_key": "", "models": []}},
            "active_provider": "OpenRouter",
            "custom_providers": {}
        }"#;
        let cfg: ResearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.search, SearchSettings::default());
        assert_eq!(cfg.selected_model, None);
    }
}
