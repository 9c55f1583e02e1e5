//! Model registry for the configured LLM provider

use super::{LlmService, LoggingService, OpenAIModel, OpenAIService};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_AGENT_MODEL: &str = "gpt-4.1";
const DEFAULT_EVAL_MODEL: &str = "gpt-4o";
const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-mini-search-preview";

/// Configuration for LLM providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// Gateway URL; when set, the gateway handles authentication
    pub gateway: Option<String>,
    /// Model used by the classifier, location and specialist agents
    pub default_model: Option<String>,
    /// Model used to grade responses
    pub eval_model: Option<String>,
    /// Model behind the specialists' web search tool
    pub search_model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            gateway: non_empty("LLM_GATEWAY"),
            default_model: non_empty("DEFAULT_MODEL"),
            eval_model: non_empty("EVAL_MODEL"),
            search_model: non_empty("SEARCH_MODEL"),
        }
    }
}

/// Registry of available LLM models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
    eval_model: String,
    search_model: String,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        // In gateway mode, use "implicit" as the API key
        let api_key = if config.gateway.is_some() {
            Some("implicit".to_string())
        } else {
            config.openai_api_key.clone()
        };

        if let Some(api_key) = api_key {
            for model in OpenAIModel::ALL {
                let service: Arc<dyn LlmService> = Arc::new(OpenAIService::new(
                    api_key.clone(),
                    model,
                    config.gateway.as_deref(),
                ));
                services.insert(
                    model.api_name().to_string(),
                    Arc::new(LoggingService::new(service)),
                );
            }
        }

        Self {
            services,
            default_model: config
                .default_model
                .clone()
                .unwrap_or_else(|| DEFAULT_AGENT_MODEL.to_string()),
            eval_model: config
                .eval_model
                .clone()
                .unwrap_or_else(|| DEFAULT_EVAL_MODEL.to_string()),
            search_model: config
                .search_model
                .clone()
                .unwrap_or_else(|| DEFAULT_SEARCH_MODEL.to_string()),
        }
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LlmService>> {
        self.services.get(model_id).cloned()
    }

    /// Model used by the workflow agents
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.default_model)
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    pub fn eval_model_id(&self) -> &str {
        &self.eval_model
    }

    /// Model used for grading; falls back to the agent model
    pub fn evaluator(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.eval_model).or_else(|| self.default())
    }

    pub fn search_model_id(&self) -> &str {
        &self.search_model
    }

    /// Model used for web search. No fallback: only search models accept
    /// web search options.
    pub fn search(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.search_model)
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_api_keys_no_models() {
        let registry = ModelRegistry::new(&LlmConfig::default());
        assert!(registry.available_models().is_empty());
        assert!(registry.default().is_none());
        assert!(registry.evaluator().is_none());
        assert!(registry.search().is_none());
    }

    #[test]
    fn test_api_key_enables_all_models() {
        let config = LlmConfig {
            openai_api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let registry = ModelRegistry::new(&config);
        assert_eq!(registry.available_models().len(), OpenAIModel::ALL.len());
        assert_eq!(registry.default_model_id(), "gpt-4.1");
        assert_eq!(registry.default().unwrap().model_id(), "gpt-4.1");
        assert_eq!(registry.evaluator().unwrap().model_id(), "gpt-4o");
        assert_eq!(
            registry.search().unwrap().model_id(),
            "gpt-4o-mini-search-preview"
        );
    }

    #[test]
    fn test_gateway_without_key() {
        let config = LlmConfig {
            gateway: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let registry = ModelRegistry::new(&config);
        assert!(registry.get("gpt-4o-mini").is_some());
    }

    #[test]
    fn test_unknown_eval_model_falls_back_to_default() {
        let config = LlmConfig {
            openai_api_key: Some("test-key".to_string()),
            eval_model: Some("not-a-model".to_string()),
            ..Default::default()
        };
        let registry = ModelRegistry::new(&config);
        assert_eq!(registry.evaluator().unwrap().model_id(), "gpt-4.1");
    }

    #[test]
    fn test_unknown_search_model_disables_search() {
        let config = LlmConfig {
            openai_api_key: Some("test-key".to_string()),
            search_model: Some("gpt-4.1-search".to_string()),
            ..Default::default()
        };
        let registry = ModelRegistry::new(&config);
        assert_eq!(registry.search_model_id(), "gpt-4.1-search");
        assert!(registry.search().is_none());
        assert!(registry.default().is_some());
    }

    #[test]
    fn test_config_from_lookup_ignores_blank_values() {
        let config = LlmConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("  ".to_string()),
            "DEFAULT_MODEL" => Some("gpt-4o-mini".to_string()),
            "SEARCH_MODEL" => Some("gpt-4o-search-preview".to_string()),
            _ => None,
        });
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.default_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.search_model.as_deref(), Some("gpt-4o-search-preview"));
    }
}
