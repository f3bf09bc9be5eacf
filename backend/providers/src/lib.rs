//! Text LLM providers for the secondary extraction pass.

pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use chequeforge_core::LlmProvider;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

/// Provider names accepted in configuration.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openrouter", "ollama", "mock"];

/// Registry of LLM providers, looked up by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_looks_up_by_provider_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new("mock")));
        registry.register(Arc::new(OllamaProvider::new()));

        assert_eq!(registry.get("ollama").unwrap().name(), "ollama");
        assert!(registry.get("openai").is_none());
        assert_eq!(registry.list(), vec!["mock".to_string(), "ollama".to_string()]);
    }
}
