//! Engine registry for managing available search engines

use super::traits::Engine;
use crate::config::EngineConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Whether a provider may be searched, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistration {
    /// Case-folded provider name
    pub name: String,
    pub enabled: bool,
    /// All categories; the first one is the primary category
    pub categories: Vec<String>,
}

impl ProviderRegistration {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            name: config.name.to_lowercase(),
            enabled: !config.disabled,
            categories: config.categories.clone(),
        }
    }

    /// Primary category
    pub fn category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or("general")
    }
}

/// Registry of the engines the process can search
pub struct EngineRegistry {
    /// Engines by case-folded name
    engines: HashMap<String, Arc<dyn Engine>>,
    /// Engine shortcuts (e.g., "g" -> "google")
    shortcuts: HashMap<String, String>,
    configs: HashMap<String, EngineConfig>,
    registrations: HashMap<String, ProviderRegistration>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
            shortcuts: HashMap::new(),
            configs: HashMap::new(),
            registrations: HashMap::new(),
        }
    }

    /// Register an engine under its registration
    pub fn register(
        &mut self,
        engine: Arc<dyn Engine>,
        config: EngineConfig,
        registration: ProviderRegistration,
    ) {
        let name = registration.name.clone();

        if !config.shortcut.is_empty() {
            self.shortcuts
                .insert(config.shortcut.to_lowercase(), name.clone());
        }

        self.engines.insert(name.clone(), engine);
        self.configs.insert(name.clone(), config);
        self.registrations.insert(name, registration);
    }

    /// Get an engine by case-folded name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Engine>> {
        self.engines.get(name)
    }

    pub fn registration(&self, name: &str) -> Option<&ProviderRegistration> {
        self.registrations.get(name)
    }

    /// Resolve a name or shortcut to an enabled engine name.
    ///
    /// Unknown and disabled providers resolve to `None`.
    pub fn resolve(&self, name_or_shortcut: &str) -> Option<&str> {
        let key = name_or_shortcut.trim().to_lowercase();
        let name = if self.engines.contains_key(&key) {
            Some(key.as_str())
        } else {
            self.shortcuts.get(&key).map(|s| s.as_str())
        };

        match name.and_then(|n| self.registrations.get(n)) {
            Some(reg) if reg.enabled => Some(reg.name.as_str()),
            Some(_) => {
                debug!("Skipping disabled engine: {}", name_or_shortcut);
                None
            }
            None => {
                debug!("Skipping unknown engine: {}", name_or_shortcut);
                None
            }
        }
    }

    /// Names of the enabled engines, sorted
    pub fn enabled(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .registrations
            .values()
            .filter(|r| r.enabled)
            .map(|r| r.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Get effective timeout for an engine
    pub fn get_timeout(&self, name: &str, default: f64) -> f64 {
        self.configs
            .get(name)
            .and_then(|c| c.timeout)
            .unwrap_or(default)
    }

    /// Get effective weight for an engine
    pub fn get_weight(&self, name: &str) -> f64 {
        self.configs
            .get(name)
            .map(|c| c.weight)
            .unwrap_or_else(|| self.engines.get(name).map(|e| e.weight()).unwrap_or(1.0))
    }

    /// Weights of all registered engines, for scoring
    pub fn weights(&self) -> HashMap<String, f64> {
        self.engines
            .keys()
            .map(|name| (name.clone(), self.get_weight(name)))
            .collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::CssEngine;

    fn config(name: &str, shortcut: &str) -> EngineConfig {
        EngineConfig {
            name: name.to_string(),
            engine: "css".to_string(),
            shortcut: shortcut.to_string(),
            search_url: "https://search.example/".to_string(),
            results: "div.r".to_string(),
            url: "a".to_string(),
            title: "h3".to_string(),
            weight: 1.5,
            ..Default::default()
        }
    }

    fn registry() -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        for (name, shortcut, enabled) in [("Google", "g", true), ("qwant", "qw", false)] {
            let config = config(name, shortcut);
            let engine = Arc::new(CssEngine::from_config(&config).unwrap()) as Arc<dyn Engine>;
            let mut registration = ProviderRegistration::from_config(&config);
            registration.enabled = enabled;
            registry.register(engine, config, registration);
        }
        registry
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.resolve("GOOGLE"), Some("google"));
        assert_eq!(registry.resolve(" g "), Some("google"));
    }

    #[test]
    fn test_resolve_skips_disabled_and_unknown() {
        let registry = registry();
        assert_eq!(registry.resolve("qwant"), None);
        assert_eq!(registry.resolve("qw"), None);
        assert_eq!(registry.resolve("altavista"), None);
        assert_eq!(registry.enabled(), vec!["google"]);
    }

    #[test]
    fn test_timeout_and_weight() {
        let registry = registry();
        assert_eq!(registry.get_timeout("google", 2.5), 2.5);
        assert_eq!(registry.get_weight("google"), 1.5);
        assert_eq!(registry.get_weight("missing"), 1.0);
        assert_eq!(registry.weights().len(), 2);
    }
}
