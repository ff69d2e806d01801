//! Engine loader for initializing engines from configuration

use super::css::CssEngine;
use super::json::JsonEngine;
use super::registry::{EngineRegistry, ProviderRegistration};
use super::traits::Engine;
use crate::config::EngineConfig;
use crate::error::SearchError;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing engines from configuration
pub struct EngineLoader;

impl EngineLoader {
    /// Names of the configured engines that can actually be built.
    ///
    /// Failures are logged and leave the engine out of the result.
    pub fn probe(configs: &[EngineConfig]) -> HashSet<String> {
        let mut known_good = HashSet::new();
        for config in configs {
            match Self::create_engine(config) {
                Ok(_) => {
                    known_good.insert(config.name.to_lowercase());
                }
                Err(e) => warn!("Engine {} unavailable: {:#}", config.name, e),
            }
        }
        known_good
    }

    /// Build the registry from the configurations and the hardened registrations.
    ///
    /// Only enabled registrations are loaded; at least one engine must load.
    pub fn load(
        configs: &[EngineConfig],
        registrations: &[ProviderRegistration],
    ) -> std::result::Result<EngineRegistry, SearchError> {
        let mut registry = EngineRegistry::new();

        for registration in registrations {
            if !registration.enabled {
                info!("Skipping disabled engine: {}", registration.name);
                continue;
            }

            let Some(config) = configs
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&registration.name))
            else {
                warn!("No configuration for engine {}", registration.name);
                continue;
            };

            match Self::create_engine(config) {
                Ok(engine) => {
                    info!("Loaded engine: {} ({})", config.name, config.engine);
                    registry.register(engine, config.clone(), registration.clone());
                }
                Err(e) => {
                    warn!("Failed to load engine {}: {:#}", config.name, e);
                }
            }
        }

        if registry.is_empty() {
            return Err(SearchError::ProviderInit(
                "no search engine could be loaded".to_string(),
            ));
        }

        info!("Loaded {} engines", registry.len());
        Ok(registry)
    }

    /// Create an engine instance from its configuration
    pub fn create_engine(config: &EngineConfig) -> Result<Arc<dyn Engine>> {
        if config.name.trim().is_empty() {
            anyhow::bail!("engine name is empty");
        }
        let engine: Arc<dyn Engine> = match config.engine.as_str() {
            "css" => Arc::new(CssEngine::from_config(config)?),
            "json" => Arc::new(JsonEngine::from_config(config)?),
            other => anyhow::bail!(
                "Unknown engine type: {} (expected one of {})",
                other,
                Self::available_engines().join(", ")
            ),
        };
        Ok(engine)
    }

    /// Get list of available engine types
    pub fn available_engines() -> Vec<&'static str> {
        vec!["css", "json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_shipped_engines_probe_clean() {
        let settings = Settings::default();
        let known_good = EngineLoader::probe(&settings.engines);
        assert_eq!(known_good.len(), settings.engines.len());
        assert!(known_good.contains("google"));
        assert!(known_good.contains("wikipedia"));
    }

    #[test]
    fn test_probe_skips_broken_configs() {
        let mut settings = Settings::default();
        settings.engines.push(EngineConfig {
            name: "Broken".to_string(),
            engine: "css".to_string(),
            search_url: "https://broken.example/".to_string(),
            results: "div[".to_string(),
            url: "a".to_string(),
            title: "h3".to_string(),
            ..Default::default()
        });
        settings.engines.push(EngineConfig {
            name: "mystery".to_string(),
            engine: "xml".to_string(),
            ..Default::default()
        });

        let known_good = EngineLoader::probe(&settings.engines);
        assert!(!known_good.contains("broken"));
        assert!(!known_good.contains("mystery"));
    }

    #[test]
    fn test_load_only_enabled() {
        let settings = Settings::default();
        let registrations: Vec<_> = settings
            .engines
            .iter()
            .map(|c| ProviderRegistration {
                enabled: c.name == "google" || c.name == "bing",
                ..ProviderRegistration::from_config(c)
            })
            .collect();

        let registry = EngineLoader::load(&settings.engines, &registrations).unwrap();
        assert_eq!(registry.enabled(), vec!["bing", "google"]);
        assert!(registry.get("wikipedia").is_none());
    }

    #[test]
    fn test_load_nothing_is_an_init_error() {
        let settings = Settings::default();
        let registrations: Vec<_> = settings
            .engines
            .iter()
            .map(|c| ProviderRegistration {
                enabled: false,
                ..ProviderRegistration::from_config(c)
            })
            .collect();

        let err = EngineLoader::load(&settings.engines, &registrations).err().unwrap();
        assert!(matches!(err, SearchError::ProviderInit(_)));
    }
}
