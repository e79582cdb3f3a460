use super::{discovery::DiscoveryConfig, evolution::EvolutionConfig, traits::ConfigSection};
use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `FORMULA_DISCOVERY__EVOLUTION__POPULATION_SIZE=200`.
pub const ENV_PREFIX: &str = "FORMULA_DISCOVERY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        validate_section(&self.evolution)?;
        validate_section(&self.discovery)?;
        Ok(())
    }
}

// Prefixes configuration errors with the section they came from
fn validate_section<S: ConfigSection>(section: &S) -> Result<(), DiscoveryError> {
    section.validate().map_err(|e| match e {
        DiscoveryError::Configuration(message) => {
            DiscoveryError::Configuration(format!("[{}] {}", S::section_name(), message))
        }
        other => other,
    })
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Layers defaults, then the TOML file (if given), then environment overrides.
    pub fn load(&self, path: Option<&Path>) -> Result<(), DiscoveryError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(DiscoveryError::Configuration(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);

        *self.write_lock()? = config;
        Ok(())
    }

    /// Reads a TOML file directly, without environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DiscoveryError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;

        *self.write_lock()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DiscoveryError> {
        let config = self.get()?;
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| DiscoveryError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| DiscoveryError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, DiscoveryError> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| DiscoveryError::Configuration("Config lock poisoned".to_string()))
    }

    pub fn update<F>(&self, f: F) -> Result<(), DiscoveryError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get()?;
        f(&mut candidate);
        candidate.validate()?;
        *self.write_lock()? = candidate;
        Ok(())
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, DiscoveryError> {
        self.config
            .write()
            .map_err(|_| DiscoveryError::Configuration("Config lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip_through_file() {
        let dir = std::env::temp_dir().join(format!("formula-discovery-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.evolution.population_size = 64;
                c.evolution.seed = Some(7);
                c.discovery.split_by_regime = false;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let loaded = ConfigManager::new();
        loaded.load_from_file(&path).unwrap();
        assert_eq!(loaded.get().unwrap(), manager.get().unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_update_is_not_applied() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.tournament_size = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().unwrap().evolution.tournament_size, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [evolution]
            population_size = 250
            fitness_type = "spearman"
            "#,
        )
        .unwrap();
        assert_eq!(config.evolution.population_size, 250);
        assert_eq!(config.evolution.max_generations, 50);
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }
}
