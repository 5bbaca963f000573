use super::{
    evolution::EvolutionConfig,
    persistence::PersistenceConfig,
    trading::TradingConfig,
    traits::ConfigSection,
};
use crate::error::EvotraderError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `EVOTRADER__TRADING__FEE=0.00075`
pub const ENV_PREFIX: &str = "EVOTRADER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub trading: TradingConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvotraderError> {
        self.evolution.validate()?;
        self.trading.validate()?;
        self.persistence.validate()?;
        Ok(())
    }
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

    /// Load a TOML file, then apply `EVOTRADER__SECTION__KEY` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvotraderError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvotraderError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)?;

        std::fs::write(path, toml_str)
            .map_err(|e| EvotraderError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), EvotraderError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
