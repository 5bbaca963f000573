use super::traits::{invalid, ConfigSection};
use crate::error::EvotraderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Directory holding one sub-directory per symbol
    pub root: PathBuf,
    pub symbol: String,
    /// Append-only generation log; disabled when unset
    pub run_log: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: PathBuf::from("checkpoints"),
            symbol: "BNBBTC".to_string(),
            run_log: None,
        }
    }
}

impl ConfigSection for PersistenceConfig {
    fn section_name() -> &'static str {
        "persistence"
    }

    fn validate(&self) -> Result<(), EvotraderError> {
        if self.symbol.trim().is_empty() {
            return Err(invalid::<Self>("symbol must not be empty"));
        }
        if self.symbol.contains(['/', '\\']) {
            return Err(invalid::<Self>("symbol must not contain path separators"));
        }
        Ok(())
    }
}
