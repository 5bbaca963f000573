use super::traits::{invalid, ConfigSection};
use crate::error::EvotraderError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Fee charged on each leg of a round trip
    pub fee: f64,
    /// Steps allowed without closing a trade before an agent dies
    pub stagnation_limit: u64,
    /// Weight of realized profit in the end-of-pass score
    pub fitness_scale: f64,
    /// Feature rows fed to the policy per step
    pub window_rows: usize,
    /// Feature column used as the trade price, counted after exclusions
    pub price_column: usize,
    /// Feature-table columns that are not policy inputs
    pub exclude_columns: Vec<String>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            fee: 0.001,
            stagnation_limit: 120,
            fitness_scale: 100_000.0,
            window_rows: 50,
            price_column: 0,
            exclude_columns: vec!["close_time".to_string()],
        }
    }
}

impl ConfigSection for TradingConfig {
    fn section_name() -> &'static str {
        "trading"
    }

    fn validate(&self) -> Result<(), EvotraderError> {
        if !(0.0..1.0).contains(&self.fee) {
            return Err(invalid::<Self>("fee must be in [0, 1)"));
        }
        if self.stagnation_limit == 0 {
            return Err(invalid::<Self>("stagnation_limit must be at least 1"));
        }
        if !self.fitness_scale.is_finite() || self.fitness_scale <= 0.0 {
            return Err(invalid::<Self>("fitness_scale must be positive"));
        }
        if self.window_rows == 0 {
            return Err(invalid::<Self>("window_rows must be at least 1"));
        }
        Ok(())
    }
}
