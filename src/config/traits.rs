use crate::error::EvotraderError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EvotraderError>;
}

/// Shorthand for a section validation failure
pub(crate) fn invalid<S: ConfigSection>(message: impl std::fmt::Display) -> EvotraderError {
    EvotraderError::Configuration(format!("[{}] {}", S::section_name(), message))
}
