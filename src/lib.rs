pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod persistence;
pub mod types;

pub use config::{AppConfig, ConfigManager};
pub use data::FeatureFeed;
pub use engines::generation::PopulationManager;
pub use engines::policy::Policy;
pub use engines::simulation::{Agent, Cohort};
pub use error::{EvotraderError, Result};
