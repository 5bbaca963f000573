pub mod traits;
pub mod evolution;
pub mod trading;
pub mod persistence;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, VariantConfig};
pub use trading::TradingConfig;
pub use persistence::PersistenceConfig;
pub use traits::ConfigSection;
