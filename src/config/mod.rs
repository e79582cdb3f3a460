pub mod traits;
pub mod evolution;
pub mod discovery;
pub mod manager;

pub use traits::ConfigSection;
pub use manager::{AppConfig, ConfigManager, ENV_PREFIX};
pub use evolution::EvolutionConfig;
pub use discovery::DiscoveryConfig;
