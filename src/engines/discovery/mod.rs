pub mod record;
pub mod runner;

pub use record::DiscoveredFormula;
pub use runner::DiscoveryRunner;
