pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use engines::discovery::{DiscoveredFormula, DiscoveryRunner};
pub use engines::formula::{parse_formula, BoundFormula, Node};
pub use error::{DiscoveryError, ParseError, Result};
pub use types::{Feature, SecurityType, TrainingExample, TrainingInputs};
