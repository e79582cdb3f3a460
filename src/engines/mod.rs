pub mod discovery;
pub mod formula;
pub mod generation;
pub mod metrics;
pub mod preprocessing;
