mod csv;
mod types;
mod validator;

pub use csv::CsvConnector;
pub use types::{DatasetMetadata, ExampleColumn};
pub use validator::DataValidator;
