use crate::types::Feature;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Columns a training-example CSV is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExampleColumn {
    Symbol,
    AsOf,
    TargetDate,
    TargetReturn,
    Feature(Feature),
}

impl ExampleColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::AsOf => "as_of",
            Self::TargetDate => "target_date",
            Self::TargetReturn => "target_return",
            Self::Feature(feature) => feature.name(),
        }
    }

    /// Columns that must be present. Optional metrics may be missing entirely.
    pub fn required() -> Vec<Self> {
        let mut columns = vec![Self::Symbol, Self::AsOf, Self::TargetDate, Self::TargetReturn];
        columns.extend(
            Feature::ALL
                .iter()
                .filter(|f| !f.is_optional())
                .map(|&f| Self::Feature(f)),
        );
        columns
    }

    pub fn optional() -> Vec<Self> {
        Feature::ALL
            .iter()
            .filter(|f| f.is_optional())
            .map(|&f| Self::Feature(f))
            .collect()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::TargetReturn | Self::Feature(_))
    }

    /// Common alternative column names
    pub fn aliases(&self) -> Vec<&'static str> {
        match self {
            Self::Symbol => vec!["symbol", "Symbol", "SYMBOL", "ticker"],
            Self::AsOf => vec!["as_of", "date", "Date"],
            Self::TargetDate => vec!["target_date"],
            Self::TargetReturn => vec!["target_return", "return"],
            Self::Feature(Feature::Regime) => vec!["regime", "regime_score"],
            Self::Feature(feature) => vec![feature.name()],
        }
    }
}

/// Summary of a loaded example file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: Vec<String>,
    pub symbols: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Optional metric columns absent from the file.
    pub missing_optional: Vec<String>,
}
