use crate::error::{DiscoveryError, Result};
use polars::prelude::*;
use super::types::ExampleColumn;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Resolves every required column (and any optional metric present) to its
    /// actual name, checking numeric columns are numeric.
    pub fn validate_examples(df: &DataFrame) -> Result<HashMap<ExampleColumn, String>> {
        let mut column_map = HashMap::new();

        for required in ExampleColumn::required() {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name.to_string());
                }
                None => {
                    return Err(DiscoveryError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        for optional in ExampleColumn::optional() {
            if let Some(col_name) = Self::find_column(df, &optional) {
                column_map.insert(optional, col_name.to_string());
            }
        }

        for (column, actual_name) in &column_map {
            if !column.is_numeric() {
                continue;
            }
            let series = df.column(actual_name)?;
            // An all-null column is inferred as String
            if series.null_count() == series.len() {
                continue;
            }
            if !matches!(
                series.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::UInt64
                    | DataType::UInt32
            ) {
                return Err(DiscoveryError::DataLoading(format!(
                    "Column '{}' ({}) must be numeric, found {:?}",
                    actual_name,
                    column.as_str(),
                    series.dtype()
                )));
            }
        }

        Ok(column_map)
    }

    /// Find column by checking aliases
    fn find_column(df: &DataFrame, column: &ExampleColumn) -> Option<&'static str> {
        let columns = df.get_column_names();
        column
            .aliases()
            .into_iter()
            .find(|alias| columns.iter().any(|col| col.as_str() == *alias))
    }

    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(DiscoveryError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Null counts per column, for columns that have any.
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for col_name in df.get_column_names() {
            let series = df.column(col_name)?;
            let null_count = series.null_count();
            if null_count > 0 {
                null_report.push((col_name.to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feature;
    use polars::df;

    fn frame() -> DataFrame {
        df! {
            "symbol" => &["AAA", "BBB"],
            "as_of" => &["2021-01-29", "2021-01-29"],
            "target_date" => &["2022-01-31", "2022-01-31"],
            "long_term" => &[0.7, 0.4],
            "fundamentals" => &[0.6, 0.5],
            "dividends" => &[0.2, 0.1],
            "opportunity" => &[0.5, 0.3],
            "short_term" => &[0.4, 0.6],
            "technicals" => &[0.5, 0.5],
            "opinion" => &[0.6, 0.4],
            "diversification" => &[0.8, 0.2],
            "total_score" => &[0.6, 0.4],
            "cagr" => &[0.12, 0.05],
            "dividend_yield" => &[0.02, 0.0],
            "volatility" => &[0.25, 0.4],
            "regime_score" => &[0.1, 0.1],
            "target_return" => &[0.09, -0.03],
        }
        .unwrap()
    }

    #[test]
    fn test_validate_good_data() {
        let map = DataValidator::validate_examples(&frame()).unwrap();
        assert_eq!(map[&ExampleColumn::Feature(Feature::Regime)], "regime_score");
        assert!(!map.contains_key(&ExampleColumn::Feature(Feature::Sharpe)));
    }

    #[test]
    fn test_validate_missing_column() {
        let df = frame().drop("cagr").unwrap();
        let result = DataValidator::validate_examples(&df);
        assert!(matches!(result, Err(DiscoveryError::DataLoading(_))));
    }

    #[test]
    fn test_validate_non_numeric_feature() {
        let mut df = frame();
        df.with_column(Series::new("volatility".into(), &["high", "low"]))
            .unwrap();
        assert!(DataValidator::validate_examples(&df).is_err());
    }

    #[test]
    fn test_minimum_rows() {
        assert!(DataValidator::validate_minimum_rows(&frame(), 2).is_ok());
        assert!(DataValidator::validate_minimum_rows(&frame(), 3).is_err());
    }
}
