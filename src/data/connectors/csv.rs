use crate::error::{DiscoveryError, Result};
use crate::types::{Feature, TrainingExample, TrainingInputs};
use polars::prelude::*;
use std::path::Path;
use super::{
    types::{DatasetMetadata, ExampleColumn},
    validator::DataValidator,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| DiscoveryError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load a CSV of labelled observations and build training examples from it.
    pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
        Self::load_examples_with_metadata(path).map(|(examples, _)| examples)
    }

    /// Like `load_examples`, also returning a summary of the file.
    pub fn load_examples_with_metadata<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Vec<TrainingExample>, DatasetMetadata)> {
        let df = Self::load(&path)?;
        let metadata = Self::create_metadata(&path, &df)?;
        log::info!(
            "Loaded {} rows x {} columns ({} symbols) from {}",
            metadata.num_rows,
            metadata.num_columns,
            metadata.symbols,
            metadata.file_path
        );
        if !metadata.missing_optional.is_empty() {
            log::info!("Optional columns absent: {}", metadata.missing_optional.join(", "));
        }

        let examples = Self::examples_from_frame(&df)?;
        Ok((examples, metadata))
    }

    /// Rows with a null in any required column are dropped with a warning.
    /// Null or missing optional metrics become `None`.
    pub fn examples_from_frame(df: &DataFrame) -> Result<Vec<TrainingExample>> {
        let column_map = DataValidator::validate_examples(df)?;

        let null_report = DataValidator::check_nulls(df)?;
        if !null_report.is_empty() {
            log::warn!("Null values detected: {:?}", null_report);
        }

        let symbols = Self::string_column(df, &column_map[&ExampleColumn::Symbol])?;
        let as_of_dates = Self::string_column(df, &column_map[&ExampleColumn::AsOf])?;
        let target_dates = Self::string_column(df, &column_map[&ExampleColumn::TargetDate])?;
        let target_returns = Self::float_column(df, &column_map[&ExampleColumn::TargetReturn])?;

        let mut features: HashMap<Feature, Vec<Option<f64>>> = HashMap::new();
        for feature in Feature::ALL {
            if let Some(name) = column_map.get(&ExampleColumn::Feature(feature)) {
                features.insert(feature, Self::float_column(df, name)?);
            }
        }

        let mut examples = Vec::with_capacity(df.height());
        let mut dropped = 0;

        'rows: for i in 0..df.height() {
            let (Some(symbol), Some(as_of), Some(target_date), Some(target_return)) = (
                symbols[i].as_ref(),
                as_of_dates[i].as_ref(),
                target_dates[i].as_ref(),
                target_returns[i],
            ) else {
                dropped += 1;
                continue;
            };

            let mut inputs = TrainingInputs::default();
            for feature in Feature::ALL {
                let value = features.get(&feature).and_then(|values| values[i]);
                if value.is_none() && !feature.is_optional() {
                    dropped += 1;
                    continue 'rows;
                }
                inputs.set(feature, value);
            }

            let as_of = Self::parse_date(as_of, i)?;
            let target_date = Self::parse_date(target_date, i)?;
            if target_date < as_of {
                log::warn!(
                    "Row {} ({}): target date {} precedes as-of date {}",
                    i, symbol, target_date, as_of
                );
            }

            examples.push(TrainingExample {
                symbol: symbol.clone(),
                as_of,
                target_date,
                inputs,
                target_return,
            });
        }

        if dropped > 0 {
            log::warn!("Dropped {} row(s) with missing required values", dropped);
        }

        Ok(examples)
    }

    /// Create metadata for a loaded DataFrame
    pub fn create_metadata<P: AsRef<Path>>(path: P, df: &DataFrame) -> Result<DatasetMetadata> {
        let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let column_map = DataValidator::validate_examples(df)?;

        let symbols: HashSet<String> = Self::string_column(df, &column_map[&ExampleColumn::Symbol])?
            .into_iter()
            .flatten()
            .collect();

        let dates: Vec<NaiveDate> = Self::string_column(df, &column_map[&ExampleColumn::AsOf])?
            .iter()
            .enumerate()
            .filter_map(|(i, value)| value.as_ref().map(|v| Self::parse_date(v, i)))
            .collect::<Result<_>>()?;
        let date_range = dates
            .iter()
            .min()
            .zip(dates.iter().max())
            .map(|(min, max)| (*min, *max));

        let missing_optional = ExampleColumn::optional()
            .into_iter()
            .filter(|column| !column_map.contains_key(column))
            .map(|column| column.as_str().to_string())
            .collect();

        Ok(DatasetMetadata {
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: df.height(),
            num_columns: df.width(),
            columns,
            symbols: symbols.len(),
            date_range,
            missing_optional,
        })
    }

    fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values = series.f64()?;
        Ok((0..values.len()).map(|i| values.get(i)).collect())
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let series = df.column(name)?.cast(&DataType::String)?;
        let values = series.str()?;
        Ok((0..values.len())
            .map(|i| values.get(i).map(|s| s.to_string()))
            .collect())
    }

    /// Accepts `YYYY-MM-DD`, ignoring any trailing time component.
    fn parse_date(value: &str, row: usize) -> Result<NaiveDate> {
        let trimmed = value.trim();
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            DiscoveryError::DataLoading(format!("Invalid date '{}' at row {}: {}", value, row, e))
        })
    }
}
