use crate::error::{DiscoveryError, Result};
use crate::types::TrainingExample;
use chrono::NaiveDate;

/// Training / validation partition of a set of examples.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train: Vec<TrainingExample>,
    pub validation: Vec<TrainingExample>,
    pub train_end: NaiveDate,
    pub validation_start: NaiveDate,
}

/// Splits examples in as-of date order, the earliest `train_fraction` for
/// training and the rest for out-of-sample validation.
pub struct ChronologicalSplitter {
    train_fraction: f64,
}

impl ChronologicalSplitter {
    pub fn new(train_fraction: f64) -> Self {
        Self { train_fraction }
    }

    pub fn train_fraction(&self) -> f64 {
        self.train_fraction
    }

    pub fn train_rows(&self, total: usize) -> usize {
        (total as f64 * self.train_fraction) as usize
    }

    /// True when `total` examples leave at least one row on each side.
    pub fn can_split(&self, total: usize) -> bool {
        let train_rows = self.train_rows(total);
        train_rows > 0 && train_rows < total
    }

    pub fn split(&self, examples: &[TrainingExample]) -> Result<DataSplit> {
        let total = examples.len();
        let train_rows = self.train_rows(total);

        if !self.can_split(total) {
            return Err(DiscoveryError::Validation(format!(
                "Invalid split: {} of {} examples assigned to training",
                train_rows, total
            )));
        }

        let mut ordered = examples.to_vec();
        ordered.sort_by_key(|e| e.as_of);
        let validation = ordered.split_off(train_rows);

        let train_end = ordered[train_rows - 1].as_of;
        let validation_start = validation[0].as_of;

        Ok(DataSplit {
            train: ordered,
            validation,
            train_end,
            validation_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrainingInputs;

    fn example(day: u32) -> TrainingExample {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        TrainingExample {
            symbol: format!("S{}", day),
            as_of: date,
            target_date: date,
            inputs: TrainingInputs::default(),
            target_return: day as f64,
        }
    }

    #[test]
    fn test_split_is_chronological() {
        let examples: Vec<_> = [5, 1, 9, 3, 7, 2, 8, 4, 6, 10].iter().map(|&d| example(d)).collect();
        let split = ChronologicalSplitter::new(0.5).split(&examples).unwrap();

        assert_eq!(split.train.len(), 5);
        assert_eq!(split.validation.len(), 5);
        assert!(split.train.iter().all(|e| e.as_of <= split.train_end));
        assert!(split.validation.iter().all(|e| e.as_of >= split.validation_start));
        assert!(split.train_end < split.validation_start);
    }

    #[test]
    fn test_degenerate_split_rejected() {
        let examples = vec![example(1)];
        assert!(ChronologicalSplitter::new(0.8).split(&examples).is_err());
        assert!(ChronologicalSplitter::new(1.0).split(&[example(1), example(2)]).is_err());
    }

    #[test]
    fn test_can_split_matches_split() {
        let splitter = ChronologicalSplitter::new(0.4);
        assert!(!splitter.can_split(2));
        assert!(splitter.can_split(3));
        assert!(splitter.split(&[example(1), example(2)]).is_err());
        assert!(splitter.split(&[example(1), example(2), example(3)]).is_ok());
    }
}
