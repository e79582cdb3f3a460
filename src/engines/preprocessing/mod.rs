pub mod normalizer;
pub mod regime;
pub mod splitter;

pub use normalizer::{normalize_features, FeatureNormalizer, FeatureRange};
pub use regime::{
    classify_regime, default_regime_ranges, filter_by_regime_range, split_by_regime, RegimeRange,
};
pub use splitter::{ChronologicalSplitter, DataSplit};
