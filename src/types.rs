use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const FEATURE_COUNT: usize = 17;

/// Every variable a formula may reference, in fixed index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // Scores
    LongTerm,
    Fundamentals,
    Dividends,
    Opportunity,
    ShortTerm,
    Technicals,
    Opinion,
    Diversification,
    TotalScore,
    // Metrics
    Cagr,
    DividendYield,
    Volatility,
    // Market regime, -1 (bear) to 1 (bull)
    Regime,
    // Optional metrics
    Sharpe,
    Sortino,
    Rsi,
    MaxDrawdown,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::LongTerm,
        Feature::Fundamentals,
        Feature::Dividends,
        Feature::Opportunity,
        Feature::ShortTerm,
        Feature::Technicals,
        Feature::Opinion,
        Feature::Diversification,
        Feature::TotalScore,
        Feature::Cagr,
        Feature::DividendYield,
        Feature::Volatility,
        Feature::Regime,
        Feature::Sharpe,
        Feature::Sortino,
        Feature::Rsi,
        Feature::MaxDrawdown,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LongTerm => "long_term",
            Self::Fundamentals => "fundamentals",
            Self::Dividends => "dividends",
            Self::Opportunity => "opportunity",
            Self::ShortTerm => "short_term",
            Self::Technicals => "technicals",
            Self::Opinion => "opinion",
            Self::Diversification => "diversification",
            Self::TotalScore => "total_score",
            Self::Cagr => "cagr",
            Self::DividendYield => "dividend_yield",
            Self::Volatility => "volatility",
            Self::Regime => "regime",
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Rsi => "rsi",
            Self::MaxDrawdown => "max_drawdown",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Optional metrics may be missing for a security.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Self::Sharpe | Self::Sortino | Self::Rsi | Self::MaxDrawdown
        )
    }

    /// The regime score keeps its native [-1, 1] scale.
    pub fn is_normalized(self) -> bool {
        self != Self::Regime
    }

    pub fn all_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature set observed for one security on one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingInputs {
    pub long_term: f64,
    pub fundamentals: f64,
    pub dividends: f64,
    pub opportunity: f64,
    pub short_term: f64,
    pub technicals: f64,
    pub opinion: f64,
    pub diversification: f64,
    pub total_score: f64,

    pub cagr: f64,
    pub dividend_yield: f64,
    pub volatility: f64,

    pub regime_score: f64,

    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub rsi: Option<f64>,
    pub max_drawdown: Option<f64>,
}

impl TrainingInputs {
    /// Value of a feature; `None` only for an absent optional metric.
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::LongTerm => Some(self.long_term),
            Feature::Fundamentals => Some(self.fundamentals),
            Feature::Dividends => Some(self.dividends),
            Feature::Opportunity => Some(self.opportunity),
            Feature::ShortTerm => Some(self.short_term),
            Feature::Technicals => Some(self.technicals),
            Feature::Opinion => Some(self.opinion),
            Feature::Diversification => Some(self.diversification),
            Feature::TotalScore => Some(self.total_score),
            Feature::Cagr => Some(self.cagr),
            Feature::DividendYield => Some(self.dividend_yield),
            Feature::Volatility => Some(self.volatility),
            Feature::Regime => Some(self.regime_score),
            Feature::Sharpe => self.sharpe,
            Feature::Sortino => self.sortino,
            Feature::Rsi => self.rsi,
            Feature::MaxDrawdown => self.max_drawdown,
        }
    }

    /// Sets a feature. `None` clears an optional metric and zeroes a required one.
    pub fn set(&mut self, feature: Feature, value: Option<f64>) {
        let required = value.unwrap_or(0.0);
        match feature {
            Feature::LongTerm => self.long_term = required,
            Feature::Fundamentals => self.fundamentals = required,
            Feature::Dividends => self.dividends = required,
            Feature::Opportunity => self.opportunity = required,
            Feature::ShortTerm => self.short_term = required,
            Feature::Technicals => self.technicals = required,
            Feature::Opinion => self.opinion = required,
            Feature::Diversification => self.diversification = required,
            Feature::TotalScore => self.total_score = required,
            Feature::Cagr => self.cagr = required,
            Feature::DividendYield => self.dividend_yield = required,
            Feature::Volatility => self.volatility = required,
            Feature::Regime => self.regime_score = required,
            Feature::Sharpe => self.sharpe = value,
            Feature::Sortino => self.sortino = value,
            Feature::Rsi => self.rsi = value,
            Feature::MaxDrawdown => self.max_drawdown = value,
        }
    }

    /// Dense feature vector indexed by `Feature::index`. Absent optional
    /// metrics read as 0.0.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        let mut values = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            values[feature.index()] = self.get(feature).unwrap_or(0.0);
        }
        values
    }

    /// Name-keyed view used by `Node::evaluate`. Absent optional metrics are
    /// left out of the map.
    pub fn to_variable_map(&self) -> HashMap<String, f64> {
        Feature::ALL
            .iter()
            .filter_map(|&f| self.get(f).map(|v| (f.name().to_string(), v)))
            .collect()
    }
}

/// One labelled observation: features as of `as_of`, realised return by `target_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub target_date: NaiveDate,
    pub inputs: TrainingInputs,
    pub target_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    Stock,
    Etf,
}

impl SecurityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stock" => Ok(Self::Stock),
            "etf" => Ok(Self::Etf),
            other => Err(format!("Unknown security type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_indices_follow_declaration_order() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(Feature::from_name(feature.name()), Some(*feature));
        }
        assert_eq!(Feature::from_name("stability"), None);
    }

    #[test]
    fn test_absent_optional_metric_reads_zero_in_vector() {
        let inputs = TrainingInputs {
            cagr: 0.12,
            rsi: Some(55.0),
            ..Default::default()
        };

        let vector = inputs.to_vector();
        assert_eq!(vector[Feature::Cagr.index()], 0.12);
        assert_eq!(vector[Feature::Rsi.index()], 55.0);
        assert_eq!(vector[Feature::Sharpe.index()], 0.0);

        let map = inputs.to_variable_map();
        assert!(map.contains_key("rsi"));
        assert!(!map.contains_key("sharpe"));
        assert_eq!(map.len(), FEATURE_COUNT - 3);
    }

    #[test]
    fn test_security_type_parsing() {
        assert_eq!("ETF".parse::<SecurityType>(), Ok(SecurityType::Etf));
        assert!("bond".parse::<SecurityType>().is_err());
    }
}
