use thiserror::Error;

/// Failures produced while turning formula text into a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Empty formula")]
    EmptyInput,

    #[error("Invalid number literal: {text}")]
    InvalidNumber { text: String },

    #[error("Unmatched parenthesis at token {position}")]
    UnmatchedParen { position: usize },

    #[error("Function {function} expects {expected} argument(s), got {found}")]
    WrongArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Unexpected trailing input at token {position}")]
    TrailingTokens { position: usize },

    #[error("Unexpected token at {position}: {found}")]
    UnexpectedToken { position: usize, found: String },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
