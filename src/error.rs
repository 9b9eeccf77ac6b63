//! Error types for mapcheck

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// mapcheck errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Code parse error: {0}")]
    CodeParse(String),

    #[error("Type syntax error: {0}")]
    TypeSyntax(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Rule {rule} failed: {message}")]
    Rule { rule: String, message: String },

    #[error("Fix error: {0}")]
    Fix(String),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
