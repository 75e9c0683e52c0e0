use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Browser automation failed: {0}")]
    Automation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Expansion of '{label}' produced no children within {waited:?}")]
    ExpansionFailed {
        label: String,
        path: Option<String>,
        waited: Duration,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
