use chromiumoxide::error::CdpError;
use icdwalk_core::HarvestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] CdpError),

    #[error("Timed out after {1:?} waiting for {0}")]
    Timeout(String, std::time::Duration),

    #[error(transparent)]
    Harvest(#[from] HarvestError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Surface a CDP failure through the walker's error type.
pub(crate) fn automation(e: CdpError) -> HarvestError {
    HarvestError::Automation(e.to_string())
}
