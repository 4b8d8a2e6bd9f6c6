//! Error types for the rebalancer.

use std::path::PathBuf;

use driftbook::RebalanceError;
use driftbook_broker::BrokerError;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Rebalance(#[from] RebalanceError),

    #[error("exchange error: {0}")]
    Broker(#[from] BrokerError),

    #[error("{count} consecutive cycles failed, last error: {last}")]
    TooManyFailures { count: u32, last: String },

    #[error("failed to install signal handler: {0}")]
    Signal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
