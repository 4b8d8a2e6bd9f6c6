//! Broker error types.

/// Errors that can occur talking to an exchange.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("authentication error: {0}")]
    Auth(String),

    /// The exchange answered but reported an error code.
    #[error("exchange error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("rate limit exceeded")]
    RateLimit,
}
