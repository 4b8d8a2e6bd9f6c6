//! Errors raised by the allocation engine and the planner.
//!
//! Every variant is scoped to a single cycle: the caller drops the partially
//! built portfolio and tries again with the next snapshot.

use std::fmt;

use rust_decimal::Decimal;

/// Which half of a snapshot a lookup went to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    /// Wallet balance keyed by asset symbol.
    Balance,
    /// Ticker keyed by pair symbol.
    Ticker,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Balance => write!(f, "balance"),
            LookupKind::Ticker => write!(f, "ticker"),
        }
    }
}

/// Errors returned by [`compute`](crate::compute), [`plan`](crate::plan) and
/// [`validate_targets`](crate::validate_targets).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RebalanceError {
    /// Target weights violate the allocation invariants.
    #[error("config error: {0}")]
    Config(String),

    /// A required symbol or pair is absent from the snapshot.
    #[error("snapshot has no {kind} for {key}")]
    SnapshotLookup { kind: LookupKind, key: String },

    /// A ticker reported a price that cannot be used to size orders.
    #[error("unusable price {price} for {pair}")]
    InvalidPrice { pair: String, price: Decimal },

    /// The portfolio is worth nothing, so weights are undefined.
    #[error("net asset value is zero")]
    DegenerateNav,
}

pub type Result<T> = std::result::Result<T, RebalanceError>;
