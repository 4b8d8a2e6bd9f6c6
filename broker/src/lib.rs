//! Exchange-facing traits and implementations for driftbook.
//!
//! The rebalancer talks to an exchange through two narrow traits:
//!
//! - [`SnapshotProvider`]: wallet balances and tickers
//! - [`OrderGateway`]: market sells sized in base units and market buys
//!   sized in quote currency
//!
//! Implementations:
//!
//! - **Mock** ([`mock::MockExchange`]): in-memory, for tests
//! - **Bitkub** (feature `bitkub`): Bitkub REST API, blocking

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "bitkub")]
pub mod bitkub;

pub use error::BrokerError;
pub use types::*;

use driftbook::{OrderInstruction, OrderSide, Snapshot, Ticker};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

/// Source of balances and prices.
pub trait SnapshotProvider {
    /// Quantity held per asset symbol.
    fn wallet_balance(&self) -> Result<FxHashMap<String, Decimal>, BrokerError>;

    /// Ticker per pair symbol (`"THB_BTC"`).
    fn tickers(&self) -> Result<FxHashMap<String, Ticker>, BrokerError>;

    /// Balances, then tickers, back to back.
    fn snapshot(&self) -> Result<Snapshot, BrokerError> {
        let balances = self.wallet_balance()?;
        let tickers = self.tickers()?;
        Ok(Snapshot::new(balances, tickers))
    }
}

/// Places market orders. Each call stands alone; a failure has no effect on
/// other calls.
pub trait OrderGateway {
    /// Sell `quantity` base units of `pair`.
    fn place_ask(&self, pair: &str, quantity: Decimal) -> Result<OrderAck, BrokerError>;

    /// Buy `pair` spending `quote_amount` of the quote currency.
    fn place_bid(&self, pair: &str, quote_amount: Decimal) -> Result<OrderAck, BrokerError>;

    /// Dispatch a planned instruction to the matching side.
    fn place(&self, instruction: &OrderInstruction) -> Result<OrderAck, BrokerError> {
        match instruction.side {
            OrderSide::Sell => self.place_ask(&instruction.pair, instruction.amount),
            OrderSide::Buy => self.place_bid(&instruction.pair, instruction.amount),
        }
    }
}

/// Anything that can both snapshot and trade.
pub trait Exchange: SnapshotProvider + OrderGateway {}

impl<T: SnapshotProvider + OrderGateway + ?Sized> Exchange for T {}
