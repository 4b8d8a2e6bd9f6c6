//! Mock exchange for testing: implements [`SnapshotProvider`] and
//! [`OrderGateway`] with configurable behavior.
//!
//! Use this in integration tests to simulate an exchange without network calls.
//!
//! ```
//! use driftbook_broker::mock::{FillMode, MockExchange};
//! use driftbook_broker::SnapshotProvider;
//! use rust_decimal::Decimal;
//!
//! let exchange = MockExchange::builder()
//!     .fill_mode(FillMode::Immediate)
//!     .with_balance("BTC", Decimal::ONE)
//!     .with_price("THB_BTC", Decimal::from(1_000_000))
//!     .build();
//!
//! let snapshot = exchange.snapshot().unwrap();
//! assert_eq!(snapshot.balance("BTC"), Some(Decimal::ONE));
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use driftbook::{OrderSide, Ticker};
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::BrokerError;
use crate::types::OrderAck;
use crate::{OrderGateway, SnapshotProvider};

/// How the mock handles placed orders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Fill at the last price and move balances accordingly.
    Immediate,
    /// Acknowledge without touching balances.
    AckOnly,
    /// Reject every order.
    Reject,
}

/// A recorded order submission for assertion in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedOrder {
    pub pair: String,
    pub side: OrderSide,
    pub amount: Decimal,
}

/// Builder for [`MockExchange`].
pub struct MockExchangeBuilder {
    fill_mode: FillMode,
    balances: FxHashMap<String, Decimal>,
    tickers: FxHashMap<String, Ticker>,
    rejected_pairs: FxHashSet<String>,
    snapshot_limit: Option<usize>,
    failing_wallet_calls: FxHashSet<usize>,
}

impl MockExchangeBuilder {
    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    pub fn with_balance(mut self, symbol: &str, quantity: Decimal) -> Self {
        self.balances.insert(symbol.to_string(), quantity);
        self
    }

    pub fn with_price(mut self, pair: &str, last: Decimal) -> Self {
        self.tickers.insert(pair.to_string(), Ticker::last(last));
        self
    }

    /// Orders for `pair` fail with an exchange error.
    pub fn reject_pair(mut self, pair: &str) -> Self {
        self.rejected_pairs.insert(pair.to_string());
        self
    }

    /// Serve only `n` wallet-balance calls, then fail with a connection error.
    pub fn snapshots_before_failure(mut self, n: usize) -> Self {
        self.snapshot_limit = Some(n);
        self
    }

    /// Fail exactly the wallet-balance calls at these zero-based positions;
    /// every other call succeeds.
    pub fn failing_wallet_calls(mut self, calls: &[usize]) -> Self {
        self.failing_wallet_calls.extend(calls.iter().copied());
        self
    }

    pub fn build(self) -> MockExchange {
        MockExchange {
            fill_mode: self.fill_mode,
            balances: Mutex::new(self.balances),
            tickers: Mutex::new(self.tickers),
            rejected_pairs: self.rejected_pairs,
            snapshot_limit: self.snapshot_limit,
            failing_wallet_calls: self.failing_wallet_calls,
            wallet_calls: Mutex::new(0),
            submitted_orders: Mutex::new(Vec::new()),
        }
    }
}

/// An in-memory exchange that records placed orders.
pub struct MockExchange {
    fill_mode: FillMode,
    balances: Mutex<FxHashMap<String, Decimal>>,
    tickers: Mutex<FxHashMap<String, Ticker>>,
    rejected_pairs: FxHashSet<String>,
    snapshot_limit: Option<usize>,
    failing_wallet_calls: FxHashSet<usize>,
    wallet_calls: Mutex<usize>,
    submitted_orders: Mutex<Vec<RecordedOrder>>,
}

impl MockExchange {
    pub fn builder() -> MockExchangeBuilder {
        MockExchangeBuilder {
            fill_mode: FillMode::Immediate,
            balances: FxHashMap::default(),
            tickers: FxHashMap::default(),
            rejected_pairs: FxHashSet::default(),
            snapshot_limit: None,
            failing_wallet_calls: FxHashSet::default(),
        }
    }

    /// All orders that were submitted, including rejected ones.
    pub fn submitted_orders(&self) -> Vec<RecordedOrder> {
        lock(&self.submitted_orders).clone()
    }

    /// Current balance of `symbol` (zero when absent).
    pub fn balance(&self, symbol: &str) -> Decimal {
        lock(&self.balances)
            .get(symbol)
            .copied()
            .unwrap_or_default()
    }

    /// Move the last price of `pair`, e.g. to simulate drift between cycles.
    pub fn set_price(&self, pair: &str, last: Decimal) {
        lock(&self.tickers).insert(pair.to_string(), Ticker::last(last));
    }

    fn record_and_fill(
        &self,
        pair: &str,
        side: OrderSide,
        amount: Decimal,
    ) -> Result<OrderAck, BrokerError> {
        let id = {
            let mut orders = lock(&self.submitted_orders);
            orders.push(RecordedOrder {
                pair: pair.to_string(),
                side,
                amount,
            });
            orders.len()
        };

        if self.fill_mode == FillMode::Reject || self.rejected_pairs.contains(pair) {
            return Err(BrokerError::Api {
                code: 19,
                message: format!("mock: order for {pair} rejected"),
            });
        }

        let (fiat, asset) = pair
            .split_once('_')
            .ok_or_else(|| BrokerError::InvalidSymbol(pair.to_string()))?;
        let price = lock(&self.tickers)
            .get(pair)
            .map(|t| t.last)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| BrokerError::InvalidSymbol(pair.to_string()))?;

        let received = match side {
            OrderSide::Sell => amount * price,
            OrderSide::Buy => amount / price,
        };

        if self.fill_mode == FillMode::Immediate {
            let mut balances = lock(&self.balances);
            let (debit_symbol, credit_symbol) = match side {
                OrderSide::Sell => (asset, fiat),
                OrderSide::Buy => (fiat, asset),
            };
            let available = balances.get(debit_symbol).copied().unwrap_or_default();
            if available < amount {
                return Err(BrokerError::Api {
                    code: 18,
                    message: "insufficient balance".into(),
                });
            }
            balances.insert(debit_symbol.to_string(), available - amount);
            *balances.entry(credit_symbol.to_string()).or_default() += received;
        }

        Ok(OrderAck {
            id: id.to_string(),
            pair: pair.to_string(),
            side,
            amount,
            received: Some(received),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SnapshotProvider for MockExchange {
    fn wallet_balance(&self) -> Result<FxHashMap<String, Decimal>, BrokerError> {
        let call = {
            let mut calls = lock(&self.wallet_calls);
            *calls += 1;
            *calls - 1
        };
        if self.snapshot_limit.is_some_and(|limit| call >= limit)
            || self.failing_wallet_calls.contains(&call)
        {
            return Err(BrokerError::Connection("mock: wallet unavailable".into()));
        }
        Ok(lock(&self.balances).clone())
    }

    fn tickers(&self) -> Result<FxHashMap<String, Ticker>, BrokerError> {
        Ok(lock(&self.tickers).clone())
    }
}

impl OrderGateway for MockExchange {
    fn place_ask(&self, pair: &str, quantity: Decimal) -> Result<OrderAck, BrokerError> {
        self.record_and_fill(pair, OrderSide::Sell, quantity)
    }

    fn place_bid(&self, pair: &str, quote_amount: Decimal) -> Result<OrderAck, BrokerError> {
        self.record_and_fill(pair, OrderSide::Buy, quote_amount)
    }
}
