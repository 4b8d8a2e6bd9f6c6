//! # driftbook
//!
//! Drift detection and rebalance planning for a multi-asset portfolio held at
//! a single exchange.
//!
//! One cycle is three pure steps:
//!
//! 1. [`compute`]: turn a [`Snapshot`] of balances and tickers plus the
//!    configured [`AssetTarget`]s into a [`Portfolio`].
//! 2. [`plan`]: derive current weights, check drift against a threshold and,
//!    when triggered, size the sell and buy orders that restore the targets.
//! 3. Execute [`RebalancePlan::orders`] (sells first) through a gateway. That
//!    part lives in `driftbook-broker` and `driftbook-rebalancer`.
//!
//! ## Quick Start
//!
//! ```
//! use driftbook::{AssetTarget, Snapshot, compute, plan};
//! use rust_decimal::Decimal;
//!
//! let targets = vec![
//!     AssetTarget::new("BTC", Decimal::new(4, 1)),
//!     AssetTarget::new("ETH", Decimal::new(6, 1)),
//! ];
//! let snapshot = Snapshot::default()
//!     .with_balance("BTC", Decimal::from(1))
//!     .with_balance("ETH", Decimal::from(10))
//!     .with_price("THB_BTC", Decimal::from(30_000))
//!     .with_price("THB_ETH", Decimal::from(2_000));
//!
//! let mut portfolio = compute(&targets, &snapshot, "THB").unwrap();
//! assert_eq!(portfolio.net_asset_value(), Decimal::from(50_000));
//!
//! let plan = plan(&mut portfolio, Decimal::new(5, 2)).unwrap();
//! assert!(plan.triggered);
//! assert_eq!(plan.buys[0].pair, "THB_ETH");
//! assert_eq!(plan.buys[0].amount, Decimal::from(10_000));
//! ```
//!
//! ## Weights
//!
//! The last configured target absorbs the remainder: its effective weight is
//! `1 - sum(others)` regardless of what was configured for it.
//!
//! ## Rounding
//!
//! Sell quantities and buy quote amounts are truncated toward zero, so the
//! planner under-trades rather than over-trades.

pub mod allocation;
pub mod error;
pub mod plan;
pub mod portfolio;
pub mod snapshot;

pub use allocation::{compute, validate_targets};
pub use error::{LookupKind, RebalanceError, Result};
pub use plan::{OrderInstruction, OrderSide, RebalancePlan, plan};
pub use portfolio::{AssetState, AssetTarget, Portfolio};
pub use snapshot::{Snapshot, Ticker, decimal_from_f64, pair_symbol};
