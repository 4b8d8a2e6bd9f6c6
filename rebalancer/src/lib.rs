//! driftbook-rebalancer: periodic drift rebalancer for a portfolio held at a
//! single exchange.
//!
//! Reads target weights from a JSON file, snapshots balances and tickers,
//! and places market orders (sells first) whenever any asset drifts past the
//! trigger threshold. Runs until stopped by a signal.

pub mod broker;
pub mod config;
pub mod control;
pub mod error;
pub mod execution;
pub mod reconcile;
