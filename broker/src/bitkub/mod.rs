//! Bitkub spot exchange implementation.

pub mod auth;
pub mod client;
pub mod types;

use std::time::Duration;

use driftbook::{OrderSide, Ticker, decimal_from_f64};
use log::info;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rustc_hash::FxHashMap;

use crate::error::BrokerError;
use crate::types::OrderAck;
use crate::{OrderGateway, SnapshotProvider};
use client::BitkubClient;

/// Bitkub exchange implementing the snapshot and order traits.
///
/// Pair symbols use the ticker form `"THB_BTC"`; orders are translated to
/// the v3 form `"btc_thb"`.
pub struct BitkubExchange {
    client: BitkubClient,
}

impl BitkubExchange {
    pub fn new(
        api_key: &str,
        secret_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            client: BitkubClient::new(api_key, secret_key, base_url, timeout)?,
        })
    }

    /// Underlying REST client.
    pub fn client(&self) -> &BitkubClient {
        &self.client
    }

    fn place(&self, pair: &str, side: OrderSide, amount: Decimal) -> Result<OrderAck, BrokerError> {
        let sym = to_order_symbol(pair)?;
        let amt = amount
            .to_f64()
            .ok_or_else(|| BrokerError::Order(format!("amount {amount} not representable")))?;

        let placed = match side {
            OrderSide::Sell => self.client.place_ask(&sym, amt)?,
            OrderSide::Buy => self.client.place_bid(&sym, amt)?,
        };
        info!("Bitkub accepted {side} {sym} amt={amt} id={}", placed.id);

        Ok(OrderAck {
            id: placed.id,
            pair: pair.to_string(),
            side,
            amount,
            received: placed.rec.and_then(decimal_from_f64),
        })
    }
}

impl SnapshotProvider for BitkubExchange {
    fn wallet_balance(&self) -> Result<FxHashMap<String, Decimal>, BrokerError> {
        self.client
            .wallet()?
            .into_iter()
            .map(|(asset, qty)| Ok((asset, to_decimal(qty, "balance")?)))
            .collect()
    }

    fn tickers(&self) -> Result<FxHashMap<String, Ticker>, BrokerError> {
        self.client
            .ticker()?
            .into_iter()
            .map(|(pair, entry)| {
                let ticker = Ticker {
                    last: to_decimal(entry.last, "last price")?,
                    lowest_ask: entry.lowest_ask.and_then(decimal_from_f64),
                    highest_bid: entry.highest_bid.and_then(decimal_from_f64),
                };
                Ok((pair, ticker))
            })
            .collect()
    }
}

impl OrderGateway for BitkubExchange {
    fn place_ask(&self, pair: &str, quantity: Decimal) -> Result<OrderAck, BrokerError> {
        self.place(pair, OrderSide::Sell, quantity)
    }

    fn place_bid(&self, pair: &str, quote_amount: Decimal) -> Result<OrderAck, BrokerError> {
        self.place(pair, OrderSide::Buy, quote_amount)
    }
}

/// `"THB_BTC"` → `"btc_thb"`.
pub fn to_order_symbol(pair: &str) -> Result<String, BrokerError> {
    match pair.split_once('_') {
        Some((quote, base)) if !quote.is_empty() && !base.is_empty() => {
            Ok(format!("{base}_{quote}").to_lowercase())
        }
        _ => Err(BrokerError::InvalidSymbol(pair.to_string())),
    }
}

fn to_decimal(value: f64, what: &str) -> Result<Decimal, BrokerError> {
    decimal_from_f64(value).ok_or_else(|| BrokerError::Decode(format!("unusable {what}: {value}")))
}
