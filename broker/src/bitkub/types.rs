//! Bitkub-specific request and response types.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Every private endpoint wraps its payload in `{"error": n, "result": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub error: i64,
    pub result: Option<T>,
}

/// `POST /api/v3/market/wallet` result: available balance per asset.
pub type WalletBalances = FxHashMap<String, f64>;

/// One entry of `GET /api/market/ticker`, keyed by pair (`"THB_BTC"`).
/// Volume and change fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub last: f64,
    #[serde(default)]
    pub lowest_ask: Option<f64>,
    #[serde(default)]
    pub highest_bid: Option<f64>,
}

/// Body of `place-bid` / `place-ask`. Field order is the signed byte order.
#[derive(Debug, Serialize)]
pub struct PlaceOrderRequest<'a> {
    pub sym: &'a str,
    pub amt: f64,
    pub rat: f64,
    pub typ: &'a str,
}

/// Result of `place-bid` / `place-ask`.
#[derive(Debug, Deserialize)]
pub struct PlacedOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Amount to receive after the fill.
    #[serde(default)]
    pub rec: Option<f64>,
}

/// Order ids are strings in v3 and were numbers in older responses.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
