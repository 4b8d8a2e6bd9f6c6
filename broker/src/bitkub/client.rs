//! Bitkub REST API client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::auth;
use super::types::{Envelope, PlaceOrderRequest, PlacedOrder, TickerEntry, WalletBalances};
use crate::error::BrokerError;
use rustc_hash::FxHashMap;

pub const DEFAULT_BASE_URL: &str = "https://api.bitkub.com";

const TICKER_PATH: &str = "/api/market/ticker";
const WALLET_PATH: &str = "/api/v3/market/wallet";
const PLACE_BID_PATH: &str = "/api/v3/market/place-bid";
const PLACE_ASK_PATH: &str = "/api/v3/market/place-ask";

/// Blocking Bitkub REST client.
pub struct BitkubClient {
    client: Client,
    api_key: String,
    secret_key: Zeroizing<String>,
    base_url: String,
}

impl BitkubClient {
    /// Create a new client. `base_url` is usually [`DEFAULT_BASE_URL`].
    pub fn new(
        api_key: &str,
        secret_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All tickers (GET /api/market/ticker). Public, unsigned.
    pub fn ticker(&self) -> Result<FxHashMap<String, TickerEntry>, BrokerError> {
        let url = format!("{}{TICKER_PATH}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| BrokerError::Connection(format!("ticker request failed: {e}")))?;

        let resp = check_status(resp, "ticker")?;
        resp.json::<FxHashMap<String, TickerEntry>>()
            .map_err(|e| BrokerError::Decode(format!("failed to parse ticker: {e}")))
    }

    /// Available balances (POST /api/v3/market/wallet).
    pub fn wallet(&self) -> Result<WalletBalances, BrokerError> {
        self.post_signed(WALLET_PATH, String::new())
    }

    /// Market buy spending `amount` of the quote currency (POST place-bid).
    pub fn place_bid(&self, sym: &str, amount: f64) -> Result<PlacedOrder, BrokerError> {
        let body = market_order_body(sym, amount)?;
        self.post_signed(PLACE_BID_PATH, body)
    }

    /// Market sell of `amount` base units (POST place-ask).
    pub fn place_ask(&self, sym: &str, amount: f64) -> Result<PlacedOrder, BrokerError> {
        let body = market_order_body(sym, amount)?;
        self.post_signed(PLACE_ASK_PATH, body)
    }

    fn post_signed<T: DeserializeOwned>(&self, path: &str, body: String) -> Result<T, BrokerError> {
        let timestamp = current_timestamp_ms();
        let payload = auth::signature_payload(timestamp, "POST", path, &body);
        let signature = auth::sign(&payload, &self.secret_key);
        let url = format!("{}{path}", self.base_url);

        debug!("POST {path} {body}");

        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("X-BTK-APIKEY", &self.api_key)
            .header("X-BTK-TIMESTAMP", timestamp.to_string())
            .header("X-BTK-SIGN", signature)
            .body(body)
            .send()
            .map_err(|e| BrokerError::Connection(format!("POST {path} failed: {e}")))?;

        let resp = check_status(resp, path)?;
        let envelope = resp
            .json::<Envelope<T>>()
            .map_err(|e| BrokerError::Decode(format!("failed to parse {path} response: {e}")))?;
        unwrap_envelope(envelope)
    }
}

/// JSON body for a market order. `rat = 0` with `typ = "market"`.
pub fn market_order_body(sym: &str, amount: f64) -> Result<String, BrokerError> {
    let request = PlaceOrderRequest {
        sym,
        amt: amount,
        rat: 0.0,
        typ: "market",
    };
    serde_json::to_string(&request)
        .map_err(|e| BrokerError::Order(format!("failed to encode order: {e}")))
}

/// Turn a `{error, result}` envelope into the result or a typed error.
pub fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, BrokerError> {
    match (envelope.error, envelope.result) {
        (0, Some(result)) => Ok(result),
        (0, None) => Err(BrokerError::Decode("response has no result".into())),
        (code @ (2 | 3 | 5 | 6 | 7 | 8), _) => Err(BrokerError::Auth(format!(
            "{} (code {code})",
            describe_error(code)
        ))),
        (code, _) => Err(BrokerError::Api {
            code,
            message: describe_error(code).to_string(),
        }),
    }
}

/// Human text for the documented Bitkub error codes.
pub fn describe_error(code: i64) -> &'static str {
    match code {
        0 => "no error",
        1 => "invalid JSON payload",
        2 => "missing X-BTK-APIKEY",
        3 => "invalid API key",
        4 => "API pending for activation",
        5 => "IP not allowed",
        6 => "missing or invalid signature",
        7 => "missing timestamp",
        8 => "invalid timestamp",
        9 => "invalid user",
        10 => "invalid parameter",
        11 => "invalid symbol",
        12 => "invalid amount",
        13 => "invalid rate",
        14 => "improper rate",
        15 => "amount too low",
        16 => "failed to get balance",
        17 => "wallet is empty",
        18 => "insufficient balance",
        19 => "failed to insert order into db",
        20 => "failed to deduct balance",
        21 => "invalid order for cancellation",
        22 => "invalid side",
        23 => "failed to update order status",
        24 => "invalid order for lookup",
        25 => "KYC level 1 is required to proceed",
        30 => "limit exceeds",
        90 => "server error (please contact support)",
        _ => "unknown error",
    }
}

fn check_status(resp: Response, what: &str) -> Result<Response, BrokerError> {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(BrokerError::RateLimit);
    }
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(BrokerError::Connection(format!(
            "{what} returned {status}: {body}"
        )));
    }
    Ok(resp)
}

/// Current timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
