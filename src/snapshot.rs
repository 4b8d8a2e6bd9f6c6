//! Point-in-time view of wallet balances and tickers.

use std::str::FromStr;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

/// Last traded price plus best bid/ask when the exchange reports them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticker {
    pub last: Decimal,
    pub lowest_ask: Option<Decimal>,
    pub highest_bid: Option<Decimal>,
}

impl Ticker {
    /// Ticker carrying only a last price.
    pub fn last(price: Decimal) -> Self {
        Self {
            last: price,
            lowest_ask: None,
            highest_bid: None,
        }
    }
}

/// Balances keyed by asset symbol (`"BTC"`) and tickers keyed by pair
/// symbol (`"THB_BTC"`), read at roughly the same instant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub balances: FxHashMap<String, Decimal>,
    pub tickers: FxHashMap<String, Ticker>,
}

impl Snapshot {
    pub fn new(balances: FxHashMap<String, Decimal>, tickers: FxHashMap<String, Ticker>) -> Self {
        Self { balances, tickers }
    }

    /// Builder-style balance insert, mostly for tests and mocks.
    pub fn with_balance(mut self, symbol: &str, quantity: Decimal) -> Self {
        self.balances.insert(symbol.to_string(), quantity);
        self
    }

    /// Builder-style ticker insert keyed by pair symbol.
    pub fn with_price(mut self, pair: &str, last: Decimal) -> Self {
        self.tickers.insert(pair.to_string(), Ticker::last(last));
        self
    }

    pub fn balance(&self, symbol: &str) -> Option<Decimal> {
        self.balances.get(symbol).copied()
    }

    pub fn last_price(&self, pair: &str) -> Option<Decimal> {
        self.tickers.get(pair).map(|t| t.last)
    }
}

/// Pair key used by tickers and orders: `"{base_fiat}_{symbol}"`.
pub fn pair_symbol(base_fiat: &str, symbol: &str) -> String {
    format!("{base_fiat}_{symbol}")
}

/// Convert an `f64` through its shortest round-trip text, so `0.4` becomes
/// exactly `0.4` rather than the nearest binary fraction.
///
/// Returns `None` for NaN, infinities, and values outside `Decimal` range.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pair_key_format() {
        assert_eq!(pair_symbol("THB", "BTC"), "THB_BTC");
    }

    #[test]
    fn lookups() {
        let snap = Snapshot::default()
            .with_balance("BTC", dec!(1.5))
            .with_price("THB_BTC", dec!(1000000));
        assert_eq!(snap.balance("BTC"), Some(dec!(1.5)));
        assert_eq!(snap.balance("ETH"), None);
        assert_eq!(snap.last_price("THB_BTC"), Some(dec!(1000000)));
        assert_eq!(snap.last_price("BTC_THB"), None);
    }

    #[test]
    fn f64_conversion_is_shortest_repr() {
        assert_eq!(decimal_from_f64(0.4), Some(dec!(0.4)));
        assert_eq!(decimal_from_f64(8.90397323), Some(dec!(8.90397323)));
        assert_eq!(decimal_from_f64(188379.27), Some(dec!(188379.27)));
        assert_eq!(decimal_from_f64(0.0), Some(Decimal::ZERO));
    }

    #[test]
    fn f64_conversion_rejects_non_finite() {
        assert_eq!(decimal_from_f64(f64::NAN), None);
        assert_eq!(decimal_from_f64(f64::INFINITY), None);
    }
}
