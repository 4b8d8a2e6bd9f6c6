//! Per-cycle portfolio state: configured targets, live asset state, NAV.

use rust_decimal::Decimal;

/// A configured asset and its target weight in `(0, 1]`.
///
/// For the last target in a list the configured weight is advisory only:
/// [`compute`](crate::compute) replaces it with whatever weight the other
/// targets leave over.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetTarget {
    pub symbol: String,
    pub target_weight: Decimal,
}

impl AssetTarget {
    pub fn new(symbol: impl Into<String>, target_weight: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            target_weight,
        }
    }
}

/// Live state of one asset for the current cycle.
///
/// `current_weight` and `target_quantity` stay `None` until
/// [`plan`](crate::plan) has run against the portfolio.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetState {
    pub symbol: String,
    /// Pair key the price was read from, reused for orders.
    pub pair: String,
    pub effective_target_weight: Decimal,
    pub current_quantity: Decimal,
    pub current_price: Decimal,
    pub current_weight: Option<Decimal>,
    pub target_quantity: Option<Decimal>,
}

impl AssetState {
    /// Value of the holding in quote currency.
    pub fn current_value(&self) -> Decimal {
        self.current_quantity * self.current_price
    }

    /// `|target - current|` weight, once planned.
    pub fn drift(&self) -> Option<Decimal> {
        self.current_weight
            .map(|w| (self.effective_target_weight - w).abs())
    }
}

/// Ordered asset states in configured order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    assets: Vec<AssetState>,
}

impl Portfolio {
    pub fn new(assets: Vec<AssetState>) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &[AssetState] {
        &self.assets
    }

    pub(crate) fn assets_mut(&mut self) -> &mut [AssetState] {
        &mut self.assets
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetState> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Sum of quantity × price. Recomputed on every call.
    pub fn net_asset_value(&self) -> Decimal {
        self.assets.iter().map(AssetState::current_value).sum()
    }

    /// Sum of effective target weights (exactly 1 after `compute`).
    pub fn total_target_weight(&self) -> Decimal {
        self.assets.iter().map(|a| a.effective_target_weight).sum()
    }
}
