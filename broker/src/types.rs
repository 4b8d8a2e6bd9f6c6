//! Shared broker types.

use driftbook::OrderSide;
use rust_decimal::Decimal;

/// Exchange acknowledgement of a placed market order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    /// Exchange-assigned order id.
    pub id: String,
    pub pair: String,
    pub side: OrderSide,
    /// Amount sent: base units for sells, quote currency for buys.
    pub amount: Decimal,
    /// Amount the exchange expects to credit, when it says.
    pub received: Option<Decimal>,
}
