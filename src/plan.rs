//! Rebalance planner: drift detection and order sizing.

use std::fmt;

use rust_decimal::Decimal;

use crate::error::{RebalanceError, Result};
use crate::portfolio::Portfolio;

/// Direction of a planned market order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderSide {
    /// Sell base-asset units (an "ask").
    Sell,
    /// Spend quote currency (a "bid").
    Buy,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Sell => write!(f, "SELL"),
            OrderSide::Buy => write!(f, "BUY"),
        }
    }
}

/// One planned market order.
///
/// `amount` is base units for sells and quote currency for buys, always a
/// whole number.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderInstruction {
    pub pair: String,
    pub side: OrderSide,
    pub amount: Decimal,
}

impl fmt::Display for OrderInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            OrderSide::Sell => write!(f, "{} {} units of {}", self.side, self.amount, self.pair),
            OrderSide::Buy => write!(f, "{} {} worth of {}", self.side, self.amount, self.pair),
        }
    }
}

/// Orders for one cycle. Sells execute before buys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalancePlan {
    /// True when any asset drifted past the threshold.
    pub triggered: bool,
    pub sells: Vec<OrderInstruction>,
    pub buys: Vec<OrderInstruction>,
}

impl RebalancePlan {
    /// All instructions in execution order.
    pub fn orders(&self) -> impl Iterator<Item = &OrderInstruction> {
        self.sells.iter().chain(self.buys.iter())
    }

    pub fn len(&self) -> usize {
        self.sells.len() + self.buys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sells.is_empty() && self.buys.is_empty()
    }
}

/// Compute current weights, target quantities and, if any asset drifted
/// beyond `trigger_threshold`, the orders that restore every target.
///
/// Assets are visited in ascending effective target weight (ties keep
/// configured order). The trigger is all-or-nothing: one drifted asset
/// rebalances the whole portfolio. Order sizes are truncated toward zero.
///
/// Writes `current_weight` and `target_quantity` on every asset; calling
/// this twice on the same portfolio yields the same plan.
pub fn plan(portfolio: &mut Portfolio, trigger_threshold: Decimal) -> Result<RebalancePlan> {
    let nav = portfolio.net_asset_value();
    if nav.is_zero() {
        return Err(RebalanceError::DegenerateNav);
    }

    let mut order: Vec<usize> = (0..portfolio.len()).collect();
    {
        let assets = portfolio.assets();
        order.sort_by(|&a, &b| {
            assets[a]
                .effective_target_weight
                .cmp(&assets[b].effective_target_weight)
        });
    }

    let assets = portfolio.assets_mut();
    let mut triggered = false;
    for &i in &order {
        let asset = &mut assets[i];
        let current_weight = asset.current_value() / nav;
        let target_value = nav * asset.effective_target_weight;
        asset.current_weight = Some(current_weight);
        asset.target_quantity = Some(target_value / asset.current_price);
        triggered |= (asset.effective_target_weight - current_weight).abs() > trigger_threshold;
    }

    let mut plan = RebalancePlan {
        triggered,
        ..Default::default()
    };
    if !triggered {
        return Ok(plan);
    }

    for &i in &order {
        let asset = &assets[i];
        let target_value = nav * asset.effective_target_weight;
        let current_value = asset.current_value();
        if target_value < current_value {
            let target_quantity = asset.target_quantity.unwrap_or(asset.current_quantity);
            plan.sells.push(OrderInstruction {
                pair: asset.pair.clone(),
                side: OrderSide::Sell,
                amount: (asset.current_quantity - target_quantity).trunc(),
            });
        } else {
            // Sized from values, not quantities: target_value / price may not terminate.
            plan.buys.push(OrderInstruction {
                pair: asset.pair.clone(),
                side: OrderSide::Buy,
                amount: (target_value - current_value).trunc(),
            });
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::AssetState;
    use rust_decimal_macros::dec;

    fn asset(symbol: &str, weight: Decimal, qty: Decimal, price: Decimal) -> AssetState {
        AssetState {
            symbol: symbol.into(),
            pair: format!("THB_{symbol}"),
            effective_target_weight: weight,
            current_quantity: qty,
            current_price: price,
            current_weight: None,
            target_quantity: None,
        }
    }

    #[test]
    fn overweight_small_target_sells_first() {
        // A: target 0.3 at 0.5, B: target 0.7 at 0.5
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.3), dec!(50), dec!(10)),
            asset("B", dec!(0.7), dec!(500), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.1)).unwrap();

        assert!(plan.triggered);
        assert_eq!(plan.sells.len(), 1);
        assert_eq!(plan.sells[0].pair, "THB_A");
        // target qty = 1000 * 0.3 / 10 = 30 → sell 20
        assert_eq!(plan.sells[0].amount, dec!(20));
        assert_eq!(plan.buys.len(), 1);
        assert_eq!(plan.buys[0].pair, "THB_B");
        assert_eq!(plan.buys[0].amount, dec!(200));

        let first = plan.orders().next().unwrap();
        assert_eq!(first.side, OrderSide::Sell);
    }

    #[test]
    fn fills_derived_fields() {
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.3), dec!(50), dec!(10)),
            asset("B", dec!(0.7), dec!(500), dec!(1)),
        ]);
        plan(&mut p, dec!(0.1)).unwrap();
        let a = p.asset("A").unwrap();
        assert_eq!(a.current_weight, Some(dec!(0.5)));
        assert_eq!(a.target_quantity, Some(dec!(30)));
        assert_eq!(a.drift(), Some(dec!(0.2)));
    }

    #[test]
    fn below_threshold_is_empty() {
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(52), dec!(1)),
            asset("B", dec!(0.5), dec!(48), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.05)).unwrap();
        assert!(!plan.triggered);
        assert!(plan.is_empty());
    }

    #[test]
    fn drift_equal_to_threshold_does_not_trigger() {
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(60), dec!(1)),
            asset("B", dec!(0.5), dec!(40), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.1)).unwrap();
        assert!(!plan.triggered);
    }

    #[test]
    fn one_drifted_asset_rebalances_all() {
        // C is on target; A and B are not. C still gets an order.
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.2), dec!(40), dec!(1)),
            asset("B", dec!(0.3), dec!(10), dec!(1)),
            asset("C", dec!(0.5), dec!(50), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.1)).unwrap();
        assert!(plan.triggered);
        assert_eq!(plan.len(), 3);
        assert!(plan.buys.iter().any(|o| o.pair == "THB_C" && o.amount.is_zero()));
    }

    #[test]
    fn ascending_weight_order_within_each_side() {
        let mut p = Portfolio::new(vec![
            asset("BIG", dec!(0.5), dec!(0), dec!(1)),
            asset("MID", dec!(0.3), dec!(0), dec!(1)),
            asset("SMALL", dec!(0.2), dec!(100), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.01)).unwrap();
        let buys: Vec<&str> = plan.buys.iter().map(|o| o.pair.as_str()).collect();
        assert_eq!(buys, vec!["THB_MID", "THB_BIG"]);
        assert_eq!(plan.sells[0].pair, "THB_SMALL");
        assert_eq!(plan.sells[0].amount, dec!(80));
    }

    #[test]
    fn equal_weights_keep_configured_order() {
        let mut p = Portfolio::new(vec![
            asset("X", dec!(0.5), dec!(0), dec!(1)),
            asset("Y", dec!(0.5), dec!(0), dec!(1)),
            asset("Z", dec!(0), dec!(10), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.01)).unwrap();
        let buys: Vec<&str> = plan.buys.iter().map(|o| o.pair.as_str()).collect();
        assert_eq!(buys, vec!["THB_X", "THB_Y"]);
    }

    #[test]
    fn sell_truncates_toward_zero() {
        // NAV 174.06, A target 87.03 → sell 12.97 → 12
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(100), dec!(1)),
            asset("B", dec!(0.5), dec!(74.06), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.01)).unwrap();
        assert_eq!(plan.sells[0].amount, dec!(12));
        assert_eq!(plan.buys[0].amount, dec!(12));
    }

    #[test]
    fn buy_truncates_toward_zero() {
        // NAV 200.02, B target 100.01 → buy 99.99 → 99
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(200), dec!(1)),
            asset("B", dec!(0.5), dec!(0.02), dec!(1)),
        ]);
        let plan = plan(&mut p, dec!(0.01)).unwrap();
        assert_eq!(plan.buys[0].pair, "THB_B");
        assert_eq!(plan.buys[0].amount, dec!(99));
        assert_eq!(plan.sells[0].amount, dec!(99));
    }

    #[test]
    fn buy_exact_when_quantity_does_not_terminate() {
        // B target value 50 at price 6: target qty 8.333..., deficit exactly 50
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(100), dec!(1)),
            asset("B", dec!(0.5), dec!(0), dec!(6)),
        ]);
        let plan = plan(&mut p, dec!(0.01)).unwrap();
        assert_eq!(plan.sells[0].amount, dec!(50));
        assert_eq!(plan.buys[0].pair, "THB_B");
        assert_eq!(plan.buys[0].amount, dec!(50));
    }

    #[test]
    fn zero_nav_is_degenerate() {
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.5), dec!(0), dec!(10)),
            asset("B", dec!(0.5), dec!(0), dec!(1)),
        ]);
        assert_eq!(plan(&mut p, dec!(0.1)), Err(RebalanceError::DegenerateNav));
        assert_eq!(p.assets()[0].current_weight, None);
    }

    #[test]
    fn planning_twice_is_identical() {
        let mut p = Portfolio::new(vec![
            asset("A", dec!(0.3), dec!(50), dec!(10)),
            asset("B", dec!(0.7), dec!(500), dec!(1)),
        ]);
        let first = plan(&mut p, dec!(0.1)).unwrap();
        let snapshot = p.clone();
        let second = plan(&mut p, dec!(0.1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(p, snapshot);
    }

    #[test]
    fn instruction_display() {
        let sell = OrderInstruction {
            pair: "THB_BTC".into(),
            side: OrderSide::Sell,
            amount: dec!(2),
        };
        assert_eq!(sell.to_string(), "SELL 2 units of THB_BTC");
    }
}
