//! Post-trade reconciliation: re-snapshot and compare actual vs target weights.

use driftbook::{Portfolio, compute};
use driftbook_broker::SnapshotProvider;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::CycleSettings;
use crate::error::Result;

/// Reconciliation report comparing actual vs target.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub net_asset_value: Decimal,
    pub entries: Vec<ReconcileEntry>,
    /// Root-mean-square weight difference, in percent.
    pub tracking_error_pct: f64,
}

/// One asset's reconciliation entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileEntry {
    pub symbol: String,
    pub target_weight: Decimal,
    pub actual_weight: Decimal,
    pub diff_weight: Decimal,
    pub quantity: Decimal,
}

/// Compare a freshly computed portfolio against its effective targets.
pub fn reconcile(portfolio: &Portfolio) -> ReconcileReport {
    let nav = portfolio.net_asset_value();
    let mut sum_sq_diff = 0.0_f64;

    let entries: Vec<ReconcileEntry> = portfolio
        .assets()
        .iter()
        .map(|asset| {
            let actual_weight = if nav.is_zero() {
                Decimal::ZERO
            } else {
                asset.current_value() / nav
            };
            let diff_weight = actual_weight - asset.effective_target_weight;
            let diff = diff_weight.to_f64().unwrap_or(0.0);
            sum_sq_diff += diff * diff;

            ReconcileEntry {
                symbol: asset.symbol.clone(),
                target_weight: asset.effective_target_weight,
                actual_weight,
                diff_weight,
                quantity: asset.current_quantity,
            }
        })
        .collect();

    let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt() * 100.0;

    ReconcileReport {
        net_asset_value: nav,
        entries,
        tracking_error_pct,
    }
}

/// Take a new snapshot and reconcile it against the configured targets.
pub fn post_trade_report<P: SnapshotProvider + ?Sized>(
    provider: &P,
    settings: &CycleSettings,
) -> Result<ReconcileReport> {
    let snapshot = provider.snapshot()?;
    let portfolio = compute(&settings.targets, &snapshot, &settings.base_fiat)?;
    Ok(reconcile(&portfolio))
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RECONCILIATION (NAV {}):", self.net_asset_value.round_dp(2))?;
        writeln!(
            f,
            "  {:8} {:>10} {:>10} {:>10} {:>16}",
            "Asset", "Target%", "Actual%", "Diff%", "Quantity"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "  {:8} {:>9.2}% {:>9.2}% {:>+9.2}% {:>16}",
                e.symbol,
                pct(e.target_weight),
                pct(e.actual_weight),
                pct(e.diff_weight),
                e.quantity,
            )?;
        }
        write!(f, "  Tracking error: {:.3}%", self.tracking_error_pct)
    }
}

fn pct(weight: Decimal) -> f64 {
    (weight * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftbook::{AssetTarget, Snapshot};
    use rust_decimal_macros::dec;

    fn portfolio(btc: Decimal, eth: Decimal) -> Portfolio {
        let targets = vec![
            AssetTarget::new("BTC", dec!(0.5)),
            AssetTarget::new("ETH", dec!(0.5)),
        ];
        let snapshot = Snapshot::default()
            .with_balance("BTC", btc)
            .with_balance("ETH", eth)
            .with_price("THB_BTC", dec!(100))
            .with_price("THB_ETH", dec!(10));
        compute(&targets, &snapshot, "THB").unwrap()
    }

    #[test]
    fn perfect_match() {
        let report = reconcile(&portfolio(dec!(1), dec!(10)));
        assert_eq!(report.net_asset_value, dec!(200));
        assert!(report.tracking_error_pct < 1e-9);
        assert_eq!(report.entries[0].actual_weight, dec!(0.5));
    }

    #[test]
    fn drifted_portfolio() {
        let report = reconcile(&portfolio(dec!(3), dec!(10)));
        // BTC 300 / 400 = 0.75
        let btc = &report.entries[0];
        assert_eq!(btc.actual_weight, dec!(0.75));
        assert_eq!(btc.diff_weight, dec!(0.25));
        assert!((report.tracking_error_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_wallet_reports_zero_weights() {
        let report = reconcile(&portfolio(Decimal::ZERO, Decimal::ZERO));
        assert_eq!(report.net_asset_value, Decimal::ZERO);
        assert!(report.entries.iter().all(|e| e.actual_weight.is_zero()));
    }

    #[test]
    fn display_format() {
        let report = reconcile(&portfolio(dec!(1), dec!(10)));
        let s = format!("{report}");
        assert!(s.contains("BTC"));
        assert!(s.contains("NAV 200"));
        assert!(s.contains("Tracking error"));
    }
}
