//! Allocation engine: snapshot + targets → portfolio.
//!
//! Weights are built in two phases. Every target except the last keeps its
//! configured weight; the last one receives `1 - sum(others)`, so the
//! effective weights always sum to exactly one and the last asset's
//! configured weight is never read for sizing.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;

use crate::error::{LookupKind, RebalanceError, Result};
use crate::portfolio::{AssetState, AssetTarget, Portfolio};
use crate::snapshot::{Snapshot, pair_symbol};

/// Check target invariants and return effective weights in configured order.
///
/// Fails with [`RebalanceError::Config`] when the list is empty, a symbol is
/// empty or repeated, a configured weight lies outside `(0, 1]`, or the
/// weights of all but the last target sum to more than one.
pub fn validate_targets(targets: &[AssetTarget]) -> Result<Vec<Decimal>> {
    let Some((last, others)) = targets.split_last() else {
        return Err(RebalanceError::Config("no assets configured".into()));
    };

    let mut seen = FxHashSet::default();
    for t in targets {
        if t.symbol.is_empty() {
            return Err(RebalanceError::Config("empty asset symbol".into()));
        }
        if !seen.insert(t.symbol.as_str()) {
            return Err(RebalanceError::Config(format!(
                "duplicate asset: {}",
                t.symbol
            )));
        }
        if t.target_weight <= Decimal::ZERO || t.target_weight > Decimal::ONE {
            return Err(RebalanceError::Config(format!(
                "weight for {} ({}) must be in (0, 1]",
                t.symbol, t.target_weight
            )));
        }
    }

    // Phase 1: accumulate all-but-last.
    let mut weights = Vec::with_capacity(targets.len());
    let mut remaining = Decimal::ONE;
    for t in others {
        remaining -= t.target_weight;
        weights.push(t.target_weight);
    }
    if remaining < Decimal::ZERO {
        return Err(RebalanceError::Config(format!(
            "weights before {} sum to {} (> 1)",
            last.symbol,
            Decimal::ONE - remaining
        )));
    }

    // Phase 2: the last target takes the residual.
    weights.push(remaining);
    Ok(weights)
}

/// Build this cycle's portfolio from targets and a snapshot.
///
/// Quantities come from `snapshot.balances[symbol]`, prices from
/// `snapshot.tickers["{base_fiat}_{symbol}"].last`. Any missing key aborts
/// the whole computation; no partial portfolio is returned. Current weights
/// and target quantities are left unset for [`plan`](crate::plan).
pub fn compute(targets: &[AssetTarget], snapshot: &Snapshot, base_fiat: &str) -> Result<Portfolio> {
    let weights = validate_targets(targets)?;

    let assets = targets
        .iter()
        .zip(weights)
        .map(|(target, weight)| {
            let quantity = snapshot.balance(&target.symbol).ok_or_else(|| {
                RebalanceError::SnapshotLookup {
                    kind: LookupKind::Balance,
                    key: target.symbol.clone(),
                }
            })?;

            let pair = pair_symbol(base_fiat, &target.symbol);
            let price = snapshot
                .last_price(&pair)
                .ok_or_else(|| RebalanceError::SnapshotLookup {
                    kind: LookupKind::Ticker,
                    key: pair.clone(),
                })?;
            if price <= Decimal::ZERO {
                return Err(RebalanceError::InvalidPrice { pair, price });
            }

            Ok(AssetState {
                symbol: target.symbol.clone(),
                pair,
                effective_target_weight: weight,
                current_quantity: quantity,
                current_price: price,
                current_weight: None,
                target_quantity: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Portfolio::new(assets))
}
