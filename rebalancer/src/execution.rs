//! One rebalance cycle: snapshot → compute → plan → execute → reconcile.

use chrono::{DateTime, Utc};
use driftbook::{OrderInstruction, Portfolio, RebalancePlan, compute, plan};
use driftbook_broker::{Exchange, OrderAck, OrderGateway, SnapshotProvider};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::config::CycleSettings;
use crate::error::Result;
use crate::reconcile::{self, ReconcileReport};

/// What happened to one planned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Placed(OrderAck),
    /// The gateway refused or the call failed. Later orders still run.
    Failed(String),
    /// Not sent: zero amount after truncation, or dry run.
    Skipped(String),
}

/// One planned order and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReport {
    pub instruction: OrderInstruction,
    pub outcome: OrderOutcome,
}

/// Result of a cycle that got as far as planning.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// NAV before any order was placed.
    pub net_asset_value: Decimal,
    pub plan: RebalancePlan,
    /// One entry per planned instruction, sells first.
    pub orders: Vec<OrderReport>,
    /// Re-snapshot after trading; `None` when nothing traded or it failed.
    pub post_trade: Option<ReconcileReport>,
}

impl CycleReport {
    pub fn placed(&self) -> usize {
        self.count(|o| matches!(o, OrderOutcome::Placed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, OrderOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, OrderOutcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&OrderOutcome) -> bool) -> usize {
        self.orders.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Run one full cycle against `exchange`.
///
/// Snapshot, allocation and planning errors abort the cycle before any order
/// is placed. Order failures do not: they are recorded per order. The
/// post-trade re-snapshot is best effort and never fails the cycle.
pub fn run_cycle<E: Exchange + ?Sized>(
    exchange: &E,
    settings: &CycleSettings,
) -> Result<CycleReport> {
    let started_at = Utc::now();

    let snapshot = exchange.snapshot()?;
    let mut portfolio = compute(&settings.targets, &snapshot, &settings.base_fiat)?;

    let nav = portfolio.net_asset_value();
    info!("Net asset value: {} {}", nav.round_dp(2), settings.base_fiat);

    let plan = plan(&mut portfolio, settings.trigger_threshold)?;
    log_assets(&portfolio);

    if !plan.triggered {
        info!(
            "No asset drifted beyond {}; nothing to do",
            settings.trigger_threshold
        );
        return Ok(CycleReport {
            started_at,
            net_asset_value: nav,
            plan,
            orders: Vec::new(),
            post_trade: None,
        });
    }

    info!(
        "Rebalance triggered: {} sells, {} buys",
        plan.sells.len(),
        plan.buys.len()
    );
    let orders = execute_plan(exchange, &plan, settings.dry_run);

    let traded = orders
        .iter()
        .any(|r| matches!(r.outcome, OrderOutcome::Placed(_)));
    let post_trade = if !traded {
        None
    } else {
        match reconcile::post_trade_report(exchange, settings) {
            Ok(report) => {
                info!(
                    "Net asset value after rebalance: {} {}",
                    report.net_asset_value.round_dp(2),
                    settings.base_fiat
                );
                info!("\n{report}");
                Some(report)
            }
            Err(e) => {
                warn!("Post-trade snapshot failed: {e}");
                None
            }
        }
    };

    Ok(CycleReport {
        started_at,
        net_asset_value: nav,
        plan,
        orders,
        post_trade,
    })
}

/// Place every instruction in plan order (sells, then buys).
///
/// Each order is independent: a failure is recorded and the next order is
/// still attempted. Zero amounts are skipped without calling the gateway.
pub fn execute_plan<G: OrderGateway + ?Sized>(
    gateway: &G,
    plan: &RebalancePlan,
    dry_run: bool,
) -> Vec<OrderReport> {
    let total = plan.len();
    plan.orders()
        .enumerate()
        .map(|(i, instruction)| {
            let outcome = if dry_run {
                info!("[{}/{total}] [DRY RUN] {instruction}", i + 1);
                OrderOutcome::Skipped("dry run".into())
            } else if instruction.amount.is_zero() {
                debug!("[{}/{total}] skip {instruction}: amount truncated to zero", i + 1);
                OrderOutcome::Skipped("amount truncated to zero".into())
            } else {
                info!("[{}/{total}] {instruction}", i + 1);
                match gateway.place(instruction) {
                    Ok(ack) => {
                        info!("  placed, id={}", ack.id);
                        OrderOutcome::Placed(ack)
                    }
                    Err(e) => {
                        error!("  {} {} failed: {e}", instruction.side, instruction.pair);
                        OrderOutcome::Failed(e.to_string())
                    }
                }
            };
            OrderReport {
                instruction: instruction.clone(),
                outcome,
            }
        })
        .collect()
}

fn log_assets(portfolio: &Portfolio) {
    for asset in portfolio.assets() {
        debug!(
            "{} ({}) balance {} price {} target {}",
            asset.symbol,
            asset.current_weight.unwrap_or_default().round_dp(4),
            asset.current_quantity,
            asset.current_price,
            asset.effective_target_weight,
        );
    }
}
