//! Control loop: run cycles on a fixed interval until stopped.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use driftbook_broker::Exchange;
use log::{error, info};

use crate::config::CycleSettings;
use crate::error::{Error, Result};
use crate::execution::run_cycle;

/// Cloneable stop flag that also wakes a sleeping loop.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. The loop finishes its current cycle first.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` or until stopped. Returns `true` if stopped.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub interval: Duration,
    /// Give up after this many failed cycles in a row.
    pub max_consecutive_failures: Option<u32>,
    /// Stop after this many cycles (`Some(1)` for a single pass).
    pub max_cycles: Option<u64>,
}

/// Totals over the cycles a loop ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub rebalances: u64,
    pub orders_placed: usize,
    pub orders_failed: usize,
}

/// Run cycles until `stop` fires, `max_cycles` is reached, or too many
/// cycles fail in a row.
///
/// A failed cycle is logged and retried after the normal interval. The stop
/// signal is checked before every cycle and interrupts the sleep.
pub fn run_loop<E: Exchange + ?Sized>(
    exchange: &E,
    settings: &CycleSettings,
    options: &LoopOptions,
    stop: &StopSignal,
) -> Result<LoopSummary> {
    let mut state = LoopState::Running;
    let mut summary = LoopSummary::default();
    let mut consecutive_failures = 0u32;

    while state == LoopState::Running {
        if stop.is_stopped() {
            state = LoopState::Stopped;
            continue;
        }

        summary.cycles += 1;
        match run_cycle(exchange, settings) {
            Ok(report) => {
                consecutive_failures = 0;
                if report.plan.triggered {
                    summary.rebalances += 1;
                }
                summary.orders_placed += report.placed();
                summary.orders_failed += report.failed();
            }
            Err(e) => {
                consecutive_failures += 1;
                summary.failed_cycles += 1;
                error!("Cycle {} aborted: {e}", summary.cycles);
                if options
                    .max_consecutive_failures
                    .is_some_and(|max| consecutive_failures >= max)
                {
                    return Err(Error::TooManyFailures {
                        count: consecutive_failures,
                        last: e.to_string(),
                    });
                }
            }
        }

        let done = options.max_cycles.is_some_and(|max| summary.cycles >= max);
        if done || stop.sleep(options.interval) {
            state = LoopState::Stopped;
        }
    }

    info!(
        "Stopped after {} cycles ({} failed, {} rebalances)",
        summary.cycles, summary.failed_cycles, summary.rebalances
    );
    Ok(summary)
}
