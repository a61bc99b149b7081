//! Order executor.
//!
//! Turns scan opportunities into broker orders: a stock leg at the
//! underlying price and an option leg at the contract ask, followed by a
//! deferred exercise request. Disabled by default; dry-run mode logs what
//! would have been placed without touching the venue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::broker::OrderGateway;
use crate::config::OrdersConfig;
use crate::types::{OrderRequest, ScanReport};

// ---------------------------------------------------------------------------
// Execution summary
// ---------------------------------------------------------------------------

/// Outcome counts for one execution pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub orders_placed: usize,
    pub orders_failed: usize,
    pub exercises_scheduled: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} placed, {} failed, {} exercises scheduled, {} skipped",
            self.orders_placed, self.orders_failed, self.exercises_scheduled, self.skipped
        )
    }
}

// ---------------------------------------------------------------------------
// Exercise scheduler
// ---------------------------------------------------------------------------

/// Fires exercise requests after a configured delay.
///
/// Each scheduled exercise is its own task; shutdown aborts whatever has
/// not fired yet rather than waiting out the delays.
struct ExerciseScheduler {
    gateway: Arc<dyn OrderGateway>,
    delay: Duration,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ExerciseScheduler {
    fn new(gateway: Arc<dyn OrderGateway>, delay: Duration) -> Self {
        Self {
            gateway,
            delay,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a delayed exercise for `contract_id`.
    fn schedule(&self, contract_id: String) {
        let gateway = self.gateway.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            match gateway.exercise(&contract_id).await {
                Ok(response) => {
                    info!(contract_id, response = %response, "Option exercised");
                }
                Err(e) => {
                    warn!(contract_id, error = %e, "Option exercise failed");
                }
            }
        });

        self.handles.lock().unwrap().push(handle);
    }

    /// Abort every exercise that has not fired yet. Returns how many
    /// timers were still pending; already-fired tasks are not counted.
    fn cancel_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        let mut cancelled = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Number of exercises still waiting to fire.
    fn pending(&self) -> usize {
        let mut handles = self.handles.lock().unwrap();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Wait for all scheduled exercises to run to completion. Test-path
    /// companion to [`cancel_all`](Self::cancel_all).
    #[cfg(test)]
    async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        futures::future::join_all(handles).await;
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Places the two-leg order pair for each opportunity in a report.
pub struct Executor {
    gateway: Arc<dyn OrderGateway>,
    orders: OrdersConfig,
    scheduler: ExerciseScheduler,
}

impl Executor {
    pub fn new(gateway: Arc<dyn OrderGateway>, orders: OrdersConfig) -> Self {
        let scheduler = ExerciseScheduler::new(
            gateway.clone(),
            Duration::from_secs(orders.exercise_delay_secs),
        );
        Self {
            gateway,
            orders,
            scheduler,
        }
    }

    /// Act on a scan report.
    ///
    /// Per-opportunity failures are logged and counted, never propagated;
    /// one rejected order must not block the rest of the batch.
    pub async fn execute(&self, report: &ScanReport) -> ExecutionSummary {
        let mut summary = ExecutionSummary::default();

        if report.opportunities.is_empty() {
            return summary;
        }

        if !self.orders.enabled {
            for opp in &report.opportunities {
                info!(
                    contract_id = %opp.contract_id,
                    symbol = %opp.formatted_symbol,
                    profit = %opp.profit,
                    "[DRY RUN] Would buy stock, buy option, and schedule exercise"
                );
                summary.skipped += 1;
            }
            return summary;
        }

        for opp in &report.opportunities {
            // Stock leg: the shares the put will sell at strike.
            let stock = OrderRequest::limit_buy(&opp.symbol, self.orders.stock_qty, opp.underlying_price);
            self.place(&stock, &mut summary).await;

            // Option leg: the contract itself.
            let option = OrderRequest::limit_buy(&opp.contract_id, self.orders.option_qty, opp.ask_price);
            self.place(&option, &mut summary).await;

            // Exercise is scheduled regardless of leg outcomes; the venue
            // rejects it cleanly if no position materialized.
            self.scheduler.schedule(opp.contract_id.clone());
            summary.exercises_scheduled += 1;
        }

        info!(summary = %summary, "Execution pass complete");
        summary
    }

    async fn place(&self, order: &OrderRequest, summary: &mut ExecutionSummary) {
        match self.gateway.place_order(order).await {
            Ok(response) => {
                info!(order = %order, response = %response, "Order placed");
                summary.orders_placed += 1;
            }
            Err(e) => {
                warn!(order = %order, error = %e, "Order placement failed");
                summary.orders_failed += 1;
            }
        }
    }

    /// Number of exercises still pending.
    pub fn pending_exercises(&self) -> usize {
        self.scheduler.pending()
    }

    /// Cancel outstanding exercise timers. Called on shutdown.
    pub fn shutdown(&self) {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "Cancelled pending exercise timers");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
