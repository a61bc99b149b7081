//! Options-chain scanner.
//!
//! One scan covers one underlying symbol: fetch the option-chain snapshot
//! and the stock quote concurrently, resolve every discovered contract's
//! metadata with bounded fan-out, then filter and rank the survivors into
//! a [`ScanReport`]. A scan never fails outright; upstream errors shrink
//! the report instead of aborting the cycle.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::broker::MarketData;
use crate::engine::resolver::{self, ContractResolver};
use crate::strategy;
use crate::types::{ContractSnapshot, Opportunity, ScanReport, SnapshotFilters};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-scan knobs, lifted from config at startup.
pub struct ScanConfig {
    pub filters: SnapshotFilters,
    pub quote_feed: String,
    pub max_in_flight: usize,
    pub min_profit: Decimal,
}

// ---------------------------------------------------------------------------
// Internal pipeline types
// ---------------------------------------------------------------------------

/// A contract that survived metadata resolution, ready for filtering.
struct ResolvedContract {
    contract_id: String,
    formatted_symbol: String,
    strike: Decimal,
    ask_price: Option<Decimal>,
    bid_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Scans a single underlying's option chain for profitable contracts.
pub struct Scanner {
    market_data: Arc<dyn MarketData>,
    resolver: ContractResolver,
    filters: SnapshotFilters,
    quote_feed: String,
    max_in_flight: usize,
    min_profit: Decimal,
}

impl Scanner {
    pub fn new(market_data: Arc<dyn MarketData>, config: ScanConfig) -> Self {
        let resolver = ContractResolver::new(market_data.clone());
        Self {
            market_data,
            resolver,
            filters: config.filters,
            quote_feed: config.quote_feed,
            // A zero bound would stall the stream forever.
            max_in_flight: config.max_in_flight.max(1),
            min_profit: config.min_profit,
        }
    }

    /// Run one full scan cycle for `symbol`.
    ///
    /// Infallible by design: any upstream failure degrades to an empty or
    /// partial report so the scheduling loop keeps its cadence.
    pub async fn scan(&self, symbol: &str) -> ScanReport {
        let scanned_at = Utc::now();

        // Chain snapshot and underlying quote are independent fetches.
        let (snapshots, quote) = tokio::join!(
            self.market_data.fetch_option_snapshots(symbol, &self.filters),
            self.market_data.fetch_latest_quote(symbol, &self.quote_feed),
        );

        let underlying_price = quote.and_then(|q| q.ask_price);

        // Fan out metadata resolution, at most `max_in_flight` concurrent
        // lookups. Completion order is arbitrary; ordering is restored when
        // the report is assembled.
        let outcomes: Vec<Option<ResolvedContract>> =
            stream::iter(snapshots.into_values())
                .map(|snapshot| self.resolve_one(snapshot))
                .buffer_unordered(self.max_in_flight)
                .collect()
                .await;

        let report = self.aggregate(symbol, underlying_price, scanned_at, outcomes);

        info!(
            symbol,
            discovered = report.contracts_discovered,
            resolved = report.contracts_resolved,
            failures = report.resolution_failures,
            opportunities = report.opportunities.len(),
            "Scan complete"
        );

        report
    }

    /// Resolve one contract's metadata. Failures are logged and dropped so
    /// one bad contract never poisons the rest of the chain.
    async fn resolve_one(&self, snapshot: ContractSnapshot) -> Option<ResolvedContract> {
        let ContractSnapshot {
            contract_id,
            ask_price,
            bid_price,
        } = snapshot;

        match self.resolver.resolve(&contract_id).await {
            Ok(meta) => Some(ResolvedContract {
                formatted_symbol: resolver::format_symbol(&meta),
                strike: meta.strike_price.unwrap_or(Decimal::ZERO),
                contract_id,
                ask_price,
                bid_price,
            }),
            Err(e) => {
                warn!(contract_id, error = %e, "Contract resolution failed, skipping");
                None
            }
        }
    }

    /// Filter resolved contracts and assemble the final report.
    fn aggregate(
        &self,
        symbol: &str,
        underlying_price: Option<Decimal>,
        scanned_at: chrono::DateTime<Utc>,
        outcomes: Vec<Option<ResolvedContract>>,
    ) -> ScanReport {
        let contracts_discovered = outcomes.len();
        let resolved: Vec<ResolvedContract> = outcomes.into_iter().flatten().collect();
        let contracts_resolved = resolved.len();
        let resolution_failures = contracts_discovered - contracts_resolved;

        let mut opportunities = Vec::new();

        // No usable underlying price means no profit can be computed, so
        // every contract filters out.
        if let Some(underlying) = underlying_price.filter(|p| *p > Decimal::ZERO) {
            for contract in &resolved {
                let Some(ask) = contract.ask_price.filter(|a| *a > Decimal::ZERO) else {
                    continue;
                };

                let profit = strategy::put_profit(contract.strike, ask, underlying);
                if profit > self.min_profit {
                    opportunities.push(Opportunity {
                        symbol: symbol.to_string(),
                        contract_id: contract.contract_id.clone(),
                        formatted_symbol: contract.formatted_symbol.clone(),
                        bid_price: contract.bid_price,
                        ask_price: ask,
                        underlying_price: underlying,
                        profit,
                    });
                }
            }
        }

        // Snapshot maps and unordered fan-out both scramble order; sorting
        // by contract id makes successive reports comparable.
        opportunities.sort_by(|a, b| a.contract_id.cmp(&b.contract_id));

        ScanReport {
            symbol: symbol.to_string(),
            underlying_price,
            scanned_at,
            contracts_discovered,
            contracts_resolved,
            resolution_failures,
            opportunities,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
