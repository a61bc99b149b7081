//! Mock broker for integration testing.
//!
//! Deterministic in-memory implementation of the market-data and order
//! traits: configurable snapshots, quotes, and contract metadata, with
//! per-contract failure injection, artificial resolution latency, and
//! concurrency accounting so tests can assert on fan-out behaviour.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use talos::broker::{MarketData, OrderGateway};
use talos::engine::scanner::ScanConfig;
use talos::types::{
    ContractMetadata, ContractSnapshot, OptionType, OrderRequest, Quote, SnapshotFilters,
};

/// A mock broker with fully scripted responses.
///
/// Configuration is set up-front through the `add_*`/`set_*` methods; the
/// trait implementations only read it and record what was asked of them.
pub struct MockBroker {
    snapshots: HashMap<String, ContractSnapshot>,
    quote: Option<Quote>,
    contracts: HashMap<String, ContractMetadata>,
    failing: HashSet<String>,
    resolution_delay: Duration,

    resolution_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    placed_orders: Mutex<Vec<OrderRequest>>,
    exercised: Mutex<Vec<String>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
            quote: None,
            contracts: HashMap::new(),
            failing: HashSet::new(),
            resolution_delay: Duration::ZERO,
            resolution_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            placed_orders: Mutex::new(Vec::new()),
            exercised: Mutex::new(Vec::new()),
        }
    }

    /// Add a contract that resolves cleanly: a snapshot quote plus full
    /// metadata (GME put expiring 2024-08-16 at the given strike).
    pub fn add_contract(
        &mut self,
        contract_id: &str,
        strike: Decimal,
        ask: Option<Decimal>,
        bid: Option<Decimal>,
    ) {
        self.snapshots.insert(
            contract_id.to_string(),
            ContractSnapshot {
                contract_id: contract_id.to_string(),
                ask_price: ask,
                bid_price: bid,
            },
        );
        self.contracts.insert(
            contract_id.to_string(),
            ContractMetadata {
                contract_id: contract_id.to_string(),
                root_symbol: Some("GME".to_string()),
                expiration_date: NaiveDate::from_ymd_opt(2024, 8, 16),
                option_type: Some(OptionType::Put),
                strike_price: Some(strike),
            },
        );
    }

    /// Add a contract whose metadata lookup fails.
    pub fn add_failing_contract(&mut self, contract_id: &str, ask: Option<Decimal>) {
        self.snapshots.insert(
            contract_id.to_string(),
            ContractSnapshot {
                contract_id: contract_id.to_string(),
                ask_price: ask,
                bid_price: None,
            },
        );
        self.failing.insert(contract_id.to_string());
    }

    /// Add a contract present in the snapshot but unknown to the trading
    /// side, so the metadata lookup misses.
    pub fn add_unknown_contract(&mut self, contract_id: &str, ask: Option<Decimal>) {
        self.snapshots.insert(
            contract_id.to_string(),
            ContractSnapshot {
                contract_id: contract_id.to_string(),
                ask_price: ask,
                bid_price: None,
            },
        );
    }

    /// Publish an underlying quote with the given ask (`None` for a quote
    /// that exists but carries no ask price).
    pub fn set_quote(&mut self, symbol: &str, ask: Option<Decimal>) {
        self.quote = Some(Quote {
            symbol: symbol.to_string(),
            ask_price: ask,
            bid_price: ask.map(|a| a - dec!(0.05)),
            timestamp: Some(Utc::now()),
        });
    }

    /// Delay every metadata lookup, keeping lookups in flight long enough
    /// for concurrency assertions.
    pub fn set_resolution_delay(&mut self, delay: Duration) {
        self.resolution_delay = delay;
    }

    // -- Recorded state ---------------------------------------------------

    pub fn resolution_calls(&self) -> usize {
        self.resolution_calls.load(Ordering::SeqCst)
    }

    /// Highest number of metadata lookups that were ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        self.placed_orders.lock().unwrap().clone()
    }

    pub fn exercised(&self) -> Vec<String> {
        self.exercised.lock().unwrap().clone()
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for MockBroker {
    async fn fetch_option_snapshots(
        &self,
        _symbol: &str,
        _filters: &SnapshotFilters,
    ) -> HashMap<String, ContractSnapshot> {
        self.snapshots.clone()
    }

    async fn fetch_latest_quote(&self, _symbol: &str, _feed: &str) -> Option<Quote> {
        self.quote.clone()
    }

    async fn fetch_contract(&self, contract_id: &str) -> Result<ContractMetadata> {
        self.resolution_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.resolution_delay.is_zero() {
            tokio::time::sleep(self.resolution_delay).await;
        }

        let result = if self.failing.contains(contract_id) {
            Err(anyhow!("injected lookup failure for {contract_id}"))
        } else {
            self.contracts
                .get(contract_id)
                .cloned()
                .ok_or_else(|| anyhow!("unknown contract: {contract_id}"))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl OrderGateway for MockBroker {
    async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value> {
        self.placed_orders.lock().unwrap().push(order.clone());
        Ok(serde_json::json!({
            "id": order.client_order_id,
            "status": "accepted",
        }))
    }

    async fn exercise(&self, contract_id: &str) -> Result<serde_json::Value> {
        self.exercised.lock().unwrap().push(contract_id.to_string());
        Ok(serde_json::json!({ "status": "ok" }))
    }
}

// ---------------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------------

/// Snapshot filters matching the shipped configuration.
pub fn default_filters() -> SnapshotFilters {
    SnapshotFilters {
        feed: "indicative".to_string(),
        limit: 1000,
        option_type: OptionType::Put,
        min_strike: dec!(50),
        min_expiration: NaiveDate::from_ymd_opt(2024, 8, 5).unwrap(),
    }
}

/// Scan configuration with the given fan-out bound and profit threshold.
pub fn scan_config(max_in_flight: usize, min_profit: Decimal) -> ScanConfig {
    ScanConfig {
        filters: default_filters(),
        quote_feed: "iex".to_string(),
        max_in_flight,
        min_profit,
    }
}
