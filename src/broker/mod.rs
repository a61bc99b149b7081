//! Broker integration.
//!
//! Defines the `MarketData` and `OrderGateway` traits the engine consumes,
//! plus the Alpaca implementation of both. The read path degrades to
//! "no data" instead of erroring; see each method's contract.

pub mod alpaca;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ContractMetadata, ContractSnapshot, OrderRequest, Quote, SnapshotFilters};

/// Read-side access to market data.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Snapshot of the option chain for `symbol`, keyed by contract id.
    ///
    /// Any transport, status, or decode failure degrades to an empty map;
    /// an empty chain is a valid scan input, not an error.
    async fn fetch_option_snapshots(
        &self,
        symbol: &str,
        filters: &SnapshotFilters,
    ) -> HashMap<String, ContractSnapshot>;

    /// Latest quote for an underlying, or `None` when the venue has nothing.
    async fn fetch_latest_quote(&self, symbol: &str, feed: &str) -> Option<Quote>;

    /// Metadata for one contract.
    ///
    /// Unlike the bulk reads this surfaces failure, so the pipeline can
    /// exclude exactly the affected contract and keep its siblings.
    async fn fetch_contract(&self, contract_id: &str) -> Result<ContractMetadata>;
}

/// Write-side access: order submission and option exercise.
///
/// Calls are fire-and-forget. Responses come back raw for logging and are
/// never validated beyond HTTP status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a limit buy. Returns the broker's raw response body.
    async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value>;

    /// Exercise a held option position. Returns the raw response body.
    async fn exercise(&self, contract_id: &str) -> Result<serde_json::Value>;
}
