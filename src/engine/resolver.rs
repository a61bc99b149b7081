//! Contract metadata resolution.
//!
//! Option-chain snapshots carry only long OCC-style identifiers and quotes.
//! The resolver looks each contract up on the trading API and derives the
//! short display symbol used in reports. Lookups are independent of one
//! another, so the scanner fans them out concurrently.

use std::sync::Arc;

use anyhow::Result;

use crate::broker::MarketData;
use crate::types::{ContractMetadata, UNKNOWN};

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Looks up contract metadata through a market-data source.
pub struct ContractResolver {
    market_data: Arc<dyn MarketData>,
}

impl ContractResolver {
    pub fn new(market_data: Arc<dyn MarketData>) -> Self {
        Self { market_data }
    }

    /// Fetch metadata for one contract identifier.
    ///
    /// The result is keyed by the requested identifier even if the venue
    /// echoes back a different symbol.
    pub async fn resolve(&self, contract_id: &str) -> Result<ContractMetadata> {
        self.market_data.fetch_contract(contract_id).await
    }
}

// ---------------------------------------------------------------------------
// Display symbol
// ---------------------------------------------------------------------------

/// Build the short display symbol for a contract, e.g. `.GME240816P55`.
///
/// Layout: `.` + root symbol + expiration as YYMMDD + `P`/`C` + strike with
/// trailing zeros dropped. A missing field renders as `N/A` in its position,
/// so a partially resolved contract still produces a readable row.
pub fn format_symbol(meta: &ContractMetadata) -> String {
    let root = meta.root_symbol.as_deref().unwrap_or(UNKNOWN);
    let expiration = meta
        .expiration_date
        .map(|d| d.format("%y%m%d").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let type_code = meta.option_type.map(|t| t.code()).unwrap_or(UNKNOWN);
    let strike = meta
        .strike_price
        .map(|s| s.normalize().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    format!(".{root}{expiration}{type_code}{strike}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
