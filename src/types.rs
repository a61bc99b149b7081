//! Shared types for the TALOS scanner.
//!
//! These types form the data model used across the broker, engine, and
//! display modules. Wire-format structs stay private to the broker module;
//! what lives here is the domain vocabulary the rest of the crate speaks.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel shown wherever a field could not be resolved from the broker.
pub const UNKNOWN: &str = "N/A";

/// Render an optional price, falling back to the shared sentinel.
pub fn price_label(price: Option<Decimal>) -> String {
    match price {
        Some(p) => p.normalize().to_string(),
        None => UNKNOWN.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Quotes & snapshots
// ---------------------------------------------------------------------------

/// Latest quote for an underlying symbol.
///
/// Prices are optional: the venue routinely has nothing for a symbol and
/// downstream logic must treat that as a valid state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub ask_price: Option<Decimal>,
    pub bid_price: Option<Decimal>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ask={} bid={}",
            self.symbol,
            price_label(self.ask_price),
            price_label(self.bid_price),
        )
    }
}

/// One contract's entry in an option-chain snapshot.
///
/// Produced fresh on every scan and never persisted across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSnapshot {
    /// Exchange-assigned contract identifier, e.g. `GME240816P00055000`.
    pub contract_id: String,
    pub ask_price: Option<Decimal>,
    pub bid_price: Option<Decimal>,
}

/// Server-side filters applied to the option-chain snapshot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFilters {
    pub feed: String,
    pub limit: u32,
    pub option_type: OptionType,
    pub min_strike: Decimal,
    /// Earliest expiration date to include (ISO date in config).
    pub min_expiration: NaiveDate,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Put or call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Put,
    Call,
}

impl OptionType {
    /// Parse the broker's `type` field, case-insensitively.
    /// Anything unrecognized is `None` rather than an error.
    pub fn from_api(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "put" => Some(OptionType::Put),
            "call" => Some(OptionType::Call),
            _ => None,
        }
    }

    /// Single-letter code used in formatted contract symbols.
    pub fn code(&self) -> &'static str {
        match self {
            OptionType::Put => "P",
            OptionType::Call => "C",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Put => write!(f, "put"),
            OptionType::Call => write!(f, "call"),
        }
    }
}

/// Per-contract metadata from the trading API.
///
/// Every field except the identifier degrades independently: a lookup that
/// comes back with holes still yields usable metadata, and the formatting
/// layer substitutes [`UNKNOWN`] per missing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub contract_id: String,
    pub root_symbol: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub option_type: Option<OptionType>,
    pub strike_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

/// A contract that cleared the profit filter in one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Underlying symbol the scan ran for.
    pub symbol: String,
    /// Exchange-assigned contract identifier.
    pub contract_id: String,
    /// Canonical human-readable symbol, e.g. `.GME240816P55`.
    pub formatted_symbol: String,
    /// Bid may be absent even on a qualifying contract.
    pub bid_price: Option<Decimal>,
    pub ask_price: Decimal,
    pub underlying_price: Decimal,
    pub profit: Decimal,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bid={} ask={} underlying={} profit={}",
            self.formatted_symbol,
            price_label(self.bid_price),
            self.ask_price.normalize(),
            self.underlying_price.normalize(),
            self.profit.normalize(),
        )
    }
}

impl Opportunity {
    /// Helper to build a known-good opportunity for tests.
    #[cfg(test)]
    pub fn sample() -> Self {
        use rust_decimal_macros::dec;
        Opportunity {
            symbol: "GME".to_string(),
            contract_id: "GME240816P00055000".to_string(),
            formatted_symbol: ".GME240816P55".to_string(),
            bid_price: Some(dec!(4.2)),
            ask_price: dec!(1.2),
            underlying_price: dec!(50.0),
            profit: dec!(380),
        }
    }
}

/// Everything one scan of one symbol produced.
///
/// A new report fully replaces the previous one for the same symbol; the
/// pipeline never accumulates opportunities across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub symbol: String,
    /// Underlying ask at scan time, if the venue had one.
    pub underlying_price: Option<Decimal>,
    pub scanned_at: DateTime<Utc>,
    /// Contracts present in the snapshot.
    pub contracts_discovered: usize,
    /// Contracts whose metadata lookup succeeded.
    pub contracts_resolved: usize,
    /// Lookups that failed and were excluded from this scan.
    pub resolution_failures: usize,
    /// Ordered by contract identifier.
    pub opportunities: Vec<Opportunity>,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} opportunities from {} contracts ({} unresolved), underlying={}",
            self.symbol,
            self.opportunities.len(),
            self.contracts_discovered,
            self.resolution_failures,
            price_label(self.underlying_price),
        )
    }
}

// ---------------------------------------------------------------------------
// Orders & clock
// ---------------------------------------------------------------------------

/// A limit buy ready for submission. Side and time-in-force are fixed by
/// the product (buy, day); only the leg-specific parts vary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: u32,
    pub limit_price: Decimal,
    /// Generated per request so the broker can deduplicate submissions.
    pub client_order_id: String,
}

impl OrderRequest {
    pub fn limit_buy(symbol: &str, qty: u32, limit_price: Decimal) -> Self {
        OrderRequest {
            symbol: symbol.to_string(),
            qty,
            limit_price,
            client_order_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buy {} {} limit {} [{}]",
            self.qty,
            self.symbol,
            self.limit_price.normalize(),
            self.client_order_id,
        )
    }
}

/// Market open/close status from the trading API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketClock {
    pub timestamp: DateTime<Utc>,
    pub is_open: bool,
    pub next_open: DateTime<Utc>,
    pub next_close: DateTime<Utc>,
}

impl fmt::Display for MarketClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open {
            write!(f, "market open (next close {})", self.next_close)
        } else {
            write!(f, "market closed (next open {})", self.next_open)
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure classes for a single broker HTTP call.
///
/// These never cross the read-path boundary: snapshot and quote fetches
/// normalize them to "no data" and log. The contract lookup and order
/// submission paths surface them so callers can isolate the failure.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned an undecodable body: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
