//! Strategy — profitability scoring for scanned contracts.
//!
//! Deliberately a single scoring function: the scan pipeline calls exactly
//! one site, so swapping the model never touches orchestration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Shares represented by one options contract.
pub const CONTRACT_MULTIPLIER: Decimal = dec!(100);

/// Score a put contract against the live underlying quote.
///
/// The strike leg is valued at the contract multiplier; the cost side is the
/// premium plus the underlying price, also at the multiplier:
///
/// `100 * strike - 100 * (ask + underlying)`
///
/// Inputs are validated by the pipeline before this is called (ask and
/// underlying strictly positive); the function itself performs no checks
/// and cannot fail.
pub fn put_profit(strike: Decimal, ask: Decimal, underlying: Decimal) -> Decimal {
    CONTRACT_MULTIPLIER * strike - CONTRACT_MULTIPLIER * (ask + underlying)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
