//! Console presentation of scan reports.
//!
//! Rendering is separated from printing so tests can assert on the exact
//! table text. The scheduling loop clears the terminal between cycles and
//! reprints the latest report for every symbol.

use crate::types::{price_label, ScanReport};

const SYMBOL_WIDTH: usize = 25;
const PRICE_WIDTH: usize = 10;
const RULE_WIDTH: usize = 75;

/// Clear the terminal and move the cursor home.
pub fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

/// Render one report as the table shown on screen.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} @ {} | underlying ask {} | {} contracts, {} resolved, {} failed\n",
        report.symbol,
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC"),
        price_label(report.underlying_price),
        report.contracts_discovered,
        report.contracts_resolved,
        report.resolution_failures,
    ));

    out.push_str(&format!(
        "{:<SYMBOL_WIDTH$} {:<PRICE_WIDTH$} {:<PRICE_WIDTH$} {:<PRICE_WIDTH$} {}\n",
        "Formatted Symbol", "Bid Price", "Ask Price", "C Price", "Profit",
    ));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    if report.opportunities.is_empty() {
        out.push_str("No opportunities above threshold.\n");
        return out;
    }

    for opp in &report.opportunities {
        // Decimals are stringified first so column padding applies to the
        // final text, sentinel included.
        out.push_str(&format!(
            "{:<SYMBOL_WIDTH$} {:<PRICE_WIDTH$} {:<PRICE_WIDTH$} {:<PRICE_WIDTH$} {}\n",
            opp.formatted_symbol,
            price_label(opp.bid_price),
            opp.ask_price.normalize().to_string(),
            opp.underlying_price.normalize().to_string(),
            opp.profit.normalize(),
        ));
    }

    out
}

/// Print a report to stdout.
pub fn print_report(report: &ScanReport) {
    print!("{}", render_report(report));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
