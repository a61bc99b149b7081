//! Alpaca Markets integration.
//!
//! Two hosts behind one client: the data API serves option-chain snapshots
//! and stock quotes, the trading API serves contract metadata, the market
//! clock, orders, and exercise. Both take the same header set.
//!
//! API docs: https://docs.alpaca.markets
//! Auth: `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers on every request.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{MarketData, OrderGateway};
use crate::config::AlpacaConfig;
use crate::types::{
    BrokerError, ContractMetadata, ContractSnapshot, MarketClock, OptionType, OrderRequest, Quote,
    SnapshotFilters,
};

// ---------------------------------------------------------------------------
// API response types (Alpaca JSON → Rust)
// ---------------------------------------------------------------------------

/// Quote shape shared by the option snapshot's `latestQuote` and the stock
/// latest-quote endpoint: `ap`/`bp` prices, `t` timestamp.
#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(default)]
    ap: Option<Decimal>,
    #[serde(default)]
    bp: Option<Decimal>,
    #[serde(default)]
    t: Option<DateTime<Utc>>,
}

impl QuotePayload {
    fn into_quote(self, symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            ask_price: self.ap,
            bid_price: self.bp,
            timestamp: self.t,
        }
    }
}

/// Entry under `snapshots` in the option-chain response. Only the latest
/// quote matters to the scanner; trades and greeks are ignored.
#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    #[serde(default, rename = "latestQuote")]
    latest_quote: Option<QuotePayload>,
}

#[derive(Debug, Deserialize)]
struct SnapshotEnvelope {
    #[serde(default)]
    snapshots: HashMap<String, SnapshotPayload>,
}

impl SnapshotEnvelope {
    fn into_snapshots(self) -> HashMap<String, ContractSnapshot> {
        self.snapshots
            .into_iter()
            .map(|(contract_id, payload)| {
                let quote = payload.latest_quote;
                let snapshot = ContractSnapshot {
                    contract_id: contract_id.clone(),
                    ask_price: quote.as_ref().and_then(|q| q.ap),
                    bid_price: quote.as_ref().and_then(|q| q.bp),
                };
                (contract_id, snapshot)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct LatestQuoteEnvelope {
    #[serde(default)]
    quotes: HashMap<String, QuotePayload>,
}

/// Contract detail from the trading API. Decimal fields arrive as strings
/// there; rust_decimal's default serde mode accepts either shape.
#[derive(Debug, Deserialize)]
struct ContractPayload {
    #[serde(default)]
    root_symbol: Option<String>,
    #[serde(default)]
    expiration_date: Option<String>,
    #[serde(default, rename = "type")]
    option_type: Option<String>,
    #[serde(default)]
    strike_price: Option<Decimal>,
}

impl ContractPayload {
    /// Normalize into domain metadata. Unparseable fields degrade to `None`
    /// instead of failing the lookup.
    fn into_metadata(self, contract_id: &str) -> ContractMetadata {
        ContractMetadata {
            contract_id: contract_id.to_string(),
            root_symbol: self.root_symbol,
            expiration_date: self
                .expiration_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            option_type: self.option_type.as_deref().and_then(OptionType::from_api),
            strike_price: self.strike_price,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Alpaca REST client implementing both broker traits.
pub struct AlpacaClient {
    http: Client,
    trading_base: String,
    data_base: String,
}

impl AlpacaClient {
    /// Build a client with credentials baked into default headers.
    ///
    /// The secret key is exposed exactly once here, and the header value is
    /// marked sensitive so it stays out of debug output.
    pub fn new(config: &AlpacaConfig, api_key: &str, secret_key: &SecretString) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "APCA-API-KEY-ID",
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );
        let mut secret = HeaderValue::from_str(secret_key.expose_secret())
            .context("API secret is not a valid header value")?;
        secret.set_sensitive(true);
        headers.insert("APCA-API-SECRET-KEY", secret);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("TALOS/0.1.0 (options-scanner)")
            .build()
            .context("Failed to build HTTP client for Alpaca")?;

        Ok(Self {
            http,
            trading_base: config.trading_base_url.trim_end_matches('/').to_string(),
            data_base: config.data_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Market open/close status. Absent on any failure, like every read.
    pub async fn fetch_market_clock(&self) -> Option<MarketClock> {
        let url = format!("{}/v2/clock", self.trading_base);
        match self.get_json::<MarketClock>("market clock", url).await {
            Ok(clock) => Some(clock),
            Err(e) => {
                warn!(error = %e, "Market clock unavailable");
                None
            }
        }
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
    ) -> Result<T, BrokerError> {
        debug!(endpoint, url = %url, "Broker GET");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| BrokerError::Transport { endpoint, source })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Status {
                endpoint,
                status,
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|source| BrokerError::Decode { endpoint, source })
    }

    async fn post_json(
        &self,
        endpoint: &'static str,
        url: String,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, BrokerError> {
        debug!(endpoint, url = %url, "Broker POST");

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|source| BrokerError::Transport { endpoint, source })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Status {
                endpoint,
                status,
                body,
            });
        }

        resp.json()
            .await
            .map_err(|source| BrokerError::Decode { endpoint, source })
    }
}

// ---------------------------------------------------------------------------
// MarketData implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketData for AlpacaClient {
    async fn fetch_option_snapshots(
        &self,
        symbol: &str,
        filters: &SnapshotFilters,
    ) -> HashMap<String, ContractSnapshot> {
        let url = format!(
            "{}/v1beta1/options/snapshots/{}?feed={}&limit={}&type={}&strike_price_gte={}&expiration_date_gte={}",
            self.data_base,
            urlencoding::encode(symbol),
            filters.feed,
            filters.limit,
            filters.option_type,
            filters.min_strike.normalize(),
            filters.min_expiration,
        );

        match self
            .get_json::<SnapshotEnvelope>("options snapshot", url)
            .await
        {
            Ok(envelope) => {
                let snapshots = envelope.into_snapshots();
                debug!(symbol, contracts = snapshots.len(), "Option chain fetched");
                snapshots
            }
            Err(e) => {
                warn!(symbol, error = %e, "Options snapshot unavailable, treating as empty chain");
                HashMap::new()
            }
        }
    }

    async fn fetch_latest_quote(&self, symbol: &str, feed: &str) -> Option<Quote> {
        let url = format!(
            "{}/v2/stocks/quotes/latest?symbols={}&feed={}",
            self.data_base,
            urlencoding::encode(symbol),
            feed,
        );

        let mut envelope = match self
            .get_json::<LatestQuoteEnvelope>("latest quote", url)
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(symbol, error = %e, "Latest quote unavailable");
                return None;
            }
        };

        match envelope.quotes.remove(symbol) {
            Some(payload) => Some(payload.into_quote(symbol)),
            None => {
                warn!(symbol, "Venue returned no quote for symbol");
                None
            }
        }
    }

    async fn fetch_contract(&self, contract_id: &str) -> Result<ContractMetadata> {
        let url = format!(
            "{}/v2/options/contracts/{}",
            self.trading_base,
            urlencoding::encode(contract_id),
        );
        let payload = self
            .get_json::<ContractPayload>("contract metadata", url)
            .await?;
        Ok(payload.into_metadata(contract_id))
    }
}

// ---------------------------------------------------------------------------
// OrderGateway implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderGateway for AlpacaClient {
    async fn place_order(&self, order: &OrderRequest) -> Result<serde_json::Value> {
        let url = format!("{}/v2/orders", self.trading_base);
        // Trading API convention: numeric order fields travel as strings.
        let body = serde_json::json!({
            "symbol": order.symbol,
            "qty": order.qty.to_string(),
            "side": "buy",
            "type": "limit",
            "time_in_force": "day",
            "limit_price": order.limit_price.normalize().to_string(),
            "client_order_id": order.client_order_id,
        });
        Ok(self.post_json("order submit", url, Some(&body)).await?)
    }

    async fn exercise(&self, contract_id: &str) -> Result<serde_json::Value> {
        let url = format!(
            "{}/v2/positions/{}/exercise",
            self.trading_base,
            urlencoding::encode(contract_id),
        );
        Ok(self.post_json("option exercise", url, None).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
