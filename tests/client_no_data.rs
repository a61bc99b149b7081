//! Behaviour of the real broker client against a misbehaving venue.
//!
//! Two local stand-ins: a TCP listener bound and immediately dropped so
//! its port refuses connections, and a one-response server that answers
//! every request with a canned HTTP reply (5xx, garbage body). Read paths
//! must degrade to empty data; lookup and write paths must surface errors.

use std::net::{SocketAddr, TcpListener};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use talos::broker::alpaca::AlpacaClient;
use talos::broker::{MarketData, OrderGateway};
use talos::config::AlpacaConfig;
use talos::types::{OptionType, OrderRequest, SnapshotFilters};

fn client_for(addr: SocketAddr) -> AlpacaClient {
    let config = AlpacaConfig {
        api_key_env: "K".to_string(),
        secret_key_env: "S".to_string(),
        trading_base_url: format!("http://{addr}"),
        data_base_url: format!("http://{addr}"),
        request_timeout_secs: 2,
    };
    AlpacaClient::new(&config, "test-key", &SecretString::new("test-secret".to_string()))
        .expect("client construction")
}

fn dead_endpoint_client() -> AlpacaClient {
    // Bind an ephemeral port, then drop the listener so nothing accepts.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    client_for(addr)
}

/// Serve the same canned HTTP response to every connection.
async fn canned_endpoint(status_line: &str, body: &str) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let response = format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

fn filters() -> SnapshotFilters {
    SnapshotFilters {
        feed: "indicative".to_string(),
        limit: 1000,
        option_type: OptionType::Put,
        min_strike: dec!(50),
        min_expiration: NaiveDate::from_ymd_opt(2024, 8, 5).unwrap(),
    }
}

#[tokio::test]
async fn test_unreachable_snapshot_is_an_empty_chain() {
    let client = dead_endpoint_client();
    let snapshots = client.fetch_option_snapshots("GME", &filters()).await;
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn test_unreachable_quote_is_none() {
    let client = dead_endpoint_client();
    assert!(client.fetch_latest_quote("GME", "iex").await.is_none());
}

#[tokio::test]
async fn test_unreachable_contract_lookup_is_an_error() {
    let client = dead_endpoint_client();
    let result = client.fetch_contract("GME240816P00055000").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unreachable_clock_is_none() {
    let client = dead_endpoint_client();
    assert!(client.fetch_market_clock().await.is_none());
}

#[tokio::test]
async fn test_unreachable_order_submission_is_an_error() {
    let client = dead_endpoint_client();
    let order = OrderRequest::limit_buy("GME", 100, dec!(50));
    assert!(client.place_order(&order).await.is_err());
}

#[tokio::test]
async fn test_unreachable_exercise_is_an_error() {
    let client = dead_endpoint_client();
    assert!(client.exercise("GME240816P00055000").await.is_err());
}

#[tokio::test]
async fn test_server_error_snapshot_is_an_empty_chain() {
    let addr = canned_endpoint("500 Internal Server Error", "").await;
    let client = client_for(addr);
    let snapshots = client.fetch_option_snapshots("GME", &filters()).await;
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn test_server_error_quote_is_none() {
    let addr = canned_endpoint("500 Internal Server Error", "").await;
    let client = client_for(addr);
    assert!(client.fetch_latest_quote("GME", "iex").await.is_none());
}

#[tokio::test]
async fn test_server_error_contract_lookup_is_an_error() {
    let addr = canned_endpoint("500 Internal Server Error", "").await;
    let client = client_for(addr);
    assert!(client.fetch_contract("GME240816P00055000").await.is_err());
}

#[tokio::test]
async fn test_malformed_snapshot_body_is_an_empty_chain() {
    let addr = canned_endpoint("200 OK", "not json").await;
    let client = client_for(addr);
    let snapshots = client.fetch_option_snapshots("GME", &filters()).await;
    assert!(snapshots.is_empty());
}

#[tokio::test]
async fn test_malformed_quote_body_is_none() {
    let addr = canned_endpoint("200 OK", "not json").await;
    let client = client_for(addr);
    assert!(client.fetch_latest_quote("GME", "iex").await.is_none());
}
