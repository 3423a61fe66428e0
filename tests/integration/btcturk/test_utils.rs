//! Mock BtcTurk server for REST client tests

#![allow(dead_code)]

use quorum::services::btcturk::{BtcTurkClient, BtcTurkConfig};
use std::time::Duration;
use wiremock::MockServer;

pub const API_KEY: &str = "public-key";
/// base64 of "private-secret"
pub const API_SECRET_B64: &str = "cHJpdmF0ZS1zZWNyZXQ=";

pub struct TestExchange {
    pub server: MockServer,
    pub client: BtcTurkClient,
}

impl TestExchange {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let client = BtcTurkClient::new(BtcTurkConfig {
            api_key: API_KEY.to_string(),
            api_secret: b"private-secret".to_vec(),
            base_url: server.uri(),
            market_data_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .expect("client construction");
        Self { server, client }
    }
}
