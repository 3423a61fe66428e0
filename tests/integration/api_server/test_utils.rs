//! Test utilities for API server integration tests

use axum_test::TestServer;
use quorum::core::http::{create_router, AppState};
use quorum::core::trader::{SharedStatus, TraderStatus};
use quorum::metrics::Metrics;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Test helper for API server integration tests
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
    pub status: SharedStatus,
}

impl TestApiServer {
    pub async fn new() -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let status: SharedStatus = Arc::new(RwLock::new(TraderStatus::default()));
        let state = AppState::new(metrics.clone(), status.clone());

        let app = create_router(state);
        let server = TestServer::new(app).expect("start test server");

        Self {
            server,
            metrics,
            status,
        }
    }
}
