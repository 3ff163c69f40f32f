//! HTTP server shell around the billing engine.

use crate::config::BillingConfig;
use crate::domain::{BillingOrchestrator, InMemoryUsageLedger};
use crate::error::Result;
use crate::http::{self, AppState};
use crate::storage::InMemoryPolicyRepository;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Billing server hosting the engine's REST surface
pub struct BillingServer {
    config: BillingConfig,
    app: Router,
}

impl BillingServer {
    pub fn new(config: BillingConfig) -> Result<Self> {
        let timezone = config.timezone()?;
        let config_arc = Arc::new(config.clone());

        let state = AppState {
            config: config_arc,
            policies: Arc::new(InMemoryPolicyRepository::new()),
            orchestrator: Arc::new(BillingOrchestrator::new(
                Arc::new(InMemoryUsageLedger::new()),
                timezone,
            )),
        };

        let app = http::router(state).layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(TimeoutLayer::new(config.request_timeout())),
        );

        Ok(Self { config, app })
    }

    pub async fn serve(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.http.listen_address, self.config.http.port
        )
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

        self.run_with_listener(listener, shutdown_signal).await
    }

    pub async fn run_with_listener(
        self,
        listener: tokio::net::TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!("Starting billing HTTP server on {}", addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("Billing server shutdown complete");
        Ok(())
    }
}
