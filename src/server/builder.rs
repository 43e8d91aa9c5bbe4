//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::{build_health_routes, build_ledger_routes};
use crate::core::caller::{CallerResolver, HeaderCallerResolver};
use crate::core::service::LedgerStore;
use crate::ledger::Ledger;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for the malltrack HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryLedgerStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn LedgerStore>>,
    resolver: Option<Arc<dyn CallerResolver>>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            resolver: None,
        }
    }

    /// Set the ledger store (required)
    pub fn with_store(self, store: impl LedgerStore + 'static) -> Self {
        self.with_shared_store(Arc::new(store))
    }

    /// Set a ledger store that is also used elsewhere, e.g. for seeding
    pub fn with_shared_store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default `x-user-id` header resolver
    pub fn with_resolver(mut self, resolver: impl CallerResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Build the shared handler state
    pub fn build_state(&self) -> Result<AppState> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| anyhow::anyhow!("LedgerStore is required. Call .with_store()"))?;
        let resolver: Arc<dyn CallerResolver> = match &self.resolver {
            Some(resolver) => resolver.clone(),
            None => Arc::new(HeaderCallerResolver::new(store.clone())),
        };

        Ok(AppState {
            ledger: Ledger::new(store),
            resolver,
        })
    }

    /// Build the final REST router
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;

        Ok(build_health_routes()
            .merge(build_ledger_routes(state))
            .layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
