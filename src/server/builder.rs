//! ServerBuilder for fluent API to build the HTTP server

use super::handlers::AppState;
use super::router::build_router;
use crate::config::GatewayConfig;
use crate::gateway::GatewayService;
use anyhow::{Result, anyhow};
use axum::Router;
use tokio::net::TcpListener;

/// Builder for the payment HTTP server
///
/// # Example
///
/// ```ignore
/// let config = GatewayConfig::from_env()?;
/// ServerBuilder::new()
///     .with_config(config)
///     .serve("0.0.0.0:8080")
///     .await?;
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<GatewayConfig>,
    service: Option<GatewayService>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the gateway service from `config` (HTTP transport, in-memory registries)
    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a ready-made service; takes precedence over [`with_config`](Self::with_config)
    pub fn with_service(mut self, service: GatewayService) -> Self {
        self.service = Some(service);
        self
    }

    /// Merge extra routes into the application
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the router
    pub fn build(self) -> Result<Router> {
        let service = match (self.service, self.config) {
            (Some(service), _) => service,
            (None, Some(config)) => {
                config.validate()?;
                GatewayService::from_config(&config)?
            }
            (None, None) => {
                return Err(anyhow!(
                    "a gateway service or configuration is required"
                ));
            }
        };

        let mut app = build_router(AppState::new(service));
        for routes in self.custom_routes {
            app = app.merge(routes);
        }
        Ok(app)
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `addr` and stops on SIGTERM or Ctrl+C once in-flight requests
    /// have finished.
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

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
