//! Payment gateway microservice
//!
//! Reads its settings from the environment or a `.env` file (`NMI_API_KEY` is
//! required) and serves every payment, subscription and plan route:
//!
//! ```sh
//! NMI_API_KEY=... cargo run --example server
//! curl localhost:8080/health
//! ```

use anyhow::Result;
use nmi_pay::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env()?;

    // RUST_LOG wins; DEBUG_MODE only picks the fallback level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        api_url = %config.api_url,
        timeout_secs = config.timeout_secs,
        "starting nmi-pay-rs v{}",
        env!("CARGO_PKG_VERSION")
    );

    let addr = format!("0.0.0.0:{}", config.port);
    ServerBuilder::new().with_config(config).serve(&addr).await
}
