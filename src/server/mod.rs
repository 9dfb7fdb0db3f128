//! HTTP surface of the service
//!
//! [`ServerBuilder`] wires a [`GatewayService`](crate::gateway::GatewayService)
//! into an axum router and serves it with graceful shutdown.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use router::build_router;
