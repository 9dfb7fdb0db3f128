//! # nmi-pay-rs
//!
//! Payment-gateway integration service for the NMI direct-post API.
//!
//! ## Features
//!
//! - **Validation**: amount format, Luhn checksum, expiry, CVV, billing address
//!   and recurring-billing rules, checked before anything leaves the process
//! - **Wire parsing**: form-encoded gateway answers decoded into typed records,
//!   with failures classified into stable error codes
//! - **Idempotency**: sale-family requests carrying a key are submitted at most once
//! - **Subscriptions and plans**: recurring billing against a registry of plans
//! - **HTTP surface**: axum routes for every operation, with graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nmi_pay::prelude::*;
//!
//! let config = GatewayConfig::from_env()?;
//! let service = GatewayService::from_config(&config)?;
//!
//! let payment = service
//!     .process_payment(PaymentRequest {
//!         amount: "10.99".to_string(),
//!         credit_card: "4111111111111111".to_string(),
//!         exp_date: "1299".to_string(),
//!         cvv: "123".to_string(),
//!         transaction_type: "sale".to_string(),
//!         idempotency_key: "order-42".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("approved: {}", payment.transaction_id);
//! ```

pub mod config;
pub mod core;
pub mod gateway;
pub mod server;
pub mod storage;
pub mod wire;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Requests and results ===
    pub use crate::core::request::{
        AddPlanRequest, BillingInfo, LookupRequest, PaymentMethod, PaymentRequest, Plan,
        RecurringPaymentRequest, RefundRequest, TokenizeRequest, TransactionType, VoidRequest,
    };
    pub use crate::core::response::{
        GatewayResponse, LookupResponse, PaymentResponse, PlanResponse, RecurringResponse,
        RefundResponse, TokenizeResponse, VoidResponse,
    };

    // === Errors ===
    pub use crate::core::error::{
        ConfigError, ErrorCode, ErrorResponse, GatewayError, GatewayResult, PlanError,
        ServiceError, ServiceResult,
    };

    // === Gateway ===
    pub use crate::gateway::{
        GatewayService, GatewayTransport, HttpTransport, NoopObserver, TracingObserver,
        TransactionObserver,
    };

    // === Storage ===
    pub use crate::storage::{
        IdempotencyStore, InMemoryIdempotencyStore, InMemoryPlanStore, PlanStore,
    };

    // === Config ===
    pub use crate::config::GatewayConfig;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, build_router};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
