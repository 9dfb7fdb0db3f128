//! Core types: requests, results, errors and validation

pub mod error;
pub mod request;
pub mod response;
pub mod validation;

pub use error::{
    ConfigError, ErrorCode, ErrorResponse, GatewayError, GatewayResult, PlanError, ServiceError,
    ServiceResult,
};
pub use request::{
    AddPlanRequest, BillingInfo, LookupRequest, PaymentMethod, PaymentRequest, Plan,
    RecurringPaymentRequest, RefundRequest, TokenizeRequest, TransactionType, VoidRequest,
};
pub use response::{
    GatewayResponse, LookupResponse, PaymentResponse, PlanResponse, RecurringResponse,
    RefundResponse, TokenizeResponse, VoidResponse,
};
