//! HTTP handlers for payment, subscription and plan operations
//!
//! Handlers only decode the request, call [`GatewayService`] and encode the
//! result. Every failure is rendered through [`ServiceError`].

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::error::{GatewayError, ServiceError, ServiceResult};
use crate::core::request::{
    AddPlanRequest, LookupRequest, PaymentRequest, Plan, RecurringPaymentRequest, RefundRequest,
    TokenizeRequest, VoidRequest,
};
use crate::core::response::{
    LookupResponse, PaymentResponse, PlanResponse, RecurringResponse, RefundResponse,
    TokenizeResponse, VoidResponse,
};
use crate::gateway::{GatewayService, PLAN_CANCELED};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GatewayService>,
}

impl AppState {
    pub fn new(service: GatewayService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::invalid_request("Invalid request payload")
            .with_details(rejection.body_text())
            .into()
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::invalid_request("Invalid query string")
            .with_details(rejection.body_text())
            .into()
    }
}

/// Unwrap a JSON body, turning any rejection into `invalid_request`
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServiceResult<T> {
    let Json(value) = payload?;
    Ok(value)
}

// =============================================================================
// Payments
// =============================================================================

/// Handler for `POST /payments/sale`
pub async fn sale(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> ServiceResult<Json<PaymentResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.process_payment(req).await?))
}

/// Handler for `POST /payments/tokenize`
pub async fn tokenize(
    State(state): State<AppState>,
    payload: Result<Json<TokenizeRequest>, JsonRejection>,
) -> ServiceResult<Json<TokenizeResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.tokenize(req).await?))
}

/// Handler for `POST /payments/refund`
pub async fn refund(
    State(state): State<AppState>,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> ServiceResult<Json<RefundResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.refund(req).await?))
}

/// Handler for `POST /payments/void`
pub async fn void(
    State(state): State<AppState>,
    payload: Result<Json<VoidRequest>, JsonRejection>,
) -> ServiceResult<Json<VoidResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.void(req).await?))
}

/// Handler for `GET /payments/lookup?transaction_id=...`
pub async fn lookup(
    State(state): State<AppState>,
    query: Result<Query<LookupRequest>, QueryRejection>,
) -> ServiceResult<Json<LookupResponse>> {
    let Query(req) = query?;
    Ok(Json(state.service.lookup(req).await?))
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Handler for `POST /payments/recurring/create`
pub async fn create_recurring(
    State(state): State<AppState>,
    payload: Result<Json<RecurringPaymentRequest>, JsonRejection>,
) -> ServiceResult<Json<RecurringResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.create_recurring(req).await?))
}

/// Handler for `PUT /payments/recurring/update/{subscription_id}`
pub async fn update_recurring(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    payload: Result<Json<RecurringPaymentRequest>, JsonRejection>,
) -> ServiceResult<Json<RecurringResponse>> {
    let req = body(payload)?;
    Ok(Json(
        state
            .service
            .update_recurring(&subscription_id, req)
            .await?,
    ))
}

/// Handler for `DELETE /payments/recurring/cancel/{subscription_id}`
pub async fn cancel_recurring(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> ServiceResult<Response> {
    state.service.cancel_recurring(&subscription_id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "message": "Subscription cancelled successfully",
        })),
    )
        .into_response())
}

// =============================================================================
// Plans
// =============================================================================

/// Handler for `POST /plans/add`
pub async fn add_plan(
    State(state): State<AppState>,
    payload: Result<Json<AddPlanRequest>, JsonRejection>,
) -> ServiceResult<Json<PlanResponse>> {
    let req = body(payload)?;
    Ok(Json(state.service.add_plan(req).await?))
}

/// Handler for `PUT /plans/update`
pub async fn update_plan(
    State(state): State<AppState>,
    payload: Result<Json<Plan>, JsonRejection>,
) -> ServiceResult<Json<PlanResponse>> {
    let changes = body(payload)?;
    Ok(Json(state.service.update_plan(changes).await?))
}

/// Handler for `DELETE /plans/cancel/{id}`
pub async fn cancel_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<serde_json::Value>> {
    state.service.delete_plan(&id).await?;
    Ok(Json(json!({ "message": PLAN_CANCELED })))
}

/// Handler for `GET /plans/list`: every plan keyed by id
pub async fn list_plans(
    State(state): State<AppState>,
) -> ServiceResult<Json<BTreeMap<String, Plan>>> {
    let plans = state.service.list_plans().await?;
    Ok(Json(
        plans.into_iter().map(|plan| (plan.id.clone(), plan)).collect(),
    ))
}
