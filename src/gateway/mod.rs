//! Transaction orchestration
//!
//! [`GatewayService`] runs each transaction kind through the same pipeline:
//! validation, payload construction, one timed submission, parsing. Sale-family
//! requests carrying an idempotency key are additionally guarded against
//! resubmission.
//!
//! # Idempotency
//!
//! A key is reserved before validation and marked processed once the
//! submission has been dispatched, whatever comes back: approval, decline,
//! unreadable answer, transport failure or timeout. The reservation is released
//! only when validation fails or the caller drops the future while the
//! submission is in flight.

pub mod observer;
pub mod payload;
pub mod transport;

pub use observer::{
    FailureStage, NoopObserver, TracingObserver, TransactionObserver, TransactionOutcome,
};
pub use payload::generate_vault_id;
pub use transport::{DEFAULT_API_URL, DEFAULT_TIMEOUT, GatewayTransport, HttpTransport};

use crate::config::GatewayConfig;
use crate::core::error::{ErrorCode, GatewayError, GatewayResult, PlanError};
use crate::core::request::{
    AddPlanRequest, LookupRequest, PaymentRequest, Plan, RecurringPaymentRequest, RefundRequest,
    TokenizeRequest, VoidRequest,
};
use crate::core::response::{
    GatewayResponse, LookupResponse, PaymentResponse, PlanResponse, RecurringResponse,
    RefundResponse, STATUS_OK, TokenizeResponse, VoidResponse,
};
use crate::core::validation;
use crate::storage::{IdempotencyStore, InMemoryIdempotencyStore, InMemoryPlanStore, PlanStore};
use crate::wire::{FormPayload, ParseFailure, decode_response, extract_value, parse_response};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// Idempotency reservation
// =============================================================================

/// Claim on an idempotency key for the lifetime of one submission
///
/// Dropping it without [`commit`](Self::commit) releases the key.
struct Reservation<'a> {
    store: &'a dyn IdempotencyStore,
    key: &'a str,
    committed: bool,
}

impl<'a> Reservation<'a> {
    /// Reserve `key`, or fail with `duplicate_transaction`
    fn acquire(store: &'a dyn IdempotencyStore, key: &'a str) -> GatewayResult<Self> {
        if store.has_processed(key)? || !store.try_reserve(key)? {
            return Err(GatewayError::duplicate_transaction());
        }
        Ok(Self {
            store,
            key,
            committed: false,
        })
    }

    /// Mark the key processed; on failure the key is released on drop
    fn commit(mut self) -> GatewayResult<()> {
        self.store.mark_processed(self.key)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.store.release(self.key) {
            tracing::error!(error = %e, "failed to release idempotency reservation");
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Success messages of the plan registry
pub const PLAN_ADDED: &str = "Plan added successfully";
pub const PLAN_UPDATED: &str = "Plan updated successfully";
pub const PLAN_CANCELED: &str = "Plan canceled successfully";

/// Entry point for every gateway operation
///
/// Cheap to share behind an `Arc`; all registries are internally synchronized.
pub struct GatewayService {
    security_key: String,
    timeout: Duration,
    transport: Arc<dyn GatewayTransport>,
    idempotency: Arc<dyn IdempotencyStore>,
    plans: Arc<dyn PlanStore>,
    observer: Arc<dyn TransactionObserver>,
    reference_date: Option<NaiveDate>,
}

impl GatewayService {
    /// Service over `transport` with in-memory registries and tracing observation
    pub fn new(security_key: impl Into<String>, transport: Arc<dyn GatewayTransport>) -> Self {
        Self {
            security_key: security_key.into(),
            timeout: DEFAULT_TIMEOUT,
            transport,
            idempotency: Arc::new(InMemoryIdempotencyStore::new()),
            plans: Arc::new(InMemoryPlanStore::new()),
            observer: Arc::new(TracingObserver),
            reference_date: None,
        }
    }

    /// Service posting over HTTP to the configured endpoint
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::new(&config.api_url, config.timeout())?;
        Ok(Self::new(&config.security_key, Arc::new(transport)).with_timeout(config.timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_idempotency_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.idempotency = store;
        self
    }

    pub fn with_plan_store(mut self, store: Arc<dyn PlanStore>) -> Self {
        self.plans = store;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransactionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Check card expiry against a fixed date instead of today
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    // -------------------------------------------------------------------------
    // Pipeline helpers
    // -------------------------------------------------------------------------

    /// One timed round trip; the elapsed timeout is a `network_error`
    async fn submit(&self, kind: &str, payload: &FormPayload) -> GatewayResult<String> {
        let body = payload.encode()?;
        tracing::debug!(kind, payload = ?payload, "submitting to gateway");

        match tokio::time::timeout(self.timeout, self.transport.post(body)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::network(format!(
                "network error: gateway request timed out after {:?}",
                self.timeout
            ))),
        }
    }

    fn fail(&self, kind: &str, stage: FailureStage, error: &GatewayError) {
        self.observer.on_error(kind, stage, error.code);
    }

    fn finish(&self, kind: &str, outcome: TransactionOutcome, started: Instant) {
        self.observer.on_transaction(kind, outcome, started.elapsed());
    }

    /// Submit, reporting transport failures to the observer
    async fn send(
        &self,
        kind: &str,
        payload: &FormPayload,
        started: Instant,
    ) -> GatewayResult<String> {
        self.submit(kind, payload).await.inspect_err(|e| {
            self.fail(kind, FailureStage::Network, e);
            self.finish(kind, TransactionOutcome::Failed, started);
        })
    }

    /// Parse and classify an answer, reporting declines and decode failures
    fn classify(&self, kind: &str, raw: &str, started: Instant) -> GatewayResult<GatewayResponse> {
        parse_response(raw).map_err(|ParseFailure { partial, error }| {
            let (stage, outcome) = if partial.response.is_empty() {
                (FailureStage::Parse, TransactionOutcome::Failed)
            } else {
                (FailureStage::Gateway, TransactionOutcome::Declined)
            };
            self.fail(kind, stage, &error);
            self.finish(kind, outcome, started);
            error
        })
    }

    async fn round_trip(
        &self,
        kind: &str,
        payload: &FormPayload,
        started: Instant,
    ) -> GatewayResult<(String, GatewayResponse)> {
        let raw = self.send(kind, payload, started).await?;
        let parsed = self.classify(kind, &raw, started)?;
        Ok((raw, parsed))
    }

    fn reject(&self, kind: &str, started: Instant, error: GatewayError) -> GatewayError {
        let stage = if error.code == ErrorCode::DuplicateTransaction {
            FailureStage::Duplicate
        } else {
            FailureStage::Validation
        };
        self.fail(kind, stage, &error);
        self.finish(kind, TransactionOutcome::Failed, started);
        error
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Sale, auth, capture, credit or validate
    pub async fn process_payment(&self, req: PaymentRequest) -> GatewayResult<PaymentResponse> {
        let started = Instant::now();
        let kind = req.transaction_type.to_ascii_lowercase();

        let reservation = if req.idempotency_key.is_empty() {
            None
        } else {
            match Reservation::acquire(self.idempotency.as_ref(), &req.idempotency_key) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::info!(kind = %kind, "duplicate idempotency key rejected");
                    return Err(self.reject(&kind, started, e));
                }
            }
        };

        let transaction_type = match validation::validate_payment_request_at(&req, self.today()) {
            Ok(t) => t,
            Err(e) => return Err(self.reject(&kind, started, e)),
        };

        let payload = payload::payment(&self.security_key, &req, transaction_type);
        let sent = self.send(&kind, &payload, started).await;

        // Dispatched: the key is spent whatever came back
        if let Some(Err(e)) = reservation.map(Reservation::commit) {
            tracing::error!(kind = %kind, error = %e, "failed to record idempotency key");
        }

        let raw = sent?;
        let parsed = self.classify(&kind, &raw, started)?;

        tracing::info!(
            kind = %kind,
            transaction_id = %parsed.transaction_id,
            vault = !req.customer_vault_id.is_empty(),
            "payment approved"
        );
        self.finish(&kind, TransactionOutcome::Approved, started);

        Ok(PaymentResponse::new(raw, parsed, req.customer_vault_id))
    }

    /// Store a card in the customer vault under a fresh random id
    ///
    /// A gateway decline is reported through `success = false`, not as an
    /// error.
    pub async fn tokenize(&self, req: TokenizeRequest) -> GatewayResult<TokenizeResponse> {
        const KIND: &str = "tokenize";
        let started = Instant::now();

        if let Err(e) = validation::validate_tokenize_request_at(&req, self.today()) {
            return Err(self.reject(KIND, started, e));
        }

        let vault_id = generate_vault_id();
        let payload = payload::tokenize(&self.security_key, &req, &vault_id);

        let raw = self.send(KIND, &payload, started).await?;

        let parsed = decode_response(&raw).inspect_err(|e| {
            self.fail(KIND, FailureStage::Parse, e);
            self.finish(KIND, TransactionOutcome::Failed, started);
        })?;

        let success = parsed.is_success();
        let outcome = if success {
            TransactionOutcome::Approved
        } else {
            TransactionOutcome::Declined
        };
        tracing::info!(success, "card tokenization finished");
        self.finish(KIND, outcome, started);

        Ok(TokenizeResponse {
            customer_vault_id: vault_id.clone(),
            token: vault_id,
            masked: parsed.get("cc_number").unwrap_or_default().to_string(),
            card_type: parsed.get("card_type").unwrap_or_default().to_string(),
            expiry_date: req.exp_date,
            success,
            message: parsed.response_text,
        })
    }

    /// Refund, after checking the amount against the original transaction
    pub async fn refund(&self, req: RefundRequest) -> GatewayResult<RefundResponse> {
        const KIND: &str = "refund";
        let started = Instant::now();

        if req.transaction_id.is_empty() {
            return Err(self.reject(
                KIND,
                started,
                GatewayError::invalid_request("transaction_id is required"),
            ));
        }

        let original = self.lookup(LookupRequest::new(&req.transaction_id)).await?;

        if let Err(e) = validation::validate_refund_request(&req, Some(&original.amount)) {
            return Err(self.reject(KIND, started, e));
        }

        let payload = payload::refund(&self.security_key, &req);
        let (raw, parsed) = self.round_trip(KIND, &payload, started).await?;

        tracing::info!(
            transaction_id = %req.transaction_id,
            partial = !req.amount.is_empty(),
            "refund approved"
        );
        self.finish(KIND, TransactionOutcome::Approved, started);

        Ok(RefundResponse::new(raw, parsed, req.amount))
    }

    pub async fn void(&self, req: VoidRequest) -> GatewayResult<VoidResponse> {
        const KIND: &str = "void";
        let started = Instant::now();

        if req.transaction_id.is_empty() {
            return Err(self.reject(
                KIND,
                started,
                GatewayError::invalid_request("transaction_id is required"),
            ));
        }

        let payload = payload::void(&self.security_key, &req);
        let (raw, parsed) = self.round_trip(KIND, &payload, started).await?;

        tracing::info!(transaction_id = %req.transaction_id, "void approved");
        self.finish(KIND, TransactionOutcome::Approved, started);

        Ok(VoidResponse::new(raw, parsed))
    }

    /// Fetch a past transaction, including its original amount when reported
    pub async fn lookup(&self, req: LookupRequest) -> GatewayResult<LookupResponse> {
        const KIND: &str = "lookup";
        let started = Instant::now();

        if req.transaction_id.is_empty() {
            return Err(self.reject(
                KIND,
                started,
                GatewayError::invalid_request("transaction_id is required"),
            ));
        }

        let payload = payload::lookup(&self.security_key, &req);
        let (raw, parsed) = self.round_trip(KIND, &payload, started).await?;

        tracing::debug!(transaction_id = %req.transaction_id, "lookup complete");
        self.finish(KIND, TransactionOutcome::Approved, started);

        let amount = extract_value(&raw, "amount");
        Ok(LookupResponse {
            raw_response: raw,
            status_code: STATUS_OK,
            response: parsed.response,
            response_text: parsed.response_text,
            transaction_id: parsed.transaction_id,
            transaction_type: parsed.transaction_type,
            amount,
            response_code: parsed.response_code,
            error_message: String::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Subscribe a vaulted card to a registered plan
    pub async fn create_recurring(
        &self,
        req: RecurringPaymentRequest,
    ) -> GatewayResult<RecurringResponse> {
        const KIND: &str = "recurring_create";
        let started = Instant::now();

        if let Err(e) = validation::validate_recurring_request(&req) {
            return Err(self.reject(KIND, started, e));
        }

        let plan = match self.plans.get(&req.plan_id).await {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                tracing::debug!(plan_id = %req.plan_id, "subscription for unknown plan");
                return Err(self.reject(
                    KIND,
                    started,
                    GatewayError::invalid_request("plan_id does not exist"),
                ));
            }
            Err(e) => return Err(self.reject(KIND, started, GatewayError::system(e.to_string()))),
        };

        let payload = payload::add_subscription(&self.security_key, &req, &plan);
        let (raw, parsed) = self.round_trip(KIND, &payload, started).await?;

        tracing::info!(
            plan_id = %plan.id,
            subscription_id = %parsed.transaction_id,
            "subscription created"
        );
        self.finish(KIND, TransactionOutcome::Approved, started);

        Ok(RecurringResponse {
            subscription_id: parsed.transaction_id,
            status: parsed.response,
            next_billing: extract_value(&raw, "next_billing_date"),
            plan_id: req.plan_id,
            amount: req.amount,
            customer_vault_id: req.customer_vault_id,
        })
    }

    /// Change the supplied fields of an existing subscription
    pub async fn update_recurring(
        &self,
        subscription_id: &str,
        req: RecurringPaymentRequest,
    ) -> GatewayResult<RecurringResponse> {
        const KIND: &str = "recurring_update";
        let started = Instant::now();

        if let Err(e) = validate_subscription_update(subscription_id, &req) {
            return Err(self.reject(KIND, started, e));
        }

        let payload = payload::update_subscription(&self.security_key, subscription_id, &req);
        let (raw, parsed) = self.round_trip(KIND, &payload, started).await?;

        tracing::info!(subscription_id, "subscription updated");
        self.finish(KIND, TransactionOutcome::Approved, started);

        Ok(RecurringResponse {
            subscription_id: subscription_id.to_string(),
            status: parsed.response,
            next_billing: extract_value(&raw, "next_billing_date"),
            plan_id: req.plan_id,
            amount: req.amount,
            customer_vault_id: req.customer_vault_id,
        })
    }

    pub async fn cancel_recurring(&self, subscription_id: &str) -> GatewayResult<()> {
        const KIND: &str = "recurring_cancel";
        let started = Instant::now();

        if subscription_id.is_empty() {
            return Err(self.reject(
                KIND,
                started,
                GatewayError::invalid_request("subscription_id is required"),
            ));
        }

        let payload = payload::delete_subscription(&self.security_key, subscription_id);
        self.round_trip(KIND, &payload, started).await?;

        tracing::info!(subscription_id, "subscription cancelled");
        self.finish(KIND, TransactionOutcome::Approved, started);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Plans
    // -------------------------------------------------------------------------

    /// Register the plan carried by an add-plan event
    pub async fn add_plan(&self, req: AddPlanRequest) -> Result<PlanResponse, PlanError> {
        let plan = req.event_body.plan;
        if plan.id.is_empty() || plan.name.is_empty() || plan.amount.is_empty() {
            return Err(PlanError::MissingFields {
                message: "Missing required plan fields: id, name, or amount".to_string(),
            });
        }

        let plan = self.plans.add(plan).await?;
        tracing::info!(
            plan_id = %plan.id,
            event_id = %req.event_id,
            test_mode = req.event_body.features.is_test_mode,
            "plan added"
        );

        Ok(PlanResponse {
            plan,
            message: PLAN_ADDED.to_string(),
        })
    }

    pub async fn update_plan(&self, changes: Plan) -> Result<PlanResponse, PlanError> {
        if changes.id.is_empty() {
            return Err(PlanError::MissingFields {
                message: "Plan ID is required".to_string(),
            });
        }

        let plan = self.plans.update(changes).await?;
        tracing::info!(plan_id = %plan.id, "plan updated");

        Ok(PlanResponse {
            plan,
            message: PLAN_UPDATED.to_string(),
        })
    }

    pub async fn delete_plan(&self, id: &str) -> Result<(), PlanError> {
        self.plans.delete(id).await?;
        tracing::info!(plan_id = id, "plan canceled");
        Ok(())
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>, PlanError> {
        self.plans.list().await
    }
}

/// Subscription id is required; other fields are checked only when supplied
fn validate_subscription_update(
    subscription_id: &str,
    req: &RecurringPaymentRequest,
) -> GatewayResult<()> {
    if subscription_id.is_empty() {
        return Err(GatewayError::invalid_request("subscription_id is required"));
    }
    if !req.amount.is_empty() {
        validation::validate_amount(&req.amount)?;
    }
    if !req.billing_cycle.is_empty() {
        validation::validate_billing_cycle(&req.billing_cycle)?;
    }
    if let Some(billing) = &req.billing {
        validation::validate_billing_info(billing)?;
    }
    Ok(())
}
