//! Shared test harness for gateway orchestration tests
//!
//! Provides `MockTransport`, a scripted [`GatewayTransport`] that records every
//! submitted form, `RecordingObserver`, and request builders.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod gateway_harness;
//! use gateway_harness::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nmi_pay::gateway::{FailureStage, TransactionOutcome};
use nmi_pay::prelude::*;

// ---------------------------------------------------------------------------
// Canned gateway answers
// ---------------------------------------------------------------------------

pub const APPROVED: &str = "response=1&responsetext=SUCCESS&authcode=123456&transactionid=123&avsresponse=Y&cvvresponse=M&orderid=&type=sale&response_code=100";
pub const DECLINED: &str = "response=2&responsetext=DECLINE&response_code=300";
pub const LOOKUP_10_00: &str =
    "response=1&responsetext=OK&transactionid=123&type=sale&amount=10.00&response_code=100";
pub const SUBSCRIBED: &str = "response=1&responsetext=Subscription+added&transactionid=sub-789&next_billing_date=2026-02-01&response_code=100";

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Scripted transport
///
/// Answers are served in order; once the script runs out every call gets the
/// fallback answer. Each submitted body is decoded and kept for assertions.
#[derive(Clone)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<GatewayResult<String>>>>,
    fallback: Arc<Mutex<GatewayResult<String>>>,
    sent: Arc<Mutex<Vec<IndexMap<String, String>>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Transport answering every call with `raw`
    pub fn answering(raw: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Ok(raw.to_string()))),
            sent: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Transport failing every call with `error`
    pub fn failing(error: GatewayError) -> Self {
        let transport = Self::answering("");
        *transport.fallback.lock().unwrap() = Err(error);
        transport
    }

    /// Queue `raw` ahead of the fallback
    pub fn then(self, raw: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(raw.to_string()));
        self
    }

    /// Queue a failure ahead of the fallback
    pub fn then_fail(self, error: GatewayError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Decoded bodies of every call so far
    pub fn sent(&self) -> Vec<IndexMap<String, String>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> IndexMap<String, String> {
        self.sent()
            .pop()
            .expect("transport was never called")
    }
}

#[async_trait]
impl GatewayTransport for MockTransport {
    async fn post(&self, body: String) -> GatewayResult<String> {
        let fields = nmi_pay::wire::decode(&body).expect("outbound body must decode");
        self.sent.lock().unwrap().push(fields);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(answer) => answer,
            None => self.fallback.lock().unwrap().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Transaction(String, TransactionOutcome),
    Error(String, FailureStage, ErrorCode),
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }
}

impl TransactionObserver for RecordingObserver {
    fn on_transaction(&self, kind: &str, outcome: TransactionOutcome, _elapsed: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(Observed::Transaction(kind.to_string(), outcome));
    }

    fn on_error(&self, kind: &str, stage: FailureStage, code: ErrorCode) {
        self.events
            .lock()
            .unwrap()
            .push(Observed::Error(kind.to_string(), stage, code));
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub const SECURITY_KEY: &str = "test-security-key";

/// Fixed "today" so expiry checks do not drift
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

/// Service over `transport` with fresh in-memory registries
pub fn service(transport: &MockTransport) -> GatewayService {
    GatewayService::new(SECURITY_KEY, Arc::new(transport.clone()))
        .with_observer(Arc::new(NoopObserver))
        .with_reference_date(reference_date())
}

pub fn card_sale() -> PaymentRequest {
    PaymentRequest {
        amount: "10.99".to_string(),
        credit_card: "4111111111111111".to_string(),
        exp_date: "1225".to_string(),
        cvv: "123".to_string(),
        transaction_type: "sale".to_string(),
        ..Default::default()
    }
}

pub fn keyed_sale(key: &str) -> PaymentRequest {
    PaymentRequest {
        idempotency_key: key.to_string(),
        ..card_sale()
    }
}

pub fn billing() -> BillingInfo {
    BillingInfo {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        address1: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62701".to_string(),
        country: "US".to_string(),
        email: "jane@example.com".to_string(),
        phone: "555-123-4567".to_string(),
    }
}

pub fn plan(id: &str) -> Plan {
    Plan {
        id: id.to_string(),
        name: format!("Plan {}", id),
        amount: "9.99".to_string(),
        month_frequency: "1".to_string(),
        day_of_month: "1".to_string(),
        ..Default::default()
    }
}

pub fn add_plan_event(plan: Plan) -> AddPlanRequest {
    let mut req = AddPlanRequest {
        event_id: "evt-1".to_string(),
        event_type: "recurring.plan.add".to_string(),
        ..Default::default()
    };
    req.event_body.plan = plan;
    req
}

pub fn subscription(plan_id: &str) -> RecurringPaymentRequest {
    RecurringPaymentRequest {
        customer_vault_id: "00000000001234567890".to_string(),
        plan_id: plan_id.to_string(),
        amount: "9.99".to_string(),
        billing_cycle: "monthly".to_string(),
        start_date: "01/01/2026".to_string(),
        billing: None,
    }
}
