//! Outbound payload construction
//!
//! Every builder is pure: it only arranges fields, and all I/O happens in the
//! transport.

use crate::core::request::{
    LookupRequest, PaymentMethod, PaymentRequest, Plan, RecurringPaymentRequest, RefundRequest,
    TokenizeRequest, TransactionType, VoidRequest,
};
use crate::wire::FormPayload;
use rand::Rng;

/// Placeholder amount charged to create a vault entry
pub const TOKENIZE_AMOUNT: &str = "1.00";

pub const DEFAULT_LOOKUP_CONDITION: &str = "complete";
pub const DEFAULT_LOOKUP_TRANSACTION_TYPE: &str = "cc";
pub const DEFAULT_LOOKUP_ACTION_TYPE: &str = "sale";

/// Fresh vault identifier: 64 random bits as a 20-digit decimal
pub fn generate_vault_id() -> String {
    let value: u64 = rand::rng().random();
    format!("{:020}", value)
}

pub fn payment(security_key: &str, req: &PaymentRequest, kind: TransactionType) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("amount", &req.amount)
        .set("type", kind.as_str())
        .set_opt("orderid", &req.order_id);

    match req.payment_method() {
        PaymentMethod::Vault { customer_vault_id } => {
            payload.set("customer_vault_id", customer_vault_id);
        }
        PaymentMethod::Card {
            number,
            exp_date,
            cvv,
        } => {
            payload
                .set("ccnumber", number)
                .set("ccexp", exp_date)
                .set("cvv", cvv);
        }
    }

    if let Some(billing) = &req.billing {
        payload.billing(billing);
    }
    payload
}

pub fn tokenize(security_key: &str, req: &TokenizeRequest, vault_id: &str) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("ccnumber", &req.credit_card)
        .set("ccexp", &req.exp_date)
        .set("cvv", &req.cvv)
        .set("amount", TOKENIZE_AMOUNT)
        .set("type", TransactionType::Sale.as_str())
        .set("customer_vault", "add_customer")
        .set("customer_vault_id", vault_id);

    if let Some(billing) = &req.billing {
        payload.billing(billing);
    }
    payload
}

/// Refund; an empty amount refunds the whole transaction
pub fn refund(security_key: &str, req: &RefundRequest) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("type", TransactionType::Refund.as_str())
        .set("transactionid", &req.transaction_id)
        .set_opt("amount", &req.amount);
    payload
}

pub fn void(security_key: &str, req: &VoidRequest) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("type", TransactionType::Void.as_str())
        .set("transactionid", &req.transaction_id);
    payload
}

/// Lookup; unset filters fall back to completed card sales
pub fn lookup(security_key: &str, req: &LookupRequest) -> FormPayload {
    let or_default = |value: &str, default: &'static str| -> String {
        if value.is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    let mut payload = FormPayload::new(security_key);
    payload
        .set("transaction_id", &req.transaction_id)
        .set(
            "condition",
            or_default(&req.condition, DEFAULT_LOOKUP_CONDITION),
        )
        .set(
            "transaction_type",
            or_default(&req.transaction_type, DEFAULT_LOOKUP_TRANSACTION_TYPE),
        )
        .set(
            "action_type",
            or_default(&req.action_type, DEFAULT_LOOKUP_ACTION_TYPE),
        );
    payload
}

pub fn add_subscription(
    security_key: &str,
    req: &RecurringPaymentRequest,
    plan: &Plan,
) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("customer_vault_id", &req.customer_vault_id)
        .set("plan_id", &plan.id)
        .set("recurring", "add_subscription");

    if let Some(billing) = &req.billing {
        payload.billing(billing);
    }
    payload
}

/// Subscription update carrying only the supplied fields
pub fn update_subscription(
    security_key: &str,
    subscription_id: &str,
    req: &RecurringPaymentRequest,
) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("subscription_id", subscription_id)
        .set("recurring", "update_subscription")
        .set_opt("amount", &req.amount)
        .set_opt("billing_cycle", &req.billing_cycle)
        .set_opt("plan_id", &req.plan_id);

    if let Some(billing) = &req.billing {
        payload.billing(billing);
    }
    payload
}

pub fn delete_subscription(security_key: &str, subscription_id: &str) -> FormPayload {
    let mut payload = FormPayload::new(security_key);
    payload
        .set("subscription_id", subscription_id)
        .set("recurring", "delete_subscription");
    payload
}
