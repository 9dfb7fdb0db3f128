//! Request validation
//!
//! Pure checks run before anything is sent to the gateway. Each entry point
//! returns the first failure it meets as a classified [`GatewayError`].
//!
//! The public functions compare card expiry against the current local date;
//! the `_at` variants take the reference date explicitly.

pub mod validators;

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::request::{
    PaymentMethod, PaymentRequest, RecurringPaymentRequest, RefundRequest, TokenizeRequest,
    TransactionType,
};
use chrono::{Local, NaiveDate};

pub use validators::{
    BILLING_CYCLES, MIN_VAULT_ID_LEN, amount_in_cents, luhn_valid, validate_amount,
    validate_amount_format, validate_billing_cycle, validate_billing_info, validate_card_number,
    validate_cvv, validate_expiration_date, validate_start_date, validate_transaction_type,
    validate_vault_id,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Validate a sale-family payment request, returning its transaction type
pub fn validate_payment_request(req: &PaymentRequest) -> GatewayResult<TransactionType> {
    validate_payment_request_at(req, today())
}

pub fn validate_payment_request_at(
    req: &PaymentRequest,
    today: NaiveDate,
) -> GatewayResult<TransactionType> {
    validate_amount(&req.amount)?;
    let transaction_type = validate_transaction_type(&req.transaction_type)?;

    match req.payment_method() {
        PaymentMethod::Vault { customer_vault_id } => validate_vault_id(customer_vault_id)?,
        PaymentMethod::Card {
            number,
            exp_date,
            cvv,
        } => {
            if number.is_empty() || exp_date.is_empty() || cvv.is_empty() {
                return Err(GatewayError::invalid_request(
                    "either customer_vault_id or credit_card, exp_date, and cvv are required",
                ));
            }
            validate_card_at(number, exp_date, cvv, today)?;
        }
    }

    if let Some(billing) = &req.billing {
        validate_billing_info(billing)?;
    }
    Ok(transaction_type)
}

/// Card number, expiry and CVV, in that order
pub fn validate_card_at(
    number: &str,
    exp_date: &str,
    cvv: &str,
    today: NaiveDate,
) -> GatewayResult<()> {
    validate_card_number(number)?;
    validate_expiration_date(exp_date, today)?;
    validate_cvv(cvv)
}

/// Validate card data headed for the customer vault
pub fn validate_tokenize_request(req: &TokenizeRequest) -> GatewayResult<()> {
    validate_tokenize_request_at(req, today())
}

pub fn validate_tokenize_request_at(req: &TokenizeRequest, today: NaiveDate) -> GatewayResult<()> {
    if req.credit_card.is_empty() || req.exp_date.is_empty() || req.cvv.is_empty() {
        return Err(GatewayError::invalid_request(
            "credit_card, exp_date, and cvv are required",
        ));
    }
    validate_card_at(&req.credit_card, &req.exp_date, &req.cvv, today)?;

    if let Some(billing) = &req.billing {
        validate_billing_info(billing)?;
    }
    Ok(())
}

/// Validate a refund, optionally against the original transaction amount
///
/// An empty refund amount means a full refund and skips the amount checks.
/// A non-empty original amount that cannot be read is treated as a mismatch
/// rather than skipped, so an unreadable lookup never unlocks an over-refund.
pub fn validate_refund_request(
    req: &RefundRequest,
    original_amount: Option<&str>,
) -> GatewayResult<()> {
    if req.transaction_id.is_empty() {
        return Err(GatewayError::invalid_request("transaction_id is required"));
    }

    if req.amount.is_empty() {
        return Ok(());
    }

    let refund = validate_amount_format(&req.amount)?;
    if refund == 0 {
        return Err(GatewayError::invalid_refund(
            "refund amount must be greater than 0",
        ));
    }

    if let Some(original) = original_amount.filter(|a| !a.is_empty()) {
        let exceeds = match amount_in_cents(original) {
            Some(original) => refund > original,
            None => true,
        };
        if exceeds {
            return Err(GatewayError::invalid_refund(
                "refund amount cannot exceed original transaction amount",
            ));
        }
    }
    Ok(())
}

/// Validate a subscription creation request
pub fn validate_recurring_request(req: &RecurringPaymentRequest) -> GatewayResult<()> {
    if req.customer_vault_id.is_empty()
        || req.plan_id.is_empty()
        || req.amount.is_empty()
        || req.billing_cycle.is_empty()
    {
        return Err(GatewayError::invalid_request(
            "customer_vault_id, plan_id, amount and billing_cycle are required",
        ));
    }

    validate_vault_id(&req.customer_vault_id)?;
    validate_amount(&req.amount)?;
    validate_billing_cycle(&req.billing_cycle)?;

    if !req.start_date.is_empty() {
        validate_start_date(&req.start_date)?;
    }
    if let Some(billing) = &req.billing {
        validate_billing_info(billing)?;
    }
    Ok(())
}
