//! Reusable field validators
//!
//! Each validator checks one field and reports a classified [`GatewayError`],
//! so callers can branch on the code rather than on the message.

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::request::{BillingInfo, TransactionType};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]{2}$").expect("valid amount pattern"));
static CARD_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]").expect("valid separator pattern"));
static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{13,19}$").expect("valid card pattern"));
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])[0-9]{2}$").expect("valid expiry pattern"));
static CVV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("valid cvv pattern"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});
static START_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid date pattern"));

/// Billing cycles accepted for subscriptions
pub const BILLING_CYCLES: [&str; 5] = ["daily", "weekly", "monthly", "quarterly", "yearly"];

/// Minimum length of a customer vault id
pub const MIN_VAULT_ID_LEN: usize = 8;

const AMOUNT_FORMAT_MESSAGE: &str =
    "invalid amount format: must be in dollars.cents format (e.g., 10.99)";

/// Amount in minor units, from a `dollars[.cents]` string
///
/// Accepts zero to two fraction digits. Returns `None` for anything else.
pub fn amount_in_cents(amount: &str) -> Option<u64> {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty()
        || fraction.len() > 2
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole: u64 = whole.parse().ok()?;
    let cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u64>().ok()? * 10,
        _ => fraction.parse::<u64>().ok()?,
    };
    whole.checked_mul(100)?.checked_add(cents)
}

/// Amount must be `digits.two-digits`; returns it in minor units
pub fn validate_amount_format(amount: &str) -> GatewayResult<u64> {
    if !AMOUNT_RE.is_match(amount) {
        return Err(GatewayError::invalid_amount(AMOUNT_FORMAT_MESSAGE));
    }
    amount_in_cents(amount).ok_or_else(|| GatewayError::invalid_amount(AMOUNT_FORMAT_MESSAGE))
}

/// Amount must be `digits.two-digits` and strictly positive
pub fn validate_amount(amount: &str) -> GatewayResult<u64> {
    match validate_amount_format(amount)? {
        0 => Err(GatewayError::invalid_amount(
            "amount must be greater than zero",
        )),
        cents => Ok(cents),
    }
}

/// Transaction type must be one of the supported kinds (any case)
pub fn validate_transaction_type(transaction_type: &str) -> GatewayResult<TransactionType> {
    if transaction_type.is_empty() {
        return Err(GatewayError::invalid_request("type is required"));
    }
    transaction_type
        .parse()
        .map_err(|_| GatewayError::invalid_request("invalid transaction type"))
}

/// Luhn checksum over a string of ASCII digits
///
/// Every second digit from the right is doubled, and digit-summed when the
/// result exceeds 9. The total must be divisible by 10.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut n = u32::from(b - b'0');
        if i % 2 == 1 {
            n *= 2;
            if n > 9 {
                n -= 9;
            }
        }
        sum += n;
    }
    sum % 10 == 0
}

/// Card number: 13 to 19 digits once spaces and hyphens are removed, Luhn-valid
pub fn validate_card_number(number: &str) -> GatewayResult<()> {
    let digits = CARD_SEPARATORS_RE.replace_all(number, "");

    if !CARD_NUMBER_RE.is_match(&digits) {
        return Err(GatewayError::invalid_card(
            "invalid credit card number length",
        ));
    }
    if !luhn_valid(&digits) {
        return Err(GatewayError::invalid_card(
            "invalid credit card number (failed Luhn check)",
        ));
    }
    Ok(())
}

/// Expiry must be `MMYY` and not before the month of `today`
///
/// Years are compared on their last two digits, so `0125` is January 2025.
pub fn validate_expiration_date(exp_date: &str, today: NaiveDate) -> GatewayResult<()> {
    if !EXPIRY_RE.is_match(exp_date) {
        return Err(GatewayError::invalid_card(
            "invalid expiration date format (must be MMYY)",
        ));
    }

    // Pattern guarantees four ASCII digits
    let month: u32 = exp_date[..2]
        .parse()
        .map_err(|_| GatewayError::invalid_card("invalid expiration month"))?;
    let year: i32 = exp_date[2..]
        .parse()
        .map_err(|_| GatewayError::invalid_card("invalid expiration year"))?;

    let current_year = today.year() % 100;
    let current_month = today.month();

    if year < current_year || (year == current_year && month < current_month) {
        return Err(GatewayError::invalid_card("card has expired"));
    }
    Ok(())
}

pub fn validate_cvv(cvv: &str) -> GatewayResult<()> {
    if !CVV_RE.is_match(cvv) {
        return Err(GatewayError::invalid_card(
            "invalid CVV (must be 3 or 4 digits)",
        ));
    }
    Ok(())
}

pub fn validate_vault_id(customer_vault_id: &str) -> GatewayResult<()> {
    if customer_vault_id.chars().count() < MIN_VAULT_ID_LEN {
        return Err(GatewayError::invalid_request(format!(
            "customer_vault_id must be at least {} characters",
            MIN_VAULT_ID_LEN
        )));
    }
    Ok(())
}

/// Name and full address are mandatory; email and phone only when supplied
pub fn validate_billing_info(billing: &BillingInfo) -> GatewayResult<()> {
    if billing.first_name.is_empty() || billing.last_name.is_empty() {
        return Err(GatewayError::invalid_request(
            "first_name and last_name are required",
        ));
    }

    if billing.address1.is_empty()
        || billing.city.is_empty()
        || billing.state.is_empty()
        || billing.zip.is_empty()
    {
        return Err(GatewayError::invalid_request("complete address is required"));
    }

    if !billing.email.is_empty() && !EMAIL_RE.is_match(&billing.email) {
        return Err(GatewayError::invalid_request("invalid email format"));
    }

    if !billing.phone.is_empty() {
        let digits = billing.phone.chars().filter(char::is_ascii_digit).count();
        if digits < 10 {
            return Err(GatewayError::invalid_request("invalid phone number"));
        }
    }

    Ok(())
}

pub fn validate_billing_cycle(cycle: &str) -> GatewayResult<()> {
    if !BILLING_CYCLES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(cycle))
    {
        return Err(GatewayError::invalid_request("invalid billing cycle"));
    }
    Ok(())
}

/// Start date must be a real calendar date written `MM/DD/YYYY`
pub fn validate_start_date(start_date: &str) -> GatewayResult<NaiveDate> {
    let invalid =
        || GatewayError::invalid_request("invalid start_date format (expected MM/DD/YYYY)");

    if !START_DATE_RE.is_match(start_date) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(start_date, "%m/%d/%Y").map_err(|_| invalid())
}
