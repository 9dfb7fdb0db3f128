//! Typed results returned to callers
//!
//! JSON field names mirror the gateway's own keys (`transactionid`,
//! `responsetext`, ...), so clients that already speak the NMI vocabulary can
//! read them without a mapping table.

use super::request::Plan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status recorded on every successful result record
pub const STATUS_OK: u16 = 200;

/// Projection of the handful of common fields out of a decoded gateway answer
///
/// All other keys stay reachable through [`GatewayResponse::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub response: String,
    #[serde(rename = "responsetext")]
    pub response_text: String,
    #[serde(rename = "authcode")]
    pub auth_code: String,
    #[serde(rename = "transactionid")]
    pub transaction_id: String,
    #[serde(rename = "avsresponse")]
    pub avs_response: String,
    #[serde(rename = "cvvresponse")]
    pub cvv_response: String,
    #[serde(rename = "orderid")]
    pub order_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub response_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub amount: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_vault_id: String,
    /// Every decoded pair, in order of first appearance
    #[serde(skip)]
    pub fields: IndexMap<String, String>,
}

impl GatewayResponse {
    /// The gateway approved the request
    pub fn is_success(&self) -> bool {
        self.response == "1"
    }

    /// Any decoded field, including ones outside the projection
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub raw_response: String,
    pub status_code: u16,
    pub response: String,
    #[serde(rename = "responsetext")]
    pub response_text: String,
    #[serde(rename = "authcode")]
    pub auth_code: String,
    #[serde(rename = "transactionid")]
    pub transaction_id: String,
    #[serde(rename = "avsresponse")]
    pub avs_response: String,
    #[serde(rename = "cvvresponse")]
    pub cvv_response: String,
    #[serde(rename = "orderid")]
    pub order_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub response_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    /// Vault id the payment was charged against, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub customer_vault_id: String,
}

impl PaymentResponse {
    pub fn new(raw: String, parsed: GatewayResponse, customer_vault_id: String) -> Self {
        Self {
            raw_response: raw,
            status_code: STATUS_OK,
            response: parsed.response,
            response_text: parsed.response_text,
            auth_code: parsed.auth_code,
            transaction_id: parsed.transaction_id,
            avs_response: parsed.avs_response,
            cvv_response: parsed.cvv_response,
            order_id: parsed.order_id,
            transaction_type: parsed.transaction_type,
            response_code: parsed.response_code,
            error_message: String::new(),
            customer_vault_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResponse {
    pub raw_response: String,
    pub status_code: u16,
    pub response: String,
    #[serde(rename = "responsetext")]
    pub response_text: String,
    #[serde(rename = "authcode")]
    pub auth_code: String,
    #[serde(rename = "transactionid")]
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub response_code: String,
    /// Requested amount; empty for a full refund
    pub amount: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl RefundResponse {
    pub fn new(raw: String, parsed: GatewayResponse, amount: String) -> Self {
        Self {
            raw_response: raw,
            status_code: STATUS_OK,
            response: parsed.response,
            response_text: parsed.response_text,
            auth_code: parsed.auth_code,
            transaction_id: parsed.transaction_id,
            transaction_type: parsed.transaction_type,
            response_code: parsed.response_code,
            amount,
            error_message: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidResponse {
    pub raw_response: String,
    pub status_code: u16,
    pub response: String,
    #[serde(rename = "responsetext")]
    pub response_text: String,
    #[serde(rename = "authcode")]
    pub auth_code: String,
    #[serde(rename = "transactionid")]
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub response_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl VoidResponse {
    pub fn new(raw: String, parsed: GatewayResponse) -> Self {
        Self {
            raw_response: raw,
            status_code: STATUS_OK,
            response: parsed.response,
            response_text: parsed.response_text,
            auth_code: parsed.auth_code,
            transaction_id: parsed.transaction_id,
            transaction_type: parsed.transaction_type,
            response_code: parsed.response_code,
            error_message: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub raw_response: String,
    pub status_code: u16,
    pub response: String,
    #[serde(rename = "responsetext")]
    pub response_text: String,
    #[serde(rename = "transactionid")]
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Original transaction amount, empty when the gateway did not report one
    pub amount: String,
    pub response_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeResponse {
    pub customer_vault_id: String,
    pub token: String,
    #[serde(rename = "masked_card")]
    pub masked: String,
    pub card_type: String,
    pub expiry_date: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringResponse {
    pub subscription_id: String,
    pub status: String,
    #[serde(rename = "next_billing_date")]
    pub next_billing: String,
    pub plan_id: String,
    pub amount: String,
    pub customer_vault_id: String,
}

/// Answer to plan add/update calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: Plan,
    pub message: String,
}
