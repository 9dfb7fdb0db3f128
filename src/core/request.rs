//! Inbound request types
//!
//! Field names follow the JSON accepted by the HTTP surface. Optional string
//! fields default to empty, and an empty value means "not supplied".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction kinds accepted in the `type` field of a payment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Auth,
    Capture,
    Credit,
    Validate,
    Void,
    Refund,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::Sale,
        TransactionType::Auth,
        TransactionType::Capture,
        TransactionType::Credit,
        TransactionType::Validate,
        TransactionType::Void,
        TransactionType::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Auth => "auth",
            TransactionType::Capture => "capture",
            TransactionType::Credit => "credit",
            TransactionType::Validate => "validate",
            TransactionType::Void => "void",
            TransactionType::Refund => "refund",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    /// Case-insensitive parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Billing contact and address sent alongside a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// How a payment is funded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod<'a> {
    /// A card previously stored in the gateway's customer vault
    Vault { customer_vault_id: &'a str },

    /// Raw card data
    Card {
        number: &'a str,
        exp_date: &'a str,
        cvv: &'a str,
    },
}

/// Sale, auth, capture, credit or validate request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub credit_card: String,
    #[serde(default)]
    pub exp_date: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub customer_vault_id: String,
    #[serde(rename = "type", default)]
    pub transaction_type: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub idempotency_key: String,
    #[serde(default)]
    pub recurring_payment: bool,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub billing: Option<BillingInfo>,
}

impl PaymentRequest {
    /// Funding source: the vault id wins whenever it is supplied
    pub fn payment_method(&self) -> PaymentMethod<'_> {
        if self.customer_vault_id.is_empty() {
            PaymentMethod::Card {
                number: &self.credit_card,
                exp_date: &self.exp_date,
                cvv: &self.cvv,
            }
        } else {
            PaymentMethod::Vault {
                customer_vault_id: &self.customer_vault_id,
            }
        }
    }

    /// Parsed transaction type, if it is one of the accepted kinds
    pub fn kind(&self) -> Option<TransactionType> {
        self.transaction_type.parse().ok()
    }
}

/// Card data to store in the customer vault
///
/// Accepts the same JSON as a payment request; the amount and type are
/// ignored since tokenization always runs a nominal sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeRequest {
    #[serde(default)]
    pub credit_card: String,
    #[serde(default)]
    pub exp_date: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub billing: Option<BillingInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub transaction_id: String,
    /// Partial refund amount; empty refunds the full transaction
    #[serde(default)]
    pub amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidRequest {
    #[serde(default)]
    pub transaction_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub action_type: String,
}

impl LookupRequest {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            ..Default::default()
        }
    }
}

/// Subscription creation or update
///
/// On update every field is optional and only the supplied ones are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPaymentRequest {
    #[serde(default)]
    pub customer_vault_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub amount: String,
    /// daily, weekly, monthly, quarterly or yearly
    #[serde(default)]
    pub billing_cycle: String,
    /// MM/DD/YYYY
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub billing: Option<BillingInfo>,
}

/// A recurring-billing template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub day_frequency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payments: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub month_frequency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub day_of_month: String,
}

impl Plan {
    /// Overwrite fields with the non-empty values of `changes`
    pub fn merge(&mut self, changes: &Plan) {
        let fields = [
            (&mut self.name, &changes.name),
            (&mut self.amount, &changes.amount),
            (&mut self.day_frequency, &changes.day_frequency),
            (&mut self.payments, &changes.payments),
            (&mut self.month_frequency, &changes.month_frequency),
            (&mut self.day_of_month, &changes.day_of_month),
        ];
        for (current, new) in fields {
            if !new.is_empty() {
                current.clone_from(new);
            }
        }
    }
}

/// Merchant that emitted a plan event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFeatures {
    #[serde(default)]
    pub is_test_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEventBody {
    #[serde(default)]
    pub merchant: Merchant,
    #[serde(default)]
    pub features: EventFeatures,
    #[serde(default)]
    pub plan: Plan,
}

/// Event envelope used to register a new plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPlanRequest {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_body: PlanEventBody,
}
