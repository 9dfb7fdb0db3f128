//! Gateway answer parsing and failure classification

use super::codec::decode;
use crate::core::error::{ErrorCode, GatewayError};
use crate::core::response::GatewayResponse;
use indexmap::IndexMap;
use std::fmt;

// =============================================================================
// AVS / CVV codes
// =============================================================================

/// Exact match, 9-character numeric ZIP
pub const AVS_EXACT_MATCH_ZIP9: &str = "X";
/// Exact match, 5-character numeric ZIP
pub const AVS_EXACT_MATCH_ZIP5: &str = "Y";
pub const AVS_ADDRESS_MATCH: &str = "A";
pub const AVS_NO_MATCH: &str = "N";
pub const AVS_ADDRESS_MATCH_ONLY: &str = "B";
pub const AVS_ZIP_MATCH_ONLY: &str = "P";
pub const AVS_UNAVAILABLE: &str = "U";
pub const AVS_NOT_SUPPORTED: &str = "S";
pub const AVS_RETRY: &str = "R";
pub const AVS_ERROR: &str = "E";
/// Non-U.S. issuer does not participate
pub const AVS_INTERNATIONAL_UNSUPPORTED: &str = "G";

pub const CVV_MATCH: &str = "M";
pub const CVV_NO_MATCH: &str = "N";
pub const CVV_NOT_PROCESSED: &str = "P";
/// Merchant indicated no CVV was present
pub const CVV_NOT_SUBMITTED: &str = "S";
/// Issuer not certified
pub const CVV_UNAVAILABLE: &str = "U";

/// Address verification returned an exact match
pub fn is_avs_match(avs_response: &str) -> bool {
    avs_response == AVS_EXACT_MATCH_ZIP9 || avs_response == AVS_EXACT_MATCH_ZIP5
}

pub fn is_cvv_match(cvv_response: &str) -> bool {
    cvv_response == CVV_MATCH
}

// =============================================================================
// Classification
// =============================================================================

const RESPONSE_CODES: &[(&str, ErrorCode)] = &[
    ("200", ErrorCode::InvalidCard),
    ("201", ErrorCode::InvalidAmount),
    ("300", ErrorCode::AuthenticationFailed),
    ("400", ErrorCode::ProcessingError),
    ("500", ErrorCode::SystemError),
    ("600", ErrorCode::InvalidAction),
    ("601", ErrorCode::DuplicateTransaction),
    ("700", ErrorCode::NetworkError),
];

const REFID_MARKER: &str = "REFID:";

/// Map a gateway `response_code` to an error code
///
/// Unknown and missing codes fall back to `processing_error`.
pub fn classify_response_code(response_code: &str) -> ErrorCode {
    RESPONSE_CODES
        .iter()
        .find(|(code, _)| *code == response_code)
        .map(|(_, error)| *error)
        .unwrap_or(ErrorCode::ProcessingError)
}

/// Build the error for a failed answer
///
/// The message is the gateway text. A `REFID:` reference in that text is
/// copied, from the marker to the end, into `details`.
pub fn classify_failure(response_text: &str, response_code: &str, raw: &str) -> GatewayError {
    let mut error =
        GatewayError::new(classify_response_code(response_code), response_text).with_raw(raw);
    if let Some(pos) = response_text.find(REFID_MARKER) {
        error = error.with_details(&response_text[pos..]);
    }
    error
}

// =============================================================================
// Parsing
// =============================================================================

/// A failed answer: the classified error plus whatever the gateway did return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Projected fields; default when the text could not be decoded at all
    pub partial: GatewayResponse,
    pub error: GatewayError,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ParseFailure {}

impl From<ParseFailure> for GatewayError {
    fn from(failure: ParseFailure) -> Self {
        failure.error
    }
}

fn project(fields: IndexMap<String, String>) -> GatewayResponse {
    let field = |key: &str| fields.get(key).cloned().unwrap_or_default();
    GatewayResponse {
        response: field("response"),
        response_text: field("responsetext"),
        auth_code: field("authcode"),
        transaction_id: field("transactionid"),
        avs_response: field("avsresponse"),
        cvv_response: field("cvvresponse"),
        order_id: field("orderid"),
        transaction_type: field("type"),
        response_code: field("response_code"),
        amount: field("amount"),
        customer_vault_id: field("customer_vault_id"),
        fields,
    }
}

/// Decode and project without judging success
pub fn decode_response(raw: &str) -> Result<GatewayResponse, GatewayError> {
    decode(raw).map(project)
}

/// Decode, project and classify a gateway answer
///
/// Succeeds only when `response` is `"1"`.
pub fn parse_response(raw: &str) -> Result<GatewayResponse, ParseFailure> {
    let parsed = decode_response(raw).map_err(|error| ParseFailure {
        partial: GatewayResponse::default(),
        error,
    })?;

    if parsed.is_success() {
        return Ok(parsed);
    }

    let error = classify_failure(&parsed.response_text, &parsed.response_code, raw);
    Err(ParseFailure {
        partial: parsed,
        error,
    })
}

/// Single value from a raw answer; empty when absent or undecodable
pub fn extract_value(raw: &str, key: &str) -> String {
    decode(raw)
        .ok()
        .and_then(|mut fields| fields.swap_remove(key))
        .unwrap_or_default()
}
