//! Form encoding of outbound payloads and decoding of gateway answers

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::request::BillingInfo;
use indexmap::IndexMap;
use std::fmt;

/// Content type of every outbound request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Keys whose values must never show up in logs or debug output
const SENSITIVE_KEYS: [&str; 3] = ["security_key", "ccnumber", "cvv"];

/// Ordered outbound form
///
/// Setting a key twice replaces its value in place, so the encoded body keeps
/// the order in which keys were first set.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: IndexMap<String, String>,
}

impl FormPayload {
    /// New payload carrying the merchant credential
    pub fn new(security_key: impl Into<String>) -> Self {
        let mut payload = Self::default();
        payload.set("security_key", security_key);
        payload
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when `value` is non-empty
    pub fn set_opt(&mut self, key: impl Into<String>, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.set(key, value);
        }
        self
    }

    /// Append the billing contact under the gateway's field names
    pub fn billing(&mut self, billing: &BillingInfo) -> &mut Self {
        self.set("first_name", &billing.first_name)
            .set("last_name", &billing.last_name)
            .set("address1", &billing.address1)
            .set("city", &billing.city)
            .set("state", &billing.state)
            .set("zip", &billing.zip)
            .set("country", &billing.country)
            .set("email", &billing.email)
            .set("phone", &billing.phone)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Form-encode the payload
    pub fn encode(&self) -> GatewayResult<String> {
        let pairs: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        serde_urlencoded::to_string(pairs)
            .map_err(|e| GatewayError::processing(format!("failed to encode request: {}", e)))
    }
}

impl fmt::Debug for FormPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.fields {
            if SENSITIVE_KEYS.contains(&key.as_str()) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// First malformed percent escape in `raw`, if any
fn find_bad_escape(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        if b != b'%' {
            return None;
        }
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        (!valid).then_some(i)
    })
}

/// Decode a flat `key=value&key=value` answer
///
/// `+` decodes to a space and percent escapes are resolved. Keys are case
/// sensitive. A repeated key keeps its last value at the position where it
/// first appeared. A `%` not followed by two hex digits fails the whole
/// decode with `processing_error` carrying the raw text.
pub fn decode(raw: &str) -> GatewayResult<IndexMap<String, String>> {
    if let Some(pos) = find_bad_escape(raw) {
        return Err(GatewayError::processing(format!(
            "failed to parse NMI response: invalid percent-encoding at byte {}",
            pos
        ))
        .with_raw(raw));
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
        GatewayError::processing(format!("failed to parse NMI response: {}", e)).with_raw(raw)
    })?;

    let mut fields = IndexMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        fields.insert(key, value);
    }
    Ok(fields)
}
