//! The gateway's direct-post wire format
//!
//! Requests go out as `application/x-www-form-urlencoded` bodies and answers
//! come back as a flat `key=value&key=value` string. [`codec`] handles both
//! directions; [`parser`] turns an answer into a typed record and classifies
//! failures.

pub mod codec;
pub mod parser;

pub use codec::{FORM_CONTENT_TYPE, FormPayload, decode};
pub use parser::{
    ParseFailure, classify_failure, classify_response_code, decode_response, extract_value,
    is_avs_match, is_cvv_match, parse_response,
};
