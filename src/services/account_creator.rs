// ==================== ACCOUNT CREATION ====================
// The create_user_with_auth procedure does not answer in one shape. Besides
// the plain success object it may return a JSON-encoded string, or report a
// success through its error channel (inside `details`, sometimes wrapped as a
// Python byte literal, or inside the text of a transport fault). Each shape
// is recognised by its own step below, tried in a fixed order.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fmt;

use crate::backend::{BackendClient, BackendError, RpcResponse};
use crate::models::{CreationOutcome, NewAccount, TenantId, UserRecord};

const SUCCESS_MARKERS: [&str; 2] = ["'success' : true", "\"success\" : true"];

lazy_static! {
    /// First brace-delimited fragment mentioning `success` followed by `true`.
    static ref SUCCESS_FRAGMENT: Regex =
        Regex::new(r"\\?\{.*?success.*?true.*?\}").expect("success fragment pattern is valid");
}

/// Which step recognised a successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPath {
    Direct,
    EncodedString,
    ErrorDetails,
    FaultMessage,
}

impl fmt::Display for SuccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SuccessPath::Direct => "direct",
            SuccessPath::EncodedString => "encoded string",
            SuccessPath::ErrorDetails => "error details",
            SuccessPath::FaultMessage => "fault message",
        };
        f.write_str(name)
    }
}

/// Creates one account and classifies the answer. Exactly one backend call, no retry.
pub async fn create_account(
    backend: &dyn BackendClient,
    record: &UserRecord,
    tenant: &TenantId,
) -> CreationOutcome {
    let account = NewAccount::from_record(record, tenant);

    match recognise(backend.create_user_with_auth(&account).await) {
        Ok((SuccessPath::Direct, payload)) => {
            log::debug!("✅ Imported: {} ({})", record.email, record.full_name);
            CreationOutcome::Success(payload)
        }
        Ok((path, payload)) => {
            log::info!(
                "✅ Imported (workaround: {}): {} ({})",
                path,
                record.email,
                record.full_name
            );
            CreationOutcome::Success(payload)
        }
        Err(reason) => {
            log::warn!("❌ Error creating user {}: {}", record.email, reason);
            CreationOutcome::Failure(reason)
        }
    }
}

pub fn classify(result: Result<RpcResponse, BackendError>) -> CreationOutcome {
    match recognise(result) {
        Ok((_, payload)) => CreationOutcome::Success(payload),
        Err(reason) => CreationOutcome::Failure(reason),
    }
}

/// Runs the recognition steps in order, returning the success payload or the failure reason.
pub fn recognise(
    result: Result<RpcResponse, BackendError>,
) -> Result<(SuccessPath, Value), String> {
    let reason = match result {
        Ok(response) => {
            let data = response.data.and_then(first_row);

            if let Some(payload) = data.as_ref().and_then(direct_success) {
                return Ok((SuccessPath::Direct, payload));
            }

            let decoded = data.as_ref().and_then(decode_string);
            if let Some(payload) = decoded.as_ref().and_then(direct_success) {
                return Ok((SuccessPath::EncodedString, payload));
            }

            // A decoded string replaces the raw data for the remaining steps.
            let error = response
                .error
                .filter(|e| !e.is_null())
                .or(decoded)
                .or(data);
            if let Some(payload) = error.as_ref().and_then(error_details_success) {
                return Ok((SuccessPath::ErrorDetails, payload));
            }

            format!("Error creating user: {}", describe(error.as_ref()))
        }
        Err(fault) => fault.to_string(),
    };

    // Rejected responses are rendered as text and get the same check as transport faults.
    match fault_message_success(&reason) {
        Some(payload) => Ok((SuccessPath::FaultMessage, payload)),
        None => Err(reason),
    }
}

/// Step 1: the data is itself a success object.
pub fn direct_success(data: &Value) -> Option<Value> {
    indicates_success(data).then(|| data.clone())
}

/// Step 2: the data is a string holding a success object.
pub fn encoded_success(data: &Value) -> Option<Value> {
    decode_string(data).and_then(|parsed| direct_success(&parsed))
}

fn decode_string(data: &Value) -> Option<Value> {
    serde_json::from_str(data.as_str()?).ok()
}

/// Step 3: the error's `details` string holds a success object, possibly as `b'...'`.
pub fn error_details_success(error: &Value) -> Option<Value> {
    let details = error.get("details")?.as_str()?;
    if !details.contains("success") {
        return None;
    }

    let parsed: Value = serde_json::from_str(strip_byte_literal(details)).ok()?;
    indicates_success(&parsed).then_some(parsed)
}

/// Step 4: a fault message quotes a success object, possibly with single quotes.
pub fn fault_message_success(message: &str) -> Option<Value> {
    if !SUCCESS_MARKERS.iter().any(|marker| message.contains(marker)) {
        return None;
    }

    let fragment = SUCCESS_FRAGMENT.find(message)?.as_str();
    let normalized = fragment.trim_start_matches('\\').replace('\'', "\"");
    let parsed: Value = serde_json::from_str(&normalized).ok()?;
    indicates_success(&parsed).then_some(parsed)
}

// Stricter than plain truthiness: a non-empty string other than "true" is not a success.
fn indicates_success(value: &Value) -> bool {
    match value.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn first_row(data: Value) -> Option<Value> {
    match data {
        Value::Array(rows) => rows.into_iter().next(),
        Value::Null => None,
        other => Some(other),
    }
}

fn strip_byte_literal(details: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(rest) = details.strip_prefix('b').and_then(|r| r.strip_prefix(quote)) {
            return rest.strip_suffix(quote).unwrap_or(rest);
        }
    }
    details
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "empty response".to_string(),
    }
}
