//! Turns whatever came back from upstream into either a usable payload or
//! exactly one `KatError`.
//!
//! The checks run in a fixed order and the first match wins:
//!
//! 1. timeout
//! 2. transport failure
//! 3. rate-limit page
//! 4. non-2xx status (mapped by upstream error code when there is one)
//! 5. body that is not JSON
//! 6. JSON without obligations data
//! 7. per-entry "no data found" / "error reading data" flags
//! 8. entries whose content cannot be typed
//!
//! Flags are read from the raw entries, so an unusable sibling never hides a
//! "no data found" or "error reading data" reported by another entry.
//!
//! Nothing in here touches the network, which keeps every branch testable
//! with plain values.

use crate::errors::{KatError, KatErrorSubtype, ERR_API_DOWN, ERR_INVALID_USER_DATA};
use crate::models::{ObligationsEntry, ObligationsPayload, UpstreamErrorBody};
use serde_json::Value;

/// Shown by upstream as a plain HTML page once a client exceeds its request quota.
pub const RATE_LIMIT_MARKER: &str = "Достигнат е максимално допустимият брой заявки към системата";

/// Upstream code for an EGN / document combination it does not recognise.
pub const CODE_INVALID_USER_DATA: &str = "GL_00038_E";
/// Upstream code returned while its backing registry is unavailable.
pub const CODE_UNDELIVERED_AND_UNPAID_DEBTS: &str = "GL_UNDELIVERED_AND_UNPAID_DEBTS_E";

const KEY_OBLIGATIONS_DATA: &str = "obligationsData";
const KEY_LEGACY_SLIP: &str = "hasNonHandedSlip";
const KEY_LEGACY_OBLIGATIONS: &str = "obligations";
const KEY_NO_DATA_FOUND: &str = "errorNoDataFound";
const KEY_READING_ERROR: &str = "errorReadingData";

const BODY_EXCERPT_CHARS: usize = 200;

/// A completed HTTP exchange, reduced to what classification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_text_or_html(&self) -> bool {
        self.content_type.as_deref().is_some_and(|content_type| {
            let mime = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            mime == "text/html" || mime == "text/plain"
        })
    }
}

/// Result of one request attempt at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    TimedOut,
    /// Connection, TLS or body-read failure, with the underlying error text.
    Failed(String),
    Completed(HttpReply),
}

impl From<reqwest::Error> for TransportOutcome {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportOutcome::TimedOut
        } else {
            TransportOutcome::Failed(err.to_string())
        }
    }
}

/// Classifies a transport outcome.
pub fn classify(outcome: TransportOutcome) -> Result<ObligationsPayload, KatError> {
    let reply = match outcome {
        TransportOutcome::TimedOut => {
            return Err(KatError::new(
                KatErrorSubtype::ApiTimeout,
                "KAT API request timed out",
            ))
        }
        TransportOutcome::Failed(detail) => {
            return Err(KatError::new(
                KatErrorSubtype::ApiUnknownError,
                format!("KAT API returned an unknown error: {}", detail),
            ))
        }
        TransportOutcome::Completed(reply) => reply,
    };

    if reply.is_text_or_html() && reply.body.contains(RATE_LIMIT_MARKER) {
        return Err(KatError::new(
            KatErrorSubtype::ApiTooManyRequests,
            "KAT API too many requests",
        ));
    }

    if !reply.is_success() {
        return Err(classify_error_status(&reply));
    }

    let data: Value = serde_json::from_str(&reply.body).map_err(|e| {
        KatError::new(
            KatErrorSubtype::ApiMalformedResponse,
            format!("KAT API returned a malformed response: {}", e),
        )
    })?;

    let entries = extract_entries(data, &reply.body)?;
    check_entry_flags(&entries)?;

    let entries = entries
        .into_iter()
        .map(serde_json::from_value::<ObligationsEntry>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed_entries)?;

    Ok(ObligationsPayload { entries })
}

/// Maps a non-2xx reply. Only codes we have actually seen get a dedicated
/// subtype; everything else is reported as unknown.
fn classify_error_status(reply: &HttpReply) -> KatError {
    match serde_json::from_str::<UpstreamErrorBody>(&reply.body) {
        Ok(body) if body.code == CODE_INVALID_USER_DATA => KatError::new(
            KatErrorSubtype::ValidationUserNotFoundOnline,
            ERR_INVALID_USER_DATA,
        ),
        Ok(body) if body.code == CODE_UNDELIVERED_AND_UNPAID_DEBTS => {
            KatError::new(KatErrorSubtype::ApiErrorReadingData, ERR_API_DOWN)
        }
        Ok(body) => KatError::new(
            KatErrorSubtype::ApiUnknownError,
            format!(
                "KAT API returned an unknown error: HTTP {} with code {}{}",
                reply.status,
                body.code,
                body.message
                    .map(|message| format!(" ({})", message))
                    .unwrap_or_default()
            ),
        ),
        Err(_) => KatError::new(
            KatErrorSubtype::ApiUnknownError,
            format!(
                "KAT API returned an unknown error: HTTP {}: {}",
                reply.status,
                excerpt(&reply.body)
            ),
        ),
    }
}

/// Pulls the raw sub-entries out of a decoded body.
///
/// Current responses carry a list under `obligationsData`. Older ones put a
/// single `hasNonHandedSlip` / `obligations` pair at the top level; that
/// shape is read as one sub-entry. Entries stay untyped here so their flags
/// can be read before the rest of their content is checked.
fn extract_entries(data: Value, raw_body: &str) -> Result<Vec<Value>, KatError> {
    let mut object = match data {
        Value::Object(object) => object,
        _ => return Err(invalid_schema(raw_body)),
    };

    if let Some(entries) = object.remove(KEY_OBLIGATIONS_DATA) {
        return match entries {
            Value::Array(entries) => Ok(entries),
            other => Err(KatError::new(
                KatErrorSubtype::ApiMalformedResponse,
                format!(
                    "KAT API returned a malformed response: {} is not a list: {}",
                    KEY_OBLIGATIONS_DATA,
                    excerpt(&other.to_string())
                ),
            )),
        };
    }

    if object.contains_key(KEY_LEGACY_SLIP) && object.contains_key(KEY_LEGACY_OBLIGATIONS) {
        return Ok(vec![Value::Object(object)]);
    }

    Err(invalid_schema(raw_body))
}

/// A "not found" in any entry wins over everything else in the payload,
/// including entries whose other fields are unusable.
fn check_entry_flags(entries: &[Value]) -> Result<(), KatError> {
    if entries.iter().any(|entry| flag(entry, KEY_NO_DATA_FOUND)) {
        return Err(KatError::new(
            KatErrorSubtype::ValidationUserNotFoundOnline,
            ERR_INVALID_USER_DATA,
        ));
    }

    if entries.iter().any(|entry| flag(entry, KEY_READING_ERROR)) {
        return Err(KatError::new(
            KatErrorSubtype::ApiErrorReadingData,
            ERR_API_DOWN,
        ));
    }

    Ok(())
}

/// Missing, `null` or non-boolean flags read as `false`.
fn flag(entry: &Value, key: &str) -> bool {
    entry.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn invalid_schema(raw_body: &str) -> KatError {
    KatError::new(
        KatErrorSubtype::ApiInvalidSchema,
        format!(
            "KAT API returned a response with an unexpected schema: {}",
            excerpt(raw_body)
        ),
    )
}

fn malformed_entries(err: serde_json::Error) -> KatError {
    KatError::new(
        KatErrorSubtype::ApiMalformedResponse,
        format!("KAT API returned a malformed response: {}", err),
    )
}

fn excerpt(body: &str) -> String {
    let mut excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    if body.chars().count() > BODY_EXCERPT_CHARS {
        excerpt.push('…');
    }
    excerpt
}
