//! Converts a classified payload into `ObligationQueryResult`.

use crate::errors::{KatError, KatErrorSubtype};
use crate::models::{
    Obligation, ObligationQueryResult, ObligationsEntry, ObligationsPayload, RawObligation,
};
use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;

/// Flattens every entry's obligations, entry by entry, keeping upstream order.
///
/// Expects a payload that already went through `classifier::classify`, so
/// entry-level failure flags are not looked at again.
pub fn parse(payload: ObligationsPayload) -> Result<ObligationQueryResult, KatError> {
    let has_undelivered_notice = payload
        .entries
        .iter()
        .any(ObligationsEntry::has_non_handed_slip);

    let mut obligations = Vec::new();
    for entry in payload.entries {
        for raw in entry.obligations {
            obligations.push(parse_obligation(raw, entry.unit_group)?);
        }
    }

    Ok(ObligationQueryResult {
        obligations,
        has_undelivered_notice,
    })
}

fn parse_obligation(raw: Value, unit_group: Option<i64>) -> Result<Obligation, KatError> {
    let raw: RawObligation = serde_json::from_value(raw)
        .map_err(|e| malformed(format!("unexpected obligation record: {}", e)))?;

    let amount = parse_amount(&raw.amount)?;
    let discount_percent = parse_discount(&raw.additional_data.discount)?;

    Ok(Obligation {
        unit_group,
        description: raw.payment_reason,
        document_number: raw.additional_data.document_number,
        debtor_name: raw.obliged_person_name,
        debtor_identifier: raw.obliged_person_ident,
        date_created: raw.additional_data.fish_create_date,
        date_served: raw.obligation_date.unwrap_or_default(),
        amount,
        discount_percent,
    })
}

/// Accepts `"150.00"` as well as `150.0`; parsed from text so no binary
/// floating point rounding is introduced.
pub fn parse_amount(value: &Value) -> Result<BigDecimal, KatError> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        other => return Err(malformed(format!("amount is not numeric: {}", other))),
    };

    BigDecimal::from_str(&text)
        .map_err(|_| malformed(format!("amount is not numeric: {:?}", text)))
}

/// Accepts `"30"`, `30` and `30.0`.
pub fn parse_discount(value: &Value) -> Result<u32, KatError> {
    let parsed = match value {
        Value::String(text) => text.trim().parse::<u32>().ok(),
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        _ => None,
    };

    parsed.ok_or_else(|| malformed(format!("discount is not a whole number: {}", value)))
}

fn malformed(detail: String) -> KatError {
    KatError::new(
        KatErrorSubtype::ApiMalformedResponse,
        format!("KAT API returned a malformed response: {}", detail),
    )
}
