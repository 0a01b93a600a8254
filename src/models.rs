use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Caller-facing identities ============

/// Personal document that accompanies the EGN of an individual.
///
/// The two kinds are queried through different upstream parameters and are
/// never interchangeable, so the caller has to say which one it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "number", rename_all = "snake_case")]
pub enum PersonalDocument {
    /// Bulgarian driving licence, 9 digits.
    DrivingLicense(String),
    /// Identity card number.
    GovernmentId(String),
}

impl PersonalDocument {
    pub fn number(&self) -> &str {
        match self {
            PersonalDocument::DrivingLicense(number) | PersonalDocument::GovernmentId(number) => {
                number
            }
        }
    }
}

/// Everything upstream needs to look up obligations for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// A natural person.
    Individual {
        egn: String,
        document: PersonalDocument,
    },
    /// A legal entity, looked up through its owner's EGN and ID card.
    Business {
        egn: String,
        government_id: String,
        bulstat: String,
    },
}

impl Identity {
    pub fn individual(egn: impl Into<String>, document: PersonalDocument) -> Self {
        Identity::Individual {
            egn: egn.into(),
            document,
        }
    }

    pub fn business(
        egn: impl Into<String>,
        government_id: impl Into<String>,
        bulstat: impl Into<String>,
    ) -> Self {
        Identity::Business {
            egn: egn.into(),
            government_id: government_id.into(),
            bulstat: bulstat.into(),
        }
    }

    /// Short label for logs. Never contains the identifiers themselves.
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Individual {
                document: PersonalDocument::DrivingLicense(_),
                ..
            } => "individual/driving-license",
            Identity::Individual {
                document: PersonalDocument::GovernmentId(_),
                ..
            } => "individual/government-id",
            Identity::Business { .. } => "business",
        }
    }
}

// ============ Parsed results ============

/// One fine or penal document.
///
/// String fields are passed through exactly as upstream sends them,
/// including its date formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    /// Issuing authority group of the sub-entry this record came from.
    pub unit_group: Option<i64>,
    pub description: String,
    pub document_number: String,
    pub debtor_name: String,
    pub debtor_identifier: String,
    pub date_created: String,
    /// Empty until the document has been formally served.
    pub date_served: String,
    pub amount: BigDecimal,
    /// Early-payment discount.
    pub discount_percent: u32,
}

impl Obligation {
    pub fn is_served(&self) -> bool {
        !self.date_served.trim().is_empty()
    }
}

/// Result of a single obligations lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationQueryResult {
    /// In upstream order, sub-entries concatenated.
    pub obligations: Vec<Obligation>,
    /// A notice exists that has not been handed to the debtor yet.
    ///
    /// Such a notice is not a payable fine, so it never shows up in
    /// `obligations`.
    pub has_undelivered_notice: bool,
}

impl ObligationQueryResult {
    pub fn has_obligations(&self) -> bool {
        self.has_undelivered_notice || !self.obligations.is_empty()
    }
}

// ============ Upstream wire format ============

/// One unit of a possibly multi-part upstream response.
///
/// Upstream splits a lookup per issuing authority and reports success or
/// failure for each unit separately. The `errorNoDataFound` and
/// `errorReadingData` flags are read by the classifier before an entry is
/// typed, so they are not part of this struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationsEntry {
    #[serde(default)]
    pub unit_group: Option<i64>,
    #[serde(default)]
    pub has_non_handed_slip: Option<bool>,
    /// Kept untyped until the parser converts each record.
    pub obligations: Vec<Value>,
}

impl ObligationsEntry {
    pub fn has_non_handed_slip(&self) -> bool {
        self.has_non_handed_slip.unwrap_or(false)
    }
}

/// A response body that passed classification.
#[derive(Debug, Clone)]
pub struct ObligationsPayload {
    pub entries: Vec<ObligationsEntry>,
}

/// Obligation record as sent by upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObligation {
    pub payment_reason: String,
    pub obliged_person_name: String,
    pub obliged_person_ident: String,
    #[serde(default)]
    pub obligation_date: Option<String>,
    /// String or number depending on the upstream release.
    pub amount: Value,
    pub additional_data: RawAdditionalData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAdditionalData {
    pub document_number: String,
    pub fish_create_date: String,
    /// String or number depending on the upstream release.
    pub discount: Value,
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_obligation(date_served: &str) -> Obligation {
        Obligation {
            unit_group: Some(1),
            description: "Speeding".to_string(),
            document_number: "Ф123456".to_string(),
            debtor_name: "Иван Иванов".to_string(),
            debtor_identifier: "0011223344".to_string(),
            date_created: "2024-01-15T00:00:00".to_string(),
            date_served: date_served.to_string(),
            amount: BigDecimal::from_str("50.00").unwrap(),
            discount_percent: 30,
        }
    }

    #[test]
    fn test_has_obligations_from_records() {
        let result = ObligationQueryResult {
            obligations: vec![sample_obligation("")],
            has_undelivered_notice: false,
        };
        assert!(result.has_obligations());
    }

    #[test]
    fn test_has_obligations_from_undelivered_notice_only() {
        let result = ObligationQueryResult {
            obligations: vec![],
            has_undelivered_notice: true,
        };
        assert!(result.has_obligations());
        assert!(!ObligationQueryResult::default().has_obligations());
    }

    #[test]
    fn test_is_served() {
        assert!(!sample_obligation("").is_served());
        assert!(!sample_obligation("  ").is_served());
        assert!(sample_obligation("2024-02-01T00:00:00").is_served());
    }

    #[test]
    fn test_identity_kind_hides_identifiers() {
        let identity = Identity::individual(
            "0011223344",
            PersonalDocument::DrivingLicense("123456789".to_string()),
        );
        assert_eq!(identity.kind(), "individual/driving-license");
        assert!(!identity.kind().contains("0011223344"));

        let identity = Identity::business("0011223344", "AA1234567", "123456789");
        assert_eq!(identity.kind(), "business");
        assert!(!identity.kind().contains("175074752"));
    }
}
