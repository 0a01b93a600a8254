//! Local identifier checks.
//!
//! These only look at the shape of an identifier. They run before any
//! request is made so an obviously wrong input never reaches upstream.

use crate::errors::{
    KatError, KatErrorSubtype, ERR_INVALID_BULSTAT, ERR_INVALID_EGN, ERR_INVALID_GOV_ID,
    ERR_INVALID_LICENSE,
};
use crate::models::{Identity, PersonalDocument};
use regex::Regex;

/// 10 digits; the 5th digit encodes the birth month offset and can only be 0, 1, 2 or 4.
pub const EGN_PATTERN: &str = r"^[0-9]{4}[0124][0-9]{5}$";
pub const DRIVING_LICENSE_PATTERN: &str = r"^[0-9]{9}$";
/// Old all-digit cards and the newer two-letter series.
pub const GOVERNMENT_ID_PATTERN: &str = r"^(?:[0-9]{9}|[A-Z]{2}[0-9]{7})$";
pub const BULSTAT_PATTERN: &str = r"^[0-9]{9}$";

/// Compiled identifier patterns, built once per client.
#[derive(Debug, Clone)]
pub struct IdentifierRules {
    egn: Regex,
    driving_license: Regex,
    government_id: Regex,
    bulstat: Regex,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierRules {
    pub fn new() -> Self {
        Self {
            egn: Regex::new(EGN_PATTERN).expect("EGN pattern compiles"),
            driving_license: Regex::new(DRIVING_LICENSE_PATTERN)
                .expect("driving license pattern compiles"),
            government_id: Regex::new(GOVERNMENT_ID_PATTERN)
                .expect("government ID pattern compiles"),
            bulstat: Regex::new(BULSTAT_PATTERN).expect("BULSTAT pattern compiles"),
        }
    }

    pub fn validate_egn(&self, egn: &str) -> Result<(), KatError> {
        check(&self.egn, egn, KatErrorSubtype::ValidationEgnInvalid, ERR_INVALID_EGN)
    }

    pub fn validate_driving_license(&self, number: &str) -> Result<(), KatError> {
        check(
            &self.driving_license,
            number,
            KatErrorSubtype::ValidationDrivingLicenseInvalid,
            ERR_INVALID_LICENSE,
        )
    }

    pub fn validate_government_id(&self, number: &str) -> Result<(), KatError> {
        check(
            &self.government_id,
            number,
            KatErrorSubtype::ValidationGovIdNumberInvalid,
            ERR_INVALID_GOV_ID,
        )
    }

    pub fn validate_bulstat(&self, bulstat: &str) -> Result<(), KatError> {
        check(
            &self.bulstat,
            bulstat,
            KatErrorSubtype::ValidationBulstatInvalid,
            ERR_INVALID_BULSTAT,
        )
    }

    pub fn validate_document(&self, document: &PersonalDocument) -> Result<(), KatError> {
        match document {
            PersonalDocument::DrivingLicense(number) => self.validate_driving_license(number),
            PersonalDocument::GovernmentId(number) => self.validate_government_id(number),
        }
    }

    /// Checks every identifier of `identity`, EGN first, and reports the
    /// first one that does not match.
    pub fn validate(&self, identity: &Identity) -> Result<(), KatError> {
        match identity {
            Identity::Individual { egn, document } => {
                self.validate_egn(egn)?;
                self.validate_document(document)
            }
            Identity::Business {
                egn,
                government_id,
                bulstat,
            } => {
                self.validate_egn(egn)?;
                self.validate_government_id(government_id)?;
                self.validate_bulstat(bulstat)
            }
        }
    }
}

fn check(
    pattern: &Regex,
    value: &str,
    subtype: KatErrorSubtype,
    message: &str,
) -> Result<(), KatError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        tracing::debug!("Local validation failed: {}", subtype);
        Err(KatError::new(subtype, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> IdentifierRules {
        IdentifierRules::new()
    }

    #[test]
    fn test_valid_egns() {
        for egn in ["0011223344", "9402030507", "8801413333", "0000000000"] {
            assert!(rules().validate_egn(egn).is_ok(), "{egn} should be valid");
        }
    }

    #[test]
    fn test_egn_fifth_digit_restricted() {
        for egn in ["0011323344", "0011523344", "0011623344", "0011923344"] {
            let err = rules().validate_egn(egn).unwrap_err();
            assert_eq!(err.error_subtype, KatErrorSubtype::ValidationEgnInvalid);
        }
    }

    #[test]
    fn test_egn_wrong_length_or_characters() {
        for egn in ["", "001122334", "00112233445", "00112A3344", " 0011223344", "0011223344\n"] {
            assert!(rules().validate_egn(egn).is_err(), "{egn:?} should be invalid");
        }
    }

    #[test]
    fn test_driving_license() {
        assert!(rules().validate_driving_license("123456789").is_ok());

        let err = rules().validate_driving_license("123").unwrap_err();
        assert_eq!(
            err.error_subtype,
            KatErrorSubtype::ValidationDrivingLicenseInvalid
        );
        assert!(rules().validate_driving_license("AA1234567").is_err());
    }

    #[test]
    fn test_government_id() {
        assert!(rules().validate_government_id("645123456").is_ok());
        assert!(rules().validate_government_id("AA1234567").is_ok());

        for number in ["aa1234567", "A12345678", "AAA123456", "12345678", ""] {
            let err = rules().validate_government_id(number).unwrap_err();
            assert_eq!(err.error_subtype, KatErrorSubtype::ValidationGovIdNumberInvalid);
        }
    }

    #[test]
    fn test_bulstat() {
        assert!(rules().validate_bulstat("123456789").is_ok());

        let err = rules().validate_bulstat("12345").unwrap_err();
        assert_eq!(err.error_subtype, KatErrorSubtype::ValidationBulstatInvalid);
    }

    #[test]
    fn test_document_kind_selects_pattern() {
        let license = PersonalDocument::DrivingLicense("AA1234567".to_string());
        let gov_id = PersonalDocument::GovernmentId("AA1234567".to_string());

        assert_eq!(
            rules().validate_document(&license).unwrap_err().error_subtype,
            KatErrorSubtype::ValidationDrivingLicenseInvalid
        );
        assert!(rules().validate_document(&gov_id).is_ok());
    }

    #[test]
    fn test_identity_reports_egn_first() {
        let identity = Identity::individual(
            "bad",
            PersonalDocument::DrivingLicense("bad".to_string()),
        );
        assert_eq!(
            rules().validate(&identity).unwrap_err().error_subtype,
            KatErrorSubtype::ValidationEgnInvalid
        );
    }

    #[test]
    fn test_business_identity() {
        let ok = Identity::business("0011223344", "AA1234567", "123456789");
        assert!(rules().validate(&ok).is_ok());

        let bad_gov_id = Identity::business("0011223344", "1", "123456789");
        assert_eq!(
            rules().validate(&bad_gov_id).unwrap_err().error_subtype,
            KatErrorSubtype::ValidationGovIdNumberInvalid
        );

        let bad_bulstat = Identity::business("0011223344", "AA1234567", "1234");
        assert_eq!(
            rules().validate(&bad_bulstat).unwrap_err().error_subtype,
            KatErrorSubtype::ValidationBulstatInvalid
        );
    }
}
