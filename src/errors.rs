use std::fmt;

/// Coarse error category.
///
/// Callers that only need to know "was it my input or was it the API" can
/// match on this and ignore the subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KatErrorType {
    /// The identifiers supplied by the caller were rejected, locally or upstream.
    ValidationError,
    /// The upstream API failed, timed out, throttled us or changed its contract.
    ApiError,
}

/// Exact failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KatErrorSubtype {
    /// EGN failed the local format check.
    ValidationEgnInvalid,
    /// Driving licence number failed the local format check.
    ValidationDrivingLicenseInvalid,
    /// Government ID number failed the local format check.
    ValidationGovIdNumberInvalid,
    /// BULSTAT failed the local format check.
    ValidationBulstatInvalid,
    /// Upstream does not know this identity combination.
    ValidationUserNotFoundOnline,
    /// The request exceeded the per-request timeout.
    ApiTimeout,
    /// Upstream served its "maximum request count reached" page.
    ApiTooManyRequests,
    /// Upstream reported an internal failure while reading its data.
    ApiErrorReadingData,
    /// The JSON is missing the obligations data entirely.
    ApiInvalidSchema,
    /// The body is not JSON, or a field has an unexpected type.
    ApiMalformedResponse,
    /// Transport failure or an upstream error code we have no mapping for.
    ApiUnknownError,
}

impl KatErrorSubtype {
    /// The category this subtype belongs to.
    pub fn error_type(self) -> KatErrorType {
        match self {
            Self::ValidationEgnInvalid
            | Self::ValidationDrivingLicenseInvalid
            | Self::ValidationGovIdNumberInvalid
            | Self::ValidationBulstatInvalid
            | Self::ValidationUserNotFoundOnline => KatErrorType::ValidationError,
            Self::ApiTimeout
            | Self::ApiTooManyRequests
            | Self::ApiErrorReadingData
            | Self::ApiInvalidSchema
            | Self::ApiMalformedResponse
            | Self::ApiUnknownError => KatErrorType::ApiError,
        }
    }

    /// Whether repeating the same request later may succeed.
    ///
    /// Only transient upstream conditions qualify. Validation failures need
    /// different input, contract failures need a new release of this crate.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::ApiTimeout | Self::ApiTooManyRequests | Self::ApiErrorReadingData
        )
    }

    /// Stable machine-readable code, e.g. `VALIDATION_EGN_INVALID`.
    pub fn code(self) -> &'static str {
        match self {
            Self::ValidationEgnInvalid => "VALIDATION_EGN_INVALID",
            Self::ValidationDrivingLicenseInvalid => "VALIDATION_DRIVING_LICENSE_INVALID",
            Self::ValidationGovIdNumberInvalid => "VALIDATION_GOV_ID_NUMBER_INVALID",
            Self::ValidationBulstatInvalid => "VALIDATION_BULSTAT_INVALID",
            Self::ValidationUserNotFoundOnline => "VALIDATION_USER_NOT_FOUND_ONLINE",
            Self::ApiTimeout => "API_TIMEOUT",
            Self::ApiTooManyRequests => "API_TOO_MANY_REQUESTS",
            Self::ApiErrorReadingData => "API_ERROR_READING_DATA",
            Self::ApiInvalidSchema => "API_INVALID_SCHEMA",
            Self::ApiMalformedResponse => "API_MALFORMED_RESPONSE",
            Self::ApiUnknownError => "API_UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for KatErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KatErrorType::ValidationError => write!(f, "VALIDATION_ERROR"),
            KatErrorType::ApiError => write!(f, "API_ERROR"),
        }
    }
}

impl fmt::Display for KatErrorSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The only error type returned by the public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{error_subtype}] {message}")]
pub struct KatError {
    pub error_type: KatErrorType,
    pub error_subtype: KatErrorSubtype,
    pub message: String,
}

impl KatError {
    /// Creates an error; the type is derived from the subtype so the two
    /// can never disagree.
    pub fn new(error_subtype: KatErrorSubtype, message: impl Into<String>) -> Self {
        Self {
            error_type: error_subtype.error_type(),
            error_subtype,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.error_subtype.is_retryable()
    }
}

pub(crate) const ERR_INVALID_EGN: &str = "EGN is not valid.";
pub(crate) const ERR_INVALID_LICENSE: &str = "Driving License Number is not valid.";
pub(crate) const ERR_INVALID_GOV_ID: &str = "Government ID Number is not valid.";
pub(crate) const ERR_INVALID_BULSTAT: &str = "BULSTAT is not valid.";
pub(crate) const ERR_INVALID_USER_DATA: &str =
    "User data (EGN and identity document combination) is not valid.";
pub(crate) const ERR_API_DOWN: &str =
    "KAT API was unable to process the request. Try again later.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_follows_subtype() {
        let err = KatError::new(KatErrorSubtype::ValidationBulstatInvalid, "bad");
        assert_eq!(err.error_type, KatErrorType::ValidationError);

        let err = KatError::new(KatErrorSubtype::ApiInvalidSchema, "drift");
        assert_eq!(err.error_type, KatErrorType::ApiError);
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = KatError::new(KatErrorSubtype::ApiTimeout, "took too long");
        assert_eq!(err.to_string(), "[API_TIMEOUT] took too long");
    }

    #[test]
    fn test_retryable_subtypes() {
        assert!(KatErrorSubtype::ApiTimeout.is_retryable());
        assert!(KatErrorSubtype::ApiTooManyRequests.is_retryable());
        assert!(KatErrorSubtype::ApiErrorReadingData.is_retryable());

        assert!(!KatErrorSubtype::ValidationEgnInvalid.is_retryable());
        assert!(!KatErrorSubtype::ValidationUserNotFoundOnline.is_retryable());
        assert!(!KatErrorSubtype::ApiInvalidSchema.is_retryable());
        assert!(!KatErrorSubtype::ApiMalformedResponse.is_retryable());
        assert!(!KatErrorSubtype::ApiUnknownError.is_retryable());
    }
}
