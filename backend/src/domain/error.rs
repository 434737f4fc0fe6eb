//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses, WebSocket frames, or any other protocol-specific envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The referenced username has not been registered.
    UnknownUser,
    /// The username is already taken.
    AlreadyRegistered,
    /// The trackee does not accept watchers.
    NotTrackable,
    /// The reporting user has no current session.
    NoActiveSession,
    /// The requested record does not exist.
    NotFound,
    /// The backing store could not be reached or rejected a command.
    StoreUnavailable,
    /// A live subscription ended abnormally.
    SubscriptionFailure,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use location_tracker::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::NotFound, "missing");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    #[schema(example = "unknown_user")]
    code: ErrorCode,
    #[schema(example = "user alice is not registered")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// # Panics
    /// Panics when `message` is blank.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use location_tracker::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "userName" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::UnknownUser`].
    pub fn unknown_user(username: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::UnknownUser,
            format!("user {} is not registered", username.as_ref()),
        )
    }

    /// Convenience constructor for [`ErrorCode::AlreadyRegistered`].
    pub fn already_registered(username: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::AlreadyRegistered,
            format!("user {} is already registered", username.as_ref()),
        )
    }

    /// Convenience constructor for [`ErrorCode::NotTrackable`].
    pub fn not_trackable(username: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::NotTrackable,
            format!("user {} is not trackable", username.as_ref()),
        )
    }

    /// Convenience constructor for [`ErrorCode::NoActiveSession`].
    pub fn no_active_session(username: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::NoActiveSession,
            format!("user {} has no active session", username.as_ref()),
        )
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::StoreUnavailable`].
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::SubscriptionFailure`].
    pub fn subscription_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SubscriptionFailure, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Self::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for error construction and serialisation.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn try_new_rejects_empty_messages() {
        let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
        assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
    }

    #[rstest]
    #[case(Error::unknown_user("alice"), ErrorCode::UnknownUser, "user alice is not registered")]
    #[case(Error::already_registered("bob"), ErrorCode::AlreadyRegistered, "user bob is already registered")]
    #[case(Error::not_trackable("carol"), ErrorCode::NotTrackable, "user carol is not trackable")]
    #[case(Error::no_active_session("dan"), ErrorCode::NoActiveSession, "user dan has no active session")]
    fn named_constructors_describe_the_user(
        #[case] error: Error,
        #[case] code: ErrorCode,
        #[case] message: &str,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.message(), message);
    }

    #[rstest]
    fn serialises_code_in_snake_case() {
        let error = Error::store_unavailable("redis down").with_details(json!({"attempt": 1}));
        let value = serde_json::to_value(&error).expect("error serialises");
        assert_eq!(
            value,
            json!({
                "code": "store_unavailable",
                "message": "redis down",
                "details": {"attempt": 1}
            })
        );
    }

    #[rstest]
    fn deserialisation_rejects_blank_messages() {
        let payload = json!({"code": "not_found", "message": " "});
        let result = serde_json::from_value::<Error>(payload);
        assert!(result.is_err());
    }
}
