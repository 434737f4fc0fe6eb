//! Shared validation helpers for the inbound adapters.

use serde_json::json;

use crate::domain::{Error, SessionId, Username};

/// Parse a username taken from a path segment or body field.
pub(crate) fn parse_username(raw: impl Into<String>, field: &'static str) -> Result<Username, Error> {
    Username::new(raw).map_err(|err| {
        Error::invalid_request(format!("invalid {field}: {err}"))
            .with_details(json!({ "field": field, "code": "invalid_username" }))
    })
}

/// Parse a numeric session id taken from a path segment.
pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, Error> {
    raw.parse().map_err(|_| {
        Error::invalid_request("sessionId must be an integer")
            .with_details(json!({ "field": "sessionId", "code": "invalid_session_id" }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case(" alice")]
    fn rejects_invalid_usernames(#[case] raw: &str) {
        let error = parse_username(raw, "userName").expect_err("invalid");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.details(),
            Some(&json!({ "field": "userName", "code": "invalid_username" }))
        );
    }

    #[rstest]
    #[case("7", Some(7))]
    #[case("seven", None)]
    #[case("", None)]
    fn parses_session_ids(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_session_id(raw).ok().map(SessionId::get), expected);
    }
}
