//! Store key layout shared by the domain managers.

use crate::domain::{Error, LocationId, SessionId, UserId, Username};

pub(crate) const USERS: &str = "users";
pub(crate) const TRACKABLES: &str = "trackables";
pub(crate) const NEXT_USER_ID: &str = "next_user_id";
pub(crate) const NEXT_SESSION_ID: &str = "next_session_id";
pub(crate) const NEXT_LOCATION_ID: &str = "next_location_id";

pub(crate) const FIELD_USERNAME: &str = "username";
pub(crate) const FIELD_TRACKABLE: &str = "trackable";
pub(crate) const FIELD_CURRENT_SESSION: &str = "currentsession";

pub(crate) const FIELD_LONGITUDE: &str = "longitude";
pub(crate) const FIELD_LATITUDE: &str = "latitude";
pub(crate) const FIELD_TIMESTAMP: &str = "timestamp";
pub(crate) const FIELD_SESSION: &str = "session";

pub(crate) fn user(id: UserId) -> String {
    format!("user:{id}")
}

pub(crate) fn user_sessions(id: UserId) -> String {
    format!("sessions:{id}")
}

pub(crate) fn tracked(trackee: UserId) -> String {
    format!("tracked:{trackee}")
}

pub(crate) fn session(id: SessionId) -> String {
    format!("session:{id}")
}

pub(crate) fn location(id: LocationId) -> String {
    crate::domain::LocationKey::for_id(id).to_string()
}

pub(crate) fn channel(username: &Username) -> String {
    format!("channel:{username}")
}

/// Encode a boolean flag the way `HSET` stores it.
pub(crate) fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

/// Decode a stored flag; anything but `1`/`true` reads as false.
pub(crate) fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1" | "true"))
}

/// Parse a value read back from the store.
pub(crate) fn parse_stored<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| Error::internal(format!("corrupt {what} in store: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("1"), true)]
    #[case(Some("true"), true)]
    #[case(Some("0"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn parses_stored_flags(#[case] raw: Option<&str>, #[case] expected: bool) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[rstest]
    fn corrupt_values_surface_as_internal_errors() {
        let error = parse_stored::<i64>("abc", "user id").expect_err("not numeric");
        assert_eq!(error.code(), crate::domain::ErrorCode::InternalError);
    }

    #[rstest]
    fn channel_is_per_username() {
        let alice = Username::new("alice").expect("valid username");
        assert_eq!(channel(&alice), "channel:alice");
    }
}
