//! Tracking relationship primitives.

use std::fmt;

use serde::Serialize;

use crate::domain::{UserId, Username};

/// Directed `(trackee, watcher)` pair identifying one live-tracking stream.
///
/// Kept structured so that usernames containing separators cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingPair {
    pub trackee: Username,
    pub watcher: Username,
}

impl TrackingPair {
    #[must_use]
    pub fn new(trackee: Username, watcher: Username) -> Self {
        Self { trackee, watcher }
    }
}

impl fmt::Display for TrackingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.watcher, self.trackee)
    }
}

/// Stored watcher edge of a trackee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRelationship {
    pub trackee: UserId,
    pub watcher: UserId,
    /// Unix seconds of the most recent `start_tracking`.
    pub established_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::name;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    fn pairs_with_separator_characters_stay_distinct() {
        let first = TrackingPair::new(name("a:b"), name("c"));
        let second = TrackingPair::new(name("a"), name("b:c"));
        let set: HashSet<_> = [first, second].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    fn display_reads_watcher_first() {
        let pair = TrackingPair::new(name("alice"), name("bob"));
        assert_eq!(pair.to_string(), "bob -> alice");
    }
}
