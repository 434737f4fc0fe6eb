//! Shared helpers for domain unit tests.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::Username;

pub fn name(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

/// Clock pinned to a unix timestamp that tests advance explicitly.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(unix_seconds: i64) -> Self {
        let now = Utc
            .timestamp_opt(unix_seconds, 0)
            .single()
            .expect("valid fixture timestamp");
        Self(Mutex::new(now))
    }

    pub fn advance(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}
