//! Shared fixtures for unit tests.

use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::schedule::domain::UnixTimestamp;

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub(crate) struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    pub(crate) const fn at_secs(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub(crate) fn now(&self) -> UnixTimestamp {
        UnixTimestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now().to_datetime()
    }
}
