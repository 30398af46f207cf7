//! Upcoming-occurrence queue.

use super::UnixTimestamp;
use serde::{Deserialize, Serialize};

/// Maximum number of occurrences a schedule keeps queued.
pub const MAX_QUEUE_LENGTH: usize = 5;

/// Ascending, de-duplicated list of at most [`MAX_QUEUE_LENGTH`] future
/// runtimes, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UnixTimestamp>", into = "Vec<UnixTimestamp>")]
pub struct RuntimeQueue(Vec<UnixTimestamp>);

impl RuntimeQueue {
    /// Returns an empty queue.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a queue from the first `length` occurrences, capped at
    /// [`MAX_QUEUE_LENGTH`].
    #[must_use]
    pub fn from_occurrences(
        occurrences: impl IntoIterator<Item = UnixTimestamp>,
        length: usize,
    ) -> Self {
        let limit = length.min(MAX_QUEUE_LENGTH);
        let mut runtimes: Vec<UnixTimestamp> = occurrences.into_iter().take(limit).collect();
        runtimes.sort_unstable();
        runtimes.dedup();
        Self(runtimes)
    }

    /// Returns the nearest queued runtime.
    #[must_use]
    pub fn first(&self) -> Option<UnixTimestamp> {
        self.0.first().copied()
    }

    /// Returns the queued runtimes.
    #[must_use]
    pub fn as_slice(&self) -> &[UnixTimestamp] {
        &self.0
    }

    /// Returns the number of queued runtimes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<UnixTimestamp>> for RuntimeQueue {
    fn from(runtimes: Vec<UnixTimestamp>) -> Self {
        let mut sorted = runtimes;
        sorted.sort_unstable();
        sorted.dedup();
        sorted.truncate(MAX_QUEUE_LENGTH);
        Self(sorted)
    }
}

impl From<RuntimeQueue> for Vec<UnixTimestamp> {
    fn from(queue: RuntimeQueue) -> Self {
        queue.0
    }
}
