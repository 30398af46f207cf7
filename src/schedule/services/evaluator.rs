//! Cached CRON parsing and occurrence computation.

use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::schedule::domain::{CronDefinition, CronError, CronExpression, UnixTimestamp};

/// Parses CRON definitions and computes their occurrences.
///
/// Parsed expressions are cached by definition text and grammar for the
/// lifetime of the evaluator. The cache is unbounded and never evicted; share
/// one evaluator per process.
#[derive(Debug, Default)]
pub struct CronScheduleEvaluator {
    cache: RwLock<HashMap<CronDefinition, Arc<CronExpression>>>,
}

impl CronScheduleEvaluator {
    /// Creates an evaluator with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `definition`, returning the cached expression when the same
    /// text and grammar were parsed before.
    ///
    /// # Errors
    ///
    /// Returns [`CronError`] when the text does not match its grammar.
    /// Failed parses are not cached.
    pub fn parse(&self, definition: &CronDefinition) -> Result<Arc<CronExpression>, CronError> {
        if let Some(cached) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(definition).cloned())
        {
            return Ok(cached);
        }

        let parsed = Arc::new(CronExpression::parse(definition)?);
        if let Ok(mut cache) = self.cache.write() {
            let entry = cache
                .entry(definition.clone())
                .or_insert_with(|| Arc::clone(&parsed));
            return Ok(Arc::clone(entry));
        }
        Ok(parsed)
    }

    /// Returns every occurrence of `expression` in `[from, window_end]`,
    /// ascending, with wall-clock fields interpreted in `timezone`.
    pub fn next_occurrences<'a>(
        &self,
        expression: &'a CronExpression,
        from: UnixTimestamp,
        window_end: UnixTimestamp,
        timezone: Tz,
    ) -> impl Iterator<Item = UnixTimestamp> + 'a {
        expression.occurrences(from, window_end, timezone)
    }

    /// Returns the number of cached expressions.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.read().map_or(0, |cache| cache.len())
    }
}
