//! CRON definitions and parsed expressions.
//!
//! Two grammars are accepted: the classic five-field form
//! (`minute hour day-of-month month day-of-week`) and a six-field form with a
//! leading seconds field. In both, day-of-week values run 0-7 with 0 and 7
//! meaning Sunday. Expressions are normalised into the seven-slot grammar of
//! the `cron` crate, whose day-of-week numbering starts at 1 for Sunday.

use super::{ScheduleDomainError, UnixTimestamp};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

const LAST_WEEKDAY: u8 = 7;

/// Stored trigger definition of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CronDefinition {
    expression: String,
    include_seconds: bool,
}

impl CronDefinition {
    /// Creates a definition from raw text.
    ///
    /// Only emptiness is checked here; syntax is checked when the expression
    /// is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyCronExpression`] when the text is
    /// blank.
    pub fn new(
        expression: impl Into<String>,
        include_seconds: bool,
    ) -> Result<Self, ScheduleDomainError> {
        let raw = expression.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScheduleDomainError::EmptyCronExpression);
        }
        Ok(Self {
            expression: trimmed.to_owned(),
            include_seconds,
        })
    }

    /// Returns the expression text.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns `true` when the six-field grammar applies.
    #[must_use]
    pub const fn include_seconds(&self) -> bool {
        self.include_seconds
    }
}

/// Errors raised while parsing CRON text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CronError {
    /// The expression has the wrong number of fields for its grammar.
    #[error("CRON expression '{expression}' has {found} fields, expected {expected}")]
    FieldCount {
        /// Offending expression.
        expression: String,
        /// Field count required by the grammar.
        expected: usize,
        /// Field count found.
        found: usize,
    },

    /// The day-of-week field cannot be interpreted.
    #[error("CRON expression '{expression}' has an invalid day-of-week field '{field}'")]
    DayOfWeek {
        /// Offending expression.
        expression: String,
        /// Offending field.
        field: String,
    },

    /// The expression is rejected by the CRON grammar.
    #[error("CRON expression '{expression}' is invalid: {reason}")]
    Syntax {
        /// Offending expression.
        expression: String,
        /// Parser message.
        reason: String,
    },
}

/// Parsed, reusable CRON expression.
#[derive(Debug, Clone)]
pub struct CronExpression {
    definition: CronDefinition,
    schedule: cron::Schedule,
}

impl CronExpression {
    /// Parses a definition.
    ///
    /// # Errors
    ///
    /// Returns [`CronError`] when the text does not match its grammar.
    pub fn parse(definition: &CronDefinition) -> Result<Self, CronError> {
        let normalized = normalize(definition.expression(), definition.include_seconds())?;
        let schedule =
            cron::Schedule::from_str(&normalized).map_err(|err| CronError::Syntax {
                expression: definition.expression().to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            definition: definition.clone(),
            schedule,
        })
    }

    /// Returns the definition this expression was parsed from.
    #[must_use]
    pub const fn definition(&self) -> &CronDefinition {
        &self.definition
    }

    /// Returns occurrences in `[from, until]`, ascending.
    ///
    /// Wall-clock fields are interpreted in `timezone`. The sequence is
    /// finite and cannot be restarted.
    pub fn occurrences(
        &self,
        from: UnixTimestamp,
        until: UnixTimestamp,
        timezone: Tz,
    ) -> impl Iterator<Item = UnixTimestamp> + '_ {
        let start = from.plus_secs(-1).to_datetime().with_timezone(&timezone);
        self.schedule
            .after(&start)
            .map(|occurrence| UnixTimestamp::from_datetime(occurrence.with_timezone(&Utc)))
            .take_while(move |occurrence| *occurrence <= until)
    }
}

/// Rewrites classic CRON text into the seven-slot `cron` crate grammar.
fn normalize(expression: &str, include_seconds: bool) -> Result<String, CronError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let expected = if include_seconds { 6 } else { 5 };
    let Some((day_of_week, leading)) = fields.split_last() else {
        return Err(CronError::FieldCount {
            expression: expression.to_owned(),
            expected,
            found: 0,
        });
    };
    if fields.len() != expected {
        return Err(CronError::FieldCount {
            expression: expression.to_owned(),
            expected,
            found: fields.len(),
        });
    }

    let mut normalized: Vec<String> = Vec::with_capacity(7);
    if !include_seconds {
        normalized.push("0".to_owned());
    }
    normalized.extend(leading.iter().map(|field| (*field).to_owned()));
    normalized.push(translate_day_of_week(day_of_week).ok_or_else(|| CronError::DayOfWeek {
        expression: expression.to_owned(),
        field: (*day_of_week).to_owned(),
    })?);
    Ok(normalized.join(" "))
}

/// Maps numeric day-of-week values (0-7, Sunday = 0 or 7) onto the 1-7
/// numbering used by the `cron` crate. Named days pass through unchanged.
fn translate_day_of_week(field: &str) -> Option<String> {
    if field == "*" || field == "?" {
        return Some(field.to_owned());
    }

    let mut named: Vec<&str> = Vec::new();
    let mut days: BTreeSet<u8> = BTreeSet::new();
    for item in field.split(',') {
        if item.chars().any(|ch| ch.is_ascii_alphabetic()) {
            named.push(item);
            continue;
        }
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step.parse::<u8>().ok()?)),
            None => (item, None),
        };
        let (start, end) = match (range, range.split_once('-')) {
            ("*", _) => (0, LAST_WEEKDAY - 1),
            (_, Some((start, end))) => (start.parse::<u8>().ok()?, end.parse::<u8>().ok()?),
            (single, None) => {
                let day = single.parse::<u8>().ok()?;
                (day, if step.is_some() { LAST_WEEKDAY - 1 } else { day })
            }
        };
        if start > end || end > LAST_WEEKDAY || step == Some(0) {
            return None;
        }
        let stride = usize::from(step.unwrap_or(1));
        days.extend((start..=end).step_by(stride).map(to_crate_weekday));
    }

    let mut parts: Vec<String> = named.into_iter().map(str::to_owned).collect();
    parts.extend(days.into_iter().map(|day| day.to_string()));
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(","))
}

/// Sunday is 0 or 7 in classic CRON and 1 in the `cron` crate.
const fn to_crate_weekday(day: u8) -> u8 {
    if day == LAST_WEEKDAY { 1 } else { day + 1 }
}
