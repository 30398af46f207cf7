//! Scheduler settings.
//!
//! Settings are deserialised from JSON with per-field defaults, so a partial
//! document such as `{"timezone": "Europe/Berlin"}` is valid. Secrets and
//! connection strings are loaded by the hosting application and are not
//! represented here.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::domain::IdentityClientId;
use crate::schedule::domain::MAX_QUEUE_LENGTH;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings document is not valid JSON for [`SchedulerSettings`].
    #[error("failed to parse scheduler settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric setting is outside its accepted range.
    #[error("setting '{name}' must be between {min} and {max}, found {value}")]
    OutOfRange {
        /// Setting name.
        name: &'static str,
        /// Minimum accepted value.
        min: u64,
        /// Maximum accepted value.
        max: u64,
        /// Configured value.
        value: u64,
    },

    /// A string setting is empty.
    #[error("setting '{0}' must not be empty")]
    Empty(&'static str),
}

/// Feature flag keys evaluated at the start of each poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlagKeys {
    /// Master switch for the poll cycle.
    pub scheduler: String,
    /// Enables verbose logging of recomputed runtime queues.
    pub calculation_detail: String,
    /// Enables schedule history recording.
    pub history: String,
    /// Forces runtime recomputation for every stored schedule.
    pub force_recalculate: String,
}

impl Default for FeatureFlagKeys {
    fn default() -> Self {
        Self {
            scheduler: "net-scheduler".to_owned(),
            calculation_detail: "scheduler-console-calculation-details".to_owned(),
            history: "scheduler-execution-history".to_owned(),
            force_recalculate: "net-scheduler-calculate-timestamps".to_owned(),
        }
    }
}

/// Runtime settings for the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Time zone used to interpret CRON wall-clock fields.
    pub timezone: Tz,
    /// Length of the look-ahead window used when computing occurrences.
    pub occurrence_window_days: u32,
    /// Number of upcoming occurrences kept in a schedule queue.
    pub queue_length: usize,
    /// Lifetime of the cached feature flag bundle.
    pub feature_cache_ttl_secs: u64,
    /// Maximum number of messages in one broker batch.
    pub dispatch_batch_size: usize,
    /// Maximum serialised size of one broker batch.
    pub dispatch_batch_max_bytes: usize,
    /// Maximum number of schedules evaluated concurrently.
    pub evaluation_concurrency: usize,
    /// Endpoint that persists schedule history entries.
    pub history_endpoint: String,
    /// Identity client used to authorise history events.
    pub history_identity_client_id: IdentityClientId,
    /// Feature flag keys.
    pub flags: FeatureFlagKeys,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Denver,
            occurrence_window_days: 7,
            queue_length: MAX_QUEUE_LENGTH,
            feature_cache_ttl_secs: 30,
            dispatch_batch_size: 10,
            dispatch_batch_max_bytes: 256 * 1024,
            evaluation_concurrency: 8,
            history_endpoint: "http://localhost/api/scheduler/history".to_owned(),
            history_identity_client_id: IdentityClientId::from("scheduler-history"),
            flags: FeatureFlagKeys::default(),
        }
    }
}

impl SchedulerSettings {
    /// Parses and validates settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed JSON or unknown time
    /// zones, and range errors from [`SchedulerSettings::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] naming the first invalid setting.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range(
            "occurrence_window_days",
            u64::from(self.occurrence_window_days),
            1,
            366,
        )?;
        check_range(
            "queue_length",
            usize_to_u64(self.queue_length),
            1,
            usize_to_u64(MAX_QUEUE_LENGTH),
        )?;
        check_range("feature_cache_ttl_secs", self.feature_cache_ttl_secs, 1, 3600)?;
        check_range(
            "dispatch_batch_size",
            usize_to_u64(self.dispatch_batch_size),
            1,
            1000,
        )?;
        check_range(
            "dispatch_batch_max_bytes",
            usize_to_u64(self.dispatch_batch_max_bytes),
            1024,
            u64::MAX,
        )?;
        check_range(
            "evaluation_concurrency",
            usize_to_u64(self.evaluation_concurrency),
            1,
            256,
        )?;
        if self.history_endpoint.trim().is_empty() {
            return Err(SettingsError::Empty("history_endpoint"));
        }
        if self.history_identity_client_id.as_str().trim().is_empty() {
            return Err(SettingsError::Empty("history_identity_client_id"));
        }
        Ok(())
    }

    /// Returns the occurrence look-ahead window.
    #[must_use]
    pub fn occurrence_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.occurrence_window_days))
    }

    /// Returns the feature flag cache lifetime.
    #[must_use]
    pub const fn feature_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feature_cache_ttl_secs)
    }
}

const fn check_range(
    name: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<(), SettingsError> {
    if value < min || value > max {
        return Err(SettingsError::OutOfRange {
            name,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
