//! Owner context passed through a rollup pass.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};

/// Largest UTC offset in use anywhere (UTC+14 / UTC-12), with margin.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// The owner whose summaries are rolled up.
///
/// All state is partitioned by `owner_id`; nothing crosses owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContext {
    #[validate(length(min = 1, max = 128))]
    pub owner_id: String,
    /// Owner's UTC offset in minutes (east positive).
    ///
    /// Fixed for the whole year: there is no daylight-saving shift. Callers
    /// on the request path send the offset in effect at request time; owners
    /// configured statically for the background sweep keep one offset, so
    /// their period boundaries are an hour off during the other DST season.
    #[serde(default)]
    #[validate(range(min = -840, max = 840))]
    pub utc_offset_minutes: i32,
    /// Free-form context forwarded to the generation service
    #[serde(default)]
    pub personalization: serde_json::Value,
}

impl OwnerContext {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            utc_offset_minutes: 0,
            personalization: serde_json::Value::Null,
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_personalization(mut self, personalization: serde_json::Value) -> Self {
        self.personalization = personalization;
        self
    }

    /// Validate and return the owner's time zone.
    pub fn time_zone(&self) -> Result<FixedOffset> {
        self.validate()
            .map_err(|e| Error::invalid_owner(e.to_string()))?;
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            Error::invalid_owner(format!(
                "utc offset out of range: {} minutes",
                self.utc_offset_minutes
            ))
        })
    }
}
