//! Battle-level models.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A battle key as stored in the `date` column.
///
/// Three encodings show up in practice: `YYYY-MM-DD`, `YYYYMMDD`, and the
/// ingestion key `YYYYMMDD_HHMMSS` taken from a collision log file name.
/// The stored string is kept verbatim; only [`BattleDate::display`]
/// normalizes it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleDate(String);

impl BattleDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key exactly as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar day of the battle, if the key is in a recognized encoding.
    pub fn day(&self) -> Option<NaiveDate> {
        let raw = self.0.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(day);
        }
        if raw.len() == 8 {
            if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
                return Some(day);
            }
        }
        self.timestamp().map(|ts| ts.date())
    }

    /// Full timestamp for ingestion keys (`YYYYMMDD_HHMMSS`).
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.0.trim(), "%Y%m%d_%H%M%S").ok()
    }

    /// Human-readable form: `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` for
    /// ingestion keys. Unrecognized keys are returned unchanged.
    pub fn display(&self) -> String {
        if let Some(ts) = self.timestamp() {
            return ts.format("%Y-%m-%d %H:%M:%S").to_string();
        }
        match self.day() {
            Some(day) => day.format("%Y-%m-%d").to_string(),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for BattleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BattleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BattleDate({})", self.0)
    }
}

impl From<String> for BattleDate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BattleDate {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One row of `daily_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub date: BattleDate,
    pub participant_count: i64,
    /// Sole survivor; `None` when ingestion could not determine one
    pub winner: Option<String>,
}

/// A row of the all-daily-winners table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWinner {
    pub date: BattleDate,
    pub winner: String,
    /// Number of `player_stats` rows recorded for the date
    pub participant_count: i64,
}
