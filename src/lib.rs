//! # Clash Stats
//!
//! Battle statistics for the Icon Clash arena: a small SQLite store fed by
//! simulation collision logs, and read-only leaderboards built on top of it.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (battles, player records, rankings, aggregates)
//! - **storage**: SQLite schema, connections and battle writes
//! - **query**: Read accessors with a time-bounded result cache
//! - **ranking**: Dense 1-based rank normalization
//! - **ingest**: Collision log discovery, parsing and aggregation
//! - **calculate**: Derived ratios and averages
//! - **views**: Leaderboard and profile view models
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod query;
pub mod ranking;
pub mod storage;
pub mod views;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "5m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_default_seconds() {
        assert_eq!(parse_duration("300"), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_parse_duration_trims_whitespace() {
        assert_eq!(parse_duration(" 90s "), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
    }
}
