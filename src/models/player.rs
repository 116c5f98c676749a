//! Per-player models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BattleDate;
use crate::calculate::{damage_efficiency, kill_death_ratio};

/// One row of `player_stats`: a single player's result in a single battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBattleRecord {
    pub date: BattleDate,
    pub player: String,
    pub kills: i64,
    /// Summed from the log without clamping; normally 0 or 1
    pub deaths: i64,
    pub damage_dealt: f64,
    pub damage_received: f64,
    /// Player who eliminated this one
    pub nemesis: Option<String>,
    /// This player's most notable elimination
    pub victim: Option<String>,
}

impl PlayerBattleRecord {
    /// Empty record for a participant.
    pub fn new(date: BattleDate, player: impl Into<String>) -> Self {
        Self {
            date,
            player: player.into(),
            kills: 0,
            deaths: 0,
            damage_dealt: 0.0,
            damage_received: 0.0,
            nemesis: None,
            victim: None,
        }
    }

    pub fn kill_death_ratio(&self) -> f64 {
        kill_death_ratio(self.kills as f64, self.deaths as f64)
    }

    pub fn damage_efficiency(&self) -> f64 {
        damage_efficiency(self.damage_dealt, self.damage_received)
    }

    pub fn survived(&self) -> bool {
        self.deaths == 0
    }
}

/// Numeric `player_stats` columns that can be ranked on.
///
/// Each variant maps to a fixed column name, so a stat choice never reaches
/// SQL as caller-supplied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatColumn {
    Kills,
    Deaths,
    DamageDealt,
    DamageReceived,
}

impl StatColumn {
    pub const ALL: [StatColumn; 4] = [
        StatColumn::Kills,
        StatColumn::Deaths,
        StatColumn::DamageDealt,
        StatColumn::DamageReceived,
    ];

    /// Column name in `player_stats`.
    pub fn column(&self) -> &'static str {
        match self {
            StatColumn::Kills => "kills",
            StatColumn::Deaths => "deaths",
            StatColumn::DamageDealt => "damage_dealt",
            StatColumn::DamageReceived => "damage_received",
        }
    }

    /// Whether values are whole counts rather than accumulated force.
    pub fn is_count(&self) -> bool {
        matches!(self, StatColumn::Kills | StatColumn::Deaths)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatColumn::Kills => "Kills",
            StatColumn::Deaths => "Deaths",
            StatColumn::DamageDealt => "Damage Dealt",
            StatColumn::DamageReceived => "Damage Received",
        }
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for StatColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kills" => Ok(StatColumn::Kills),
            "deaths" => Ok(StatColumn::Deaths),
            "damage_dealt" | "damage" => Ok(StatColumn::DamageDealt),
            "damage_received" => Ok(StatColumn::DamageReceived),
            other => Err(format!("unknown stat column: {}", other)),
        }
    }
}

/// A (player, value) pair from a top-N query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatStanding {
    pub player: String,
    pub value: f64,
}

/// Cumulative totals used by the all-time leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub player: String,
    pub total_kills: i64,
    pub total_damage: f64,
    pub battles: i64,
}

/// Career aggregates for a single player across every battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerStats {
    pub player: String,
    pub battles: i64,
    pub total_kills: i64,
    pub total_deaths: i64,
    pub total_damage_dealt: f64,
    pub total_damage_received: f64,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_damage_dealt: f64,
    pub avg_damage_received: f64,
    pub best_kills: i64,
    pub best_damage: f64,
}

impl CareerStats {
    pub fn total_kill_death_ratio(&self) -> f64 {
        kill_death_ratio(self.total_kills as f64, self.total_deaths as f64)
    }

    pub fn average_kill_death_ratio(&self) -> f64 {
        kill_death_ratio(self.avg_kills, self.avg_deaths)
    }

    pub fn damage_efficiency(&self) -> f64 {
        damage_efficiency(self.total_damage_dealt, self.total_damage_received)
    }
}

/// One battle in a player's history, joined with the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: BattleDate,
    pub raw_rank: Option<i64>,
    pub normalized_rank: Option<u32>,
    pub kills: i64,
    pub deaths: i64,
    pub damage_dealt: f64,
    pub damage_received: f64,
}

impl HistoryEntry {
    pub fn kill_death_ratio(&self) -> f64 {
        kill_death_ratio(self.kills as f64, self.deaths as f64)
    }

    pub fn damage_efficiency(&self) -> f64 {
        damage_efficiency(self.damage_dealt, self.damage_received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_column_names() {
        assert_eq!(StatColumn::Kills.column(), "kills");
        assert_eq!(StatColumn::DamageDealt.column(), "damage_dealt");
        assert_eq!(StatColumn::DamageReceived.to_string(), "damage_received");
    }

    #[test]
    fn test_stat_column_from_str() {
        assert_eq!("kills".parse::<StatColumn>(), Ok(StatColumn::Kills));
        assert_eq!("Damage".parse::<StatColumn>(), Ok(StatColumn::DamageDealt));
        assert!("kills; DROP TABLE ranking".parse::<StatColumn>().is_err());
    }

    #[test]
    fn test_stat_column_serialization() {
        let json = serde_json::to_string(&StatColumn::DamageDealt).unwrap();
        assert_eq!(json, "\"damage_dealt\"");
    }

    #[test]
    fn test_record_ratios_use_denominator_floor() {
        let mut record = PlayerBattleRecord::new(BattleDate::from("20250704"), "ghost");
        record.damage_dealt = 42.5;

        assert_eq!(record.kill_death_ratio(), 0.0);
        assert_eq!(record.damage_efficiency(), 42.5);
        assert!(record.survived());
    }

    #[test]
    fn test_career_ratios() {
        let career = CareerStats {
            player: "nova".to_string(),
            battles: 4,
            total_kills: 6,
            total_deaths: 3,
            total_damage_dealt: 900.0,
            total_damage_received: 300.0,
            avg_kills: 1.5,
            avg_deaths: 0.75,
            avg_damage_dealt: 225.0,
            avg_damage_received: 75.0,
            best_kills: 3,
            best_damage: 400.0,
        };

        assert_eq!(career.total_kill_death_ratio(), 2.0);
        // avg_deaths below 1 is floored to 1
        assert_eq!(career.average_kill_death_ratio(), 1.5);
        assert_eq!(career.damage_efficiency(), 3.0);
    }
}
