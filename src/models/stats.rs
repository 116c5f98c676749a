//! All-time statistics models.

use serde::{Deserialize, Serialize};

use super::BattleDate;

/// A player leading some cumulative metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader<T> {
    pub player: String,
    pub value: T,
}

/// A single-battle record: who, how much, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord<T> {
    pub player: String,
    pub value: T,
    pub date: BattleDate,
}

/// Best kill/death ratio among players with at least one kill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillDeathLeader {
    pub player: String,
    pub ratio: f64,
    pub kills: i64,
    pub deaths: i64,
}

/// Date with the most battles recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusiestDay {
    pub date: BattleDate,
    pub battles: i64,
}

/// Aggregates over the full battle history.
///
/// Every leader field is `None` when the underlying tables are empty. When
/// two players tie, the lexically smaller identifier wins; callers should
/// not depend on that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllTimeStats {
    pub total_battles: i64,
    pub total_players: i64,
    pub first_battle: Option<BattleDate>,
    pub last_battle: Option<BattleDate>,
    /// Most `daily_summary` wins
    pub top_winner: Option<Leader<i64>>,
    pub total_kills: i64,
    pub total_damage: f64,
    pub top_killer: Option<Leader<i64>>,
    pub top_damage_dealer: Option<Leader<f64>>,
    pub best_kill_death: Option<KillDeathLeader>,
    /// Most battles participated in
    pub most_active: Option<Leader<i64>>,
    pub highest_kills: Option<BattleRecord<i64>>,
    pub highest_damage: Option<BattleRecord<f64>>,
    pub busiest_day: Option<BusiestDay>,
}

impl AllTimeStats {
    pub fn is_empty(&self) -> bool {
        self.total_battles == 0 && self.total_players == 0
    }
}
