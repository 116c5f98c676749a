//! Dashboard view models.
//!
//! Each builder reads through [`StatsService`] and returns a serializable
//! value ready to print or emit as JSON. Ranks shown here are always the
//! normalized 1-based ranks. A builder returns `Ok(None)` when the
//! selection it needs is missing or matches nothing.

use serde::{Deserialize, Serialize};

use crate::calculate::round2;
use crate::models::{AllTimeStats, BattleDate, CareerStats, RankBadge, StatColumn};
use crate::query::{best_rank, CareerMetric, QueryResult, StatsService};

/// Default number of rows on every leaderboard.
pub const DEFAULT_LIMIT: usize = 10;

/// Which daily leaderboard to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    #[default]
    Rank,
    Kills,
    Damage,
}

impl LeaderboardKind {
    /// Stat column behind the board; `None` for the rank board.
    pub fn stat(&self) -> Option<StatColumn> {
        match self {
            LeaderboardKind::Rank => None,
            LeaderboardKind::Kills => Some(StatColumn::Kills),
            LeaderboardKind::Damage => Some(StatColumn::DamageDealt),
        }
    }
}

/// Selection state for the views: the chosen battle, player, board and
/// row limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub date: Option<BattleDate>,
    pub player: Option<String>,
    pub leaderboard: LeaderboardKind,
    pub career_metric: CareerMetric,
    pub limit: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            date: None,
            player: None,
            leaderboard: LeaderboardKind::Rank,
            career_metric: CareerMetric::Kills,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ViewParams {
    pub fn for_date(date: impl Into<BattleDate>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn with_leaderboard(mut self, kind: LeaderboardKind) -> Self {
        self.leaderboard = kind;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

// ── Daily views ────────────────────────────────────────────────

/// Summary card for one battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleOverview {
    pub date: BattleDate,
    pub display_date: String,
    pub participant_count: i64,
    pub winner: Option<String>,
    pub participants: Vec<String>,
}

pub fn battle_overview(
    service: &StatsService,
    params: &ViewParams,
) -> QueryResult<Option<BattleOverview>> {
    let Some(date) = &params.date else {
        return Ok(None);
    };
    let Some(summary) = service.get_battle_summary(date.as_str())? else {
        return Ok(None);
    };
    Ok(Some(BattleOverview {
        display_date: date.display(),
        date: summary.date,
        participant_count: summary.participant_count,
        winner: summary.winner,
        participants: service.list_participants(date.as_str())?,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based place on this board
    pub position: u32,
    pub player: String,
    /// Stat value; absent on the rank board
    pub value: Option<f64>,
    pub badge: RankBadge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLeaderboard {
    pub date: BattleDate,
    pub display_date: String,
    pub kind: LeaderboardKind,
    pub rows: Vec<LeaderboardRow>,
}

pub fn daily_leaderboard(
    service: &StatsService,
    params: &ViewParams,
) -> QueryResult<Option<DailyLeaderboard>> {
    let Some(date) = &params.date else {
        return Ok(None);
    };

    let rows: Vec<LeaderboardRow> = match params.leaderboard.stat() {
        None => service
            .rank_table(date.as_str(), params.limit)?
            .into_iter()
            .map(|r| LeaderboardRow {
                position: r.rank,
                player: r.player,
                value: None,
                badge: RankBadge::for_rank(r.rank),
            })
            .collect(),
        Some(stat) => service
            .top_players(date.as_str(), stat, params.limit)?
            .into_iter()
            .zip(1u32..)
            .map(|(s, position)| LeaderboardRow {
                position,
                player: s.player,
                value: Some(s.value),
                badge: RankBadge::for_rank(position),
            })
            .collect(),
    };

    if rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(DailyLeaderboard {
        date: date.clone(),
        display_date: date.display(),
        kind: params.leaderboard,
        rows,
    }))
}

/// One player's result in one battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub date: BattleDate,
    pub display_date: String,
    pub player: String,
    pub rank: Option<u32>,
    pub badge: Option<RankBadge>,
    pub kills: i64,
    pub deaths: i64,
    pub damage_dealt: f64,
    pub damage_received: f64,
    pub kill_death_ratio: f64,
    pub damage_efficiency: f64,
    pub nemesis: Option<String>,
    pub victim: Option<String>,
}

pub fn player_profile(
    service: &StatsService,
    params: &ViewParams,
) -> QueryResult<Option<PlayerProfile>> {
    let (Some(date), Some(player)) = (&params.date, &params.player) else {
        return Ok(None);
    };
    let Some(record) = service.get_player_battle(date.as_str(), player)? else {
        return Ok(None);
    };
    let rank = service.get_normalized_rank(date.as_str(), player)?;

    Ok(Some(PlayerProfile {
        display_date: date.display(),
        rank,
        badge: rank.map(RankBadge::for_rank),
        kill_death_ratio: round2(record.kill_death_ratio()),
        damage_efficiency: round2(record.damage_efficiency()),
        date: record.date,
        player: record.player,
        kills: record.kills,
        deaths: record.deaths,
        damage_dealt: record.damage_dealt,
        damage_received: record.damage_received,
        nemesis: record.nemesis,
        victim: record.victim,
    }))
}

// ── All-time views ─────────────────────────────────────────────

/// Headline all-time numbers. `None` when nothing has been ingested.
pub fn all_time_overview(service: &StatsService) -> QueryResult<Option<AllTimeStats>> {
    let stats = service.all_time_aggregates()?;
    Ok(if stats.is_empty() { None } else { Some(stats) })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllTimeRow {
    pub position: u32,
    pub player: String,
    pub total_kills: i64,
    pub total_damage: f64,
    pub battles: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllTimeLeaderboard {
    pub metric: CareerMetric,
    pub rows: Vec<AllTimeRow>,
}

pub fn all_time_leaderboard(
    service: &StatsService,
    params: &ViewParams,
) -> QueryResult<Option<AllTimeLeaderboard>> {
    let rows: Vec<AllTimeRow> = service
        .all_time_leaderboard(params.career_metric, params.limit)?
        .into_iter()
        .zip(1u32..)
        .map(|(t, position)| AllTimeRow {
            position,
            player: t.player,
            total_kills: t.total_kills,
            total_damage: t.total_damage,
            battles: t.battles,
        })
        .collect();

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(AllTimeLeaderboard {
        metric: params.career_metric,
        rows,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: BattleDate,
    pub display_date: String,
    pub rank: Option<u32>,
    pub kills: i64,
    pub deaths: i64,
    pub damage_dealt: f64,
    pub damage_received: f64,
    pub kill_death_ratio: f64,
    pub damage_efficiency: f64,
}

/// A player's whole career.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerProfile {
    pub stats: CareerStats,
    pub total_kill_death_ratio: f64,
    pub average_kill_death_ratio: f64,
    pub damage_efficiency: f64,
    pub best_rank: Option<u32>,
    pub best_badge: Option<RankBadge>,
    pub history: Vec<HistoryRow>,
}

pub fn career_profile(
    service: &StatsService,
    params: &ViewParams,
) -> QueryResult<Option<CareerProfile>> {
    let Some(player) = &params.player else {
        return Ok(None);
    };
    let Some(stats) = service.player_career(player)? else {
        return Ok(None);
    };
    let entries = service.battle_history(player)?;
    let best = best_rank(&entries);

    let history = entries
        .into_iter()
        .map(|h| HistoryRow {
            display_date: h.date.display(),
            rank: h.normalized_rank,
            kill_death_ratio: round2(h.kill_death_ratio()),
            damage_efficiency: round2(h.damage_efficiency()),
            date: h.date,
            kills: h.kills,
            deaths: h.deaths,
            damage_dealt: h.damage_dealt,
            damage_received: h.damage_received,
        })
        .collect();

    Ok(Some(CareerProfile {
        total_kill_death_ratio: round2(stats.total_kill_death_ratio()),
        average_kill_death_ratio: round2(stats.average_kill_death_ratio()),
        damage_efficiency: round2(stats.damage_efficiency()),
        best_rank: best,
        best_badge: best.map(RankBadge::for_rank),
        stats,
        history,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerRow {
    /// Oldest battle is 1, latest is the highest number
    pub battle_number: usize,
    pub date: BattleDate,
    pub display_date: String,
    pub winner: String,
    pub participants: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyWinnersTable {
    pub rows: Vec<WinnerRow>,
}

pub fn daily_winners(service: &StatsService) -> QueryResult<Option<DailyWinnersTable>> {
    let winners = service.all_daily_winners()?;
    if winners.is_empty() {
        return Ok(None);
    }

    let total = winners.len();
    let rows = winners
        .into_iter()
        .enumerate()
        .map(|(i, w)| WinnerRow {
            battle_number: total - i,
            display_date: w.date.display(),
            date: w.date,
            winner: w.winner,
            participants: w.participant_count,
        })
        .collect();
    Ok(Some(DailyWinnersTable { rows }))
}

/// Render a stat value: counts as integers, force with two decimals.
pub fn format_stat(stat: StatColumn, value: f64) -> String {
    if stat.is_count() {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.2}", value)
    }
}
