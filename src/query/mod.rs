//! Read-only queries over the statistics database.
//!
//! Every function here takes a borrowed connection and only issues
//! `SELECT`s. Missing data comes back as `None` or an empty `Vec`, never
//! as an error. [`StatsService`] wraps these with per-call connections and
//! a result cache.

mod cache;
mod service;

pub use cache::*;
pub use service::*;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    AllTimeStats, BattleDate, BattleRecord, BattleSummary, BusiestDay, CareerStats, DailyWinner,
    HistoryEntry, KillDeathLeader, Leader, PlayerBattleRecord, PlayerTotals, RankedPlayer,
    RankingRecord, StatColumn, StatStanding,
};
use crate::ranking::{normalize_rank, normalize_records};
use crate::storage::StorageError;

pub type QueryResult<T> = Result<T, StorageError>;

/// Cumulative metric for the all-time leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerMetric {
    Kills,
    Damage,
}

// ── Battles ────────────────────────────────────────────────────

/// All battle keys, newest first.
pub fn battle_dates(conn: &Connection) -> QueryResult<Vec<BattleDate>> {
    let mut stmt = conn.prepare("SELECT date FROM daily_summary ORDER BY date DESC")?;
    let dates = stmt
        .query_map([], |row| Ok(BattleDate::new(row.get::<_, String>(0)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(dates)
}

pub fn battle_summary(conn: &Connection, date: &str) -> QueryResult<Option<BattleSummary>> {
    let summary = conn
        .query_row(
            "SELECT date, COALESCE(num_players, 0), winner FROM daily_summary WHERE date = ?1",
            params![date],
            |row| {
                Ok(BattleSummary {
                    date: BattleDate::new(row.get::<_, String>(0)?),
                    participant_count: row.get(1)?,
                    winner: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(summary)
}

/// Players recorded for a battle, in ascending lexical order.
pub fn participants(conn: &Connection, date: &str) -> QueryResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT player FROM player_stats WHERE date = ?1 ORDER BY player ASC")?;
    let players = stmt
        .query_map(params![date], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(players)
}

/// Best `limit` players of a battle by `stat`, ties by player identifier.
pub fn top_players(
    conn: &Connection,
    date: &str,
    stat: StatColumn,
    limit: usize,
) -> QueryResult<Vec<StatStanding>> {
    // The column name comes from a closed enum, never from the caller.
    let column = stat.column();
    let sql = format!(
        "SELECT player, COALESCE({column}, 0) AS value
         FROM player_stats
         WHERE date = ?1
         ORDER BY value DESC, player ASC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![date, limit as i64], |row| {
            Ok(StatStanding {
                player: row.get(0)?,
                value: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn player_record_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerBattleRecord> {
    Ok(PlayerBattleRecord {
        date: BattleDate::new(row.get::<_, String>(0)?),
        player: row.get(1)?,
        kills: row.get(2)?,
        deaths: row.get(3)?,
        damage_dealt: row.get(4)?,
        damage_received: row.get(5)?,
        nemesis: row.get(6)?,
        victim: row.get(7)?,
    })
}

pub fn player_battle(
    conn: &Connection,
    date: &str,
    player: &str,
) -> QueryResult<Option<PlayerBattleRecord>> {
    let record = conn
        .query_row(
            "SELECT date, player, COALESCE(kills, 0), COALESCE(deaths, 0),
                    COALESCE(damage_dealt, 0.0), COALESCE(damage_received, 0.0),
                    nemesis, victim
             FROM player_stats
             WHERE date = ?1 AND player = ?2",
            params![date, player],
            player_record_from_row,
        )
        .optional()?;
    Ok(record)
}

// ── Ranking ────────────────────────────────────────────────────

/// Stored rank of a player, exactly as written.
pub fn raw_rank(conn: &Connection, date: &str, player: &str) -> QueryResult<Option<i64>> {
    let rank = conn
        .query_row(
            "SELECT rank FROM ranking WHERE date = ?1 AND player = ?2",
            params![date, player],
            |row| row.get(0),
        )
        .optional()?;
    Ok(rank)
}

pub fn ranking_records(conn: &Connection, date: &str) -> QueryResult<Vec<RankingRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, player, rank FROM ranking WHERE date = ?1 ORDER BY rank ASC, player ASC",
    )?;
    let rows = stmt
        .query_map(params![date], |row| {
            Ok(RankingRecord {
                date: BattleDate::new(row.get::<_, String>(0)?),
                player: row.get(1)?,
                rank: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Dense 1-based rank of a player among every rank stored for the date.
pub fn normalized_rank(conn: &Connection, date: &str, player: &str) -> QueryResult<Option<u32>> {
    let Some(raw) = raw_rank(conn, date, player)? else {
        return Ok(None);
    };
    let mut stmt = conn.prepare("SELECT rank FROM ranking WHERE date = ?1")?;
    let all_ranks = stmt
        .query_map(params![date], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize_rank(raw, &all_ranks))
}

/// Rank leaderboard for a battle, best first, truncated to `limit`.
pub fn rank_table(conn: &Connection, date: &str, limit: usize) -> QueryResult<Vec<RankedPlayer>> {
    let records = ranking_records(conn, date)?;
    let mut ranked = normalize_records(&records);
    ranked.truncate(limit);
    Ok(ranked)
}

// ── All-time ───────────────────────────────────────────────────

/// Aggregates over the full history.
///
/// The busiest day groups battles by calendar day, so several
/// `YYYYMMDD_HHMMSS` keys on one day count together.
pub fn all_time_stats(conn: &Connection) -> QueryResult<AllTimeStats> {
    let total_battles: i64 =
        conn.query_row("SELECT COUNT(*) FROM daily_summary", [], |r| r.get(0))?;
    let total_players: i64 =
        conn.query_row("SELECT COUNT(DISTINCT player) FROM player_stats", [], |r| {
            r.get(0)
        })?;
    let (first_battle, last_battle): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date), MAX(date) FROM daily_summary",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    let top_winner = conn
        .query_row(
            "SELECT winner, COUNT(*) AS wins
             FROM daily_summary
             WHERE winner IS NOT NULL
             GROUP BY winner
             ORDER BY wins DESC, winner ASC
             LIMIT 1",
            [],
            |r| {
                Ok(Leader {
                    player: r.get(0)?,
                    value: r.get(1)?,
                })
            },
        )
        .optional()?;

    let total_kills: i64 =
        conn.query_row("SELECT COALESCE(SUM(kills), 0) FROM player_stats", [], |r| {
            r.get(0)
        })?;
    let total_damage: f64 = conn.query_row(
        "SELECT COALESCE(SUM(damage_dealt), 0.0) FROM player_stats",
        [],
        |r| r.get(0),
    )?;

    let top_killer = conn
        .query_row(
            "SELECT player, SUM(kills) AS total_kills
             FROM player_stats
             GROUP BY player
             ORDER BY total_kills DESC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(Leader {
                    player: r.get(0)?,
                    value: r.get::<_, Option<i64>>(1)?.unwrap_or(0),
                })
            },
        )
        .optional()?;

    let top_damage_dealer = conn
        .query_row(
            "SELECT player, SUM(damage_dealt) AS total_damage
             FROM player_stats
             GROUP BY player
             ORDER BY total_damage DESC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(Leader {
                    player: r.get(0)?,
                    value: r.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                })
            },
        )
        .optional()?;

    let best_kill_death = conn
        .query_row(
            "SELECT player,
                    COALESCE(SUM(kills), 0) AS total_kills,
                    COALESCE(SUM(deaths), 0) AS total_deaths,
                    CAST(COALESCE(SUM(kills), 0) AS REAL)
                        / MAX(COALESCE(SUM(deaths), 0), 1) AS kdr
             FROM player_stats
             GROUP BY player
             HAVING total_kills > 0
             ORDER BY kdr DESC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(KillDeathLeader {
                    player: r.get(0)?,
                    kills: r.get(1)?,
                    deaths: r.get(2)?,
                    ratio: r.get(3)?,
                })
            },
        )
        .optional()?;

    let most_active = conn
        .query_row(
            "SELECT player, COUNT(*) AS battles
             FROM player_stats
             GROUP BY player
             ORDER BY battles DESC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(Leader {
                    player: r.get(0)?,
                    value: r.get(1)?,
                })
            },
        )
        .optional()?;

    let highest_kills = conn
        .query_row(
            "SELECT player, COALESCE(kills, 0) AS kills, date
             FROM player_stats
             ORDER BY kills DESC, date ASC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(BattleRecord {
                    player: r.get(0)?,
                    value: r.get(1)?,
                    date: BattleDate::new(r.get::<_, String>(2)?),
                })
            },
        )
        .optional()?;

    let highest_damage = conn
        .query_row(
            "SELECT player, COALESCE(damage_dealt, 0.0) AS dealt, date
             FROM player_stats
             ORDER BY dealt DESC, date ASC, player ASC
             LIMIT 1",
            [],
            |r| {
                Ok(BattleRecord {
                    player: r.get(0)?,
                    value: r.get(1)?,
                    date: BattleDate::new(r.get::<_, String>(2)?),
                })
            },
        )
        .optional()?;

    let busiest_day = conn
        .query_row(
            "SELECT substr(replace(substr(date, 1, 10), '-', ''), 1, 8) AS day,
                    COUNT(*) AS battles
             FROM daily_summary
             GROUP BY day
             ORDER BY battles DESC, day ASC
             LIMIT 1",
            [],
            |r| {
                Ok(BusiestDay {
                    date: BattleDate::new(r.get::<_, String>(0)?),
                    battles: r.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(AllTimeStats {
        total_battles,
        total_players,
        first_battle: first_battle.map(BattleDate::new),
        last_battle: last_battle.map(BattleDate::new),
        top_winner,
        total_kills,
        total_damage,
        top_killer,
        top_damage_dealer,
        best_kill_death,
        most_active,
        highest_kills,
        highest_damage,
        busiest_day,
    })
}

/// Every battle with a known winner, newest first.
pub fn daily_winners(conn: &Connection) -> QueryResult<Vec<DailyWinner>> {
    let mut stmt = conn.prepare(
        "SELECT ds.date, ds.winner,
                (SELECT COUNT(*) FROM player_stats ps WHERE ps.date = ds.date) AS participants
         FROM daily_summary ds
         WHERE ds.date IS NOT NULL AND ds.winner IS NOT NULL
         ORDER BY ds.date DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let winners = rows
        .into_iter()
        .filter_map(|(date, winner, count)| {
            let winner = winner.filter(|w| !w.is_empty())?;
            Some(DailyWinner {
                date: BattleDate::new(date?),
                winner,
                participant_count: count?,
            })
        })
        .collect();
    Ok(winners)
}

/// Every player who ever appeared in `player_stats`, ascending.
pub fn all_players(conn: &Connection) -> QueryResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT player FROM player_stats ORDER BY player ASC")?;
    let players = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(players)
}

/// Cumulative leaderboard across every battle.
pub fn all_time_leaderboard(
    conn: &Connection,
    metric: CareerMetric,
    limit: usize,
) -> QueryResult<Vec<PlayerTotals>> {
    let order = match metric {
        CareerMetric::Kills => "total_kills DESC, player ASC",
        CareerMetric::Damage => "total_damage DESC, player ASC",
    };
    let sql = format!(
        "SELECT player,
                COALESCE(SUM(kills), 0) AS total_kills,
                COALESCE(SUM(damage_dealt), 0.0) AS total_damage,
                COUNT(DISTINCT date) AS battles
         FROM player_stats
         GROUP BY player
         ORDER BY {order}
         LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(PlayerTotals {
                player: row.get(0)?,
                total_kills: row.get(1)?,
                total_damage: row.get(2)?,
                battles: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Career aggregates, or `None` if the player never fought.
pub fn player_career(conn: &Connection, player: &str) -> QueryResult<Option<CareerStats>> {
    let career = conn.query_row(
        "SELECT COUNT(DISTINCT date),
                COALESCE(SUM(kills), 0),
                COALESCE(SUM(deaths), 0),
                COALESCE(SUM(damage_dealt), 0.0),
                COALESCE(SUM(damage_received), 0.0),
                COALESCE(AVG(kills), 0.0),
                COALESCE(AVG(deaths), 0.0),
                COALESCE(AVG(damage_dealt), 0.0),
                COALESCE(AVG(damage_received), 0.0),
                COALESCE(MAX(kills), 0),
                COALESCE(MAX(damage_dealt), 0.0)
         FROM player_stats
         WHERE player = ?1",
        params![player],
        |r| {
            Ok(CareerStats {
                player: player.to_string(),
                battles: r.get(0)?,
                total_kills: r.get(1)?,
                total_deaths: r.get(2)?,
                total_damage_dealt: r.get(3)?,
                total_damage_received: r.get(4)?,
                avg_kills: r.get(5)?,
                avg_deaths: r.get(6)?,
                avg_damage_dealt: r.get(7)?,
                avg_damage_received: r.get(8)?,
                best_kills: r.get(9)?,
                best_damage: r.get(10)?,
            })
        },
    )?;
    Ok(if career.battles > 0 { Some(career) } else { None })
}

/// A player's battles newest first, each with its normalized rank.
pub fn battle_history(conn: &Connection, player: &str) -> QueryResult<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT ps.date, r.rank,
                COALESCE(ps.kills, 0), COALESCE(ps.deaths, 0),
                COALESCE(ps.damage_dealt, 0.0), COALESCE(ps.damage_received, 0.0)
         FROM player_stats ps
         LEFT JOIN ranking r ON ps.date = r.date AND ps.player = r.player
         WHERE ps.player = ?1
         ORDER BY ps.date DESC",
    )?;
    let rows = stmt
        .query_map(params![player], |row| {
            Ok(HistoryEntry {
                date: BattleDate::new(row.get::<_, String>(0)?),
                raw_rank: row.get(1)?,
                normalized_rank: None,
                kills: row.get(2)?,
                deaths: row.get(3)?,
                damage_dealt: row.get(4)?,
                damage_received: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut rank_stmt = conn.prepare("SELECT rank FROM ranking WHERE date = ?1")?;
    let mut history = Vec::with_capacity(rows.len());
    for mut entry in rows {
        if let Some(raw) = entry.raw_rank {
            let all_ranks = rank_stmt
                .query_map(params![entry.date.as_str()], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            entry.normalized_rank = normalize_rank(raw, &all_ranks);
        }
        history.push(entry);
    }
    Ok(history)
}

/// Best (lowest) normalized rank across a history.
pub fn best_rank(history: &[HistoryEntry]) -> Option<u32> {
    history.iter().filter_map(|h| h.normalized_rank).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BattleStore;
    use pretty_assertions::assert_eq;

    const D1: &str = "20250701_180000";
    const D2: &str = "20250702_180000";

    fn record(
        date: &str,
        player: &str,
        kills: i64,
        deaths: i64,
        dealt: f64,
        received: f64,
    ) -> PlayerBattleRecord {
        PlayerBattleRecord {
            date: BattleDate::from(date),
            player: player.to_string(),
            kills,
            deaths,
            damage_dealt: dealt,
            damage_received: received,
            nemesis: None,
            victim: None,
        }
    }

    fn rank(date: &str, player: &str, rank: i64) -> RankingRecord {
        RankingRecord {
            date: BattleDate::from(date),
            player: player.to_string(),
            rank,
        }
    }

    fn summary(date: &str, count: i64, winner: Option<&str>) -> BattleSummary {
        BattleSummary {
            date: BattleDate::from(date),
            participant_count: count,
            winner: winner.map(str::to_string),
        }
    }

    /// Two battles: D1 with gapped 0-based ranks, D2 with one missing rank.
    fn seeded_store() -> BattleStore {
        let store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();

        for r in [
            record(D1, "A", 2, 0, 300.0, 50.0),
            record(D1, "B", 1, 1, 120.0, 200.0),
            record(D1, "C", 0, 1, 80.0, 250.0),
            record(D2, "A", 1, 1, 150.0, 175.0),
            record(D2, "B", 3, 0, 410.0, 0.0),
            record(D2, "D", 0, 1, 0.0, 90.0),
        ] {
            store.insert_player_record(&r).unwrap();
        }
        for r in [
            rank(D1, "A", 0),
            rank(D1, "B", 2),
            rank(D1, "C", 5),
            rank(D2, "B", 0),
            rank(D2, "A", 1),
        ] {
            store.upsert_rank(&r).unwrap();
        }
        store.upsert_summary(&summary(D1, 3, Some("A"))).unwrap();
        store.upsert_summary(&summary(D2, 3, Some("B"))).unwrap();
        store
    }

    #[test]
    fn test_battle_dates_descending() {
        let store = seeded_store();
        let dates = battle_dates(store.connection()).unwrap();
        assert_eq!(dates, vec![BattleDate::from(D2), BattleDate::from(D1)]);
    }

    #[test]
    fn test_battle_dates_empty_database() {
        let store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        assert!(battle_dates(store.connection()).unwrap().is_empty());
    }

    #[test]
    fn test_battle_summary_found_and_absent() {
        let store = seeded_store();
        let found = battle_summary(store.connection(), D1).unwrap().unwrap();
        assert_eq!(found.participant_count, 3);
        assert_eq!(found.winner.as_deref(), Some("A"));

        assert!(battle_summary(store.connection(), "19990101")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_participants_sorted() {
        let store = seeded_store();
        assert_eq!(
            participants(store.connection(), D2).unwrap(),
            vec!["A".to_string(), "B".to_string(), "D".to_string()]
        );
    }

    #[test]
    fn test_top_players_respects_limit_and_order() {
        let store = seeded_store();
        let conn = store.connection();

        for stat in StatColumn::ALL {
            for limit in [1, 2, 10] {
                let top = top_players(conn, D1, stat, limit).unwrap();
                let members = participants(conn, D1).unwrap();

                assert!(top.len() <= limit);
                assert!(top.iter().all(|s| members.contains(&s.player)));
                assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
            }
        }
    }

    #[test]
    fn test_top_players_tie_broken_by_player() {
        let store = seeded_store();
        // B and C both have one death on D1
        let top = top_players(store.connection(), D1, StatColumn::Deaths, 2).unwrap();
        assert_eq!(top[0].player, "B");
        assert_eq!(top[1].player, "C");
    }

    #[test]
    fn test_player_battle() {
        let store = seeded_store();
        let record = player_battle(store.connection(), D2, "B").unwrap().unwrap();
        assert_eq!(record.kills, 3);
        assert_eq!(record.damage_received, 0.0);
        assert!(player_battle(store.connection(), D2, "C").unwrap().is_none());
    }

    #[test]
    fn test_normalized_rank_gapped_scenario() {
        let store = seeded_store();
        let conn = store.connection();
        assert_eq!(raw_rank(conn, D1, "C").unwrap(), Some(5));
        assert_eq!(normalized_rank(conn, D1, "A").unwrap(), Some(1));
        assert_eq!(normalized_rank(conn, D1, "B").unwrap(), Some(2));
        assert_eq!(normalized_rank(conn, D1, "C").unwrap(), Some(3));
    }

    #[test]
    fn test_normalized_rank_missing_ranking_row() {
        let store = seeded_store();
        // D is in player_stats for D2 but has no ranking row
        assert_eq!(normalized_rank(store.connection(), D2, "D").unwrap(), None);
        assert_eq!(raw_rank(store.connection(), D2, "D").unwrap(), None);
    }

    #[test]
    fn test_rank_table_truncates() {
        let store = seeded_store();
        let table = rank_table(store.connection(), D1, 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].player, "A");
        assert_eq!(table[1].rank, 2);
    }

    #[test]
    fn test_all_time_stats() {
        let store = seeded_store();
        let stats = all_time_stats(store.connection()).unwrap();

        assert_eq!(stats.total_battles, 2);
        assert_eq!(stats.total_players, 4);
        assert_eq!(stats.first_battle, Some(BattleDate::from(D1)));
        assert_eq!(stats.last_battle, Some(BattleDate::from(D2)));
        assert_eq!(stats.total_kills, 7);
        assert!((stats.total_damage - 1060.0).abs() < 1e-9);

        // A and B both have one win; tie goes to the smaller identifier
        assert_eq!(stats.top_winner.unwrap().player, "A");

        let killer = stats.top_killer.unwrap();
        assert_eq!((killer.player.as_str(), killer.value), ("B", 4));

        let dealer = stats.top_damage_dealer.unwrap();
        assert_eq!(dealer.player, "B");

        // A: 3 kills / 1 death = 3.0, B: 4 kills / 1 death = 4.0
        let kd = stats.best_kill_death.unwrap();
        assert_eq!(kd.player, "B");
        assert!((kd.ratio - 4.0).abs() < 1e-9);

        assert_eq!(stats.most_active.unwrap().value, 2);

        let hk = stats.highest_kills.unwrap();
        assert_eq!((hk.player.as_str(), hk.value), ("B", 3));
        assert_eq!(hk.date, BattleDate::from(D2));

        let hd = stats.highest_damage.unwrap();
        assert_eq!(hd.player, "B");
        assert_eq!(hd.value, 410.0);

        assert_eq!(stats.busiest_day.unwrap().battles, 1);
    }

    #[test]
    fn test_busiest_day_groups_by_calendar_day() {
        let store = seeded_store();
        store
            .upsert_summary(&summary("20250702_210000", 2, Some("A")))
            .unwrap();

        let busiest = all_time_stats(store.connection())
            .unwrap()
            .busiest_day
            .unwrap();
        assert_eq!(busiest.battles, 2);
        assert_eq!(busiest.date.display(), "2025-07-02");
    }

    #[test]
    fn test_total_kills_matches_row_sum() {
        let store = seeded_store();
        let conn = store.connection();
        let row_sum: i64 = conn
            .prepare("SELECT kills FROM player_stats")
            .unwrap()
            .query_map([], |r| r.get::<_, i64>(0))
            .unwrap()
            .map(|k| k.unwrap())
            .sum();

        assert_eq!(all_time_stats(conn).unwrap().total_kills, row_sum);
    }

    #[test]
    fn test_best_kill_death_excludes_players_without_kills() {
        let store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .insert_player_record(&record(D1, "pacifist", 0, 0, 10.0, 0.0))
            .unwrap();

        let stats = all_time_stats(store.connection()).unwrap();
        assert!(stats.best_kill_death.is_none());
        assert_eq!(stats.top_killer.unwrap().player, "pacifist");
    }

    #[test]
    fn test_all_time_stats_tolerates_null_columns() {
        // Older databases were written without damage_dealt and with
        // nullable stat columns.
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE daily_summary (date TEXT PRIMARY KEY, num_players INTEGER, winner TEXT);
             CREATE TABLE player_stats (
                 date TEXT, player TEXT, kills INTEGER, deaths INTEGER,
                 damage_dealt REAL, damage_received REAL, nemesis TEXT, victim TEXT,
                 PRIMARY KEY (date, player)
             );
             CREATE TABLE ranking (date TEXT, player TEXT, rank INTEGER,
                 PRIMARY KEY (date, player));
             INSERT INTO player_stats (date, player, kills, deaths, damage_received)
                 VALUES ('20250701_180000', 'A', 2, 0, 15.5);
             INSERT INTO player_stats (date, player, kills, deaths, damage_received)
                 VALUES ('20250701_180000', 'B', 0, 1, 40.0);
             INSERT INTO player_stats (date, player, damage_received)
                 VALUES ('20250701_180000', 'C', 3.0);
             INSERT INTO daily_summary VALUES ('20250701_180000', 3, 'A');",
        )
        .unwrap();

        let stats = all_time_stats(&conn).unwrap();
        assert_eq!(stats.total_kills, 2);
        assert_eq!(stats.total_damage, 0.0);

        let hk = stats.highest_kills.unwrap();
        assert_eq!((hk.player.as_str(), hk.value), ("A", 2));
        let hd = stats.highest_damage.unwrap();
        assert_eq!((hd.player.as_str(), hd.value), ("A", 0.0));

        let kd = stats.best_kill_death.unwrap();
        assert_eq!((kd.player.as_str(), kd.kills, kd.deaths), ("A", 2, 0));
        assert_eq!(kd.ratio, 2.0);

        let top = top_players(&conn, "20250701_180000", StatColumn::DamageDealt, 5).unwrap();
        assert!(top.iter().all(|s| s.value == 0.0));
    }

    #[test]
    fn test_all_time_stats_empty() {
        let store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        let stats = all_time_stats(store.connection()).unwrap();
        assert!(stats.is_empty());
        assert!(stats.first_battle.is_none());
        assert!(stats.busiest_day.is_none());
        assert_eq!(stats.total_kills, 0);
    }

    #[test]
    fn test_daily_winners_filters_missing_winner() {
        let store = seeded_store();
        store
            .upsert_summary(&summary("20250703_180000", 2, None))
            .unwrap();

        let winners = daily_winners(store.connection()).unwrap();
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].date, BattleDate::from(D2));
        assert_eq!(winners[0].winner, "B");
        assert_eq!(winners[0].participant_count, 3);
    }

    #[test]
    fn test_all_players() {
        let store = seeded_store();
        assert_eq!(
            all_players(store.connection()).unwrap(),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_all_time_leaderboard_by_damage() {
        let store = seeded_store();
        let board = all_time_leaderboard(store.connection(), CareerMetric::Damage, 2).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player, "B");
        assert_eq!(board[0].battles, 2);
        assert_eq!(board[1].player, "A");
    }

    #[test]
    fn test_player_career() {
        let store = seeded_store();
        let career = player_career(store.connection(), "A").unwrap().unwrap();
        assert_eq!(career.battles, 2);
        assert_eq!(career.total_kills, 3);
        assert_eq!(career.best_kills, 2);
        assert!((career.avg_damage_dealt - 225.0).abs() < 1e-9);

        assert!(player_career(store.connection(), "nobody").unwrap().is_none());
    }

    #[test]
    fn test_battle_history_normalizes_each_date() {
        let store = seeded_store();
        let history = battle_history(store.connection(), "A").unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, BattleDate::from(D2));
        assert_eq!(history[0].raw_rank, Some(1));
        assert_eq!(history[0].normalized_rank, Some(2));
        assert_eq!(history[1].normalized_rank, Some(1));
        assert_eq!(best_rank(&history), Some(1));
    }

    #[test]
    fn test_battle_history_without_ranking() {
        let store = seeded_store();
        let history = battle_history(store.connection(), "D").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].normalized_rank, None);
        assert_eq!(best_rank(&history), None);
    }
}
