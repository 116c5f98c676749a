//! Cached query service.
//!
//! Each accessor opens its own read-only connection, runs one query
//! function from the parent module, and memoizes the result under its full
//! argument list for the configured TTL.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use super::{CareerMetric, QueryResult, TtlCache};
use crate::models::{
    AllTimeStats, BattleDate, BattleSummary, CareerStats, DailyWinner, HistoryEntry,
    PlayerBattleRecord, PlayerTotals, RankedPlayer, StatColumn, StatStanding,
};
use crate::storage::{connect_read_only, StorageError};

type DateKey = String;
type DatePlayerKey = (String, String);

/// One cache per accessor, keyed by that accessor's arguments.
struct QueryCaches {
    battle_dates: TtlCache<(), Vec<BattleDate>>,
    summaries: TtlCache<DateKey, Option<BattleSummary>>,
    participants: TtlCache<DateKey, Vec<String>>,
    top_players: TtlCache<(String, StatColumn, usize), Vec<StatStanding>>,
    player_battles: TtlCache<DatePlayerKey, Option<PlayerBattleRecord>>,
    raw_ranks: TtlCache<DatePlayerKey, Option<i64>>,
    normalized_ranks: TtlCache<DatePlayerKey, Option<u32>>,
    rank_tables: TtlCache<(String, usize), Vec<RankedPlayer>>,
    all_time: TtlCache<(), AllTimeStats>,
    daily_winners: TtlCache<(), Vec<DailyWinner>>,
    all_players: TtlCache<(), Vec<String>>,
    leaderboards: TtlCache<(CareerMetric, usize), Vec<PlayerTotals>>,
    careers: TtlCache<String, Option<CareerStats>>,
    histories: TtlCache<String, Vec<HistoryEntry>>,
}

impl QueryCaches {
    fn new(ttl: Duration) -> Self {
        Self {
            battle_dates: TtlCache::new(ttl),
            summaries: TtlCache::new(ttl),
            participants: TtlCache::new(ttl),
            top_players: TtlCache::new(ttl),
            player_battles: TtlCache::new(ttl),
            raw_ranks: TtlCache::new(ttl),
            normalized_ranks: TtlCache::new(ttl),
            rank_tables: TtlCache::new(ttl),
            all_time: TtlCache::new(ttl),
            daily_winners: TtlCache::new(ttl),
            all_players: TtlCache::new(ttl),
            leaderboards: TtlCache::new(ttl),
            careers: TtlCache::new(ttl),
            histories: TtlCache::new(ttl),
        }
    }

    fn clear(&mut self) {
        self.battle_dates.clear();
        self.summaries.clear();
        self.participants.clear();
        self.top_players.clear();
        self.player_battles.clear();
        self.raw_ranks.clear();
        self.normalized_ranks.clear();
        self.rank_tables.clear();
        self.all_time.clear();
        self.daily_winners.clear();
        self.all_players.clear();
        self.leaderboards.clear();
        self.careers.clear();
        self.histories.clear();
    }
}

/// Read-side entry point shared by the views and the CLI.
pub struct StatsService {
    db_path: PathBuf,
    caches: Mutex<QueryCaches>,
}

impl StatsService {
    pub fn new(db_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            caches: Mutex::new(QueryCaches::new(ttl)),
        }
    }

    /// Drop every cached result, e.g. after an in-process ingestion.
    pub fn invalidate(&self) {
        self.lock().clear();
        debug!("Query cache cleared");
    }

    fn lock(&self) -> MutexGuard<'_, QueryCaches> {
        // A panic while holding the lock cannot leave a cache half-written.
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve from `select`'s cache or run `load` on a fresh connection.
    ///
    /// A database that does not exist yet reads as empty and is not cached.
    fn cached<K, V>(
        &self,
        select: fn(&mut QueryCaches) -> &mut TtlCache<K, V>,
        key: K,
        load: impl FnOnce(&Connection) -> QueryResult<V>,
    ) -> QueryResult<V>
    where
        K: Eq + std::hash::Hash,
        V: Clone + Default,
    {
        if let Some(hit) = select(&mut self.lock()).get(&key) {
            return Ok(hit);
        }

        let conn = match connect_read_only(&self.db_path) {
            Ok(conn) => conn,
            Err(StorageError::DatabaseNotFound(path)) => {
                debug!("No database at {:?}, returning empty result", path);
                return Ok(V::default());
            }
            Err(e) => return Err(e),
        };
        let value = load(&conn)?;
        drop(conn);

        select(&mut self.lock()).insert(key, value.clone());
        Ok(value)
    }

    // ── Battles ────────────────────────────────────────────────

    pub fn list_battle_dates(&self) -> QueryResult<Vec<BattleDate>> {
        self.cached(|c| &mut c.battle_dates, (), super::battle_dates)
    }

    pub fn get_battle_summary(&self, date: &str) -> QueryResult<Option<BattleSummary>> {
        self.cached(|c| &mut c.summaries, date.to_string(), |conn| {
            super::battle_summary(conn, date)
        })
    }

    pub fn list_participants(&self, date: &str) -> QueryResult<Vec<String>> {
        self.cached(|c| &mut c.participants, date.to_string(), |conn| {
            super::participants(conn, date)
        })
    }

    pub fn top_players(
        &self,
        date: &str,
        stat: StatColumn,
        limit: usize,
    ) -> QueryResult<Vec<StatStanding>> {
        self.cached(
            |c| &mut c.top_players,
            (date.to_string(), stat, limit),
            |conn| super::top_players(conn, date, stat, limit),
        )
    }

    pub fn get_player_battle(
        &self,
        date: &str,
        player: &str,
    ) -> QueryResult<Option<PlayerBattleRecord>> {
        self.cached(
            |c| &mut c.player_battles,
            (date.to_string(), player.to_string()),
            |conn| super::player_battle(conn, date, player),
        )
    }

    // ── Ranking ────────────────────────────────────────────────

    pub fn get_raw_rank(&self, date: &str, player: &str) -> QueryResult<Option<i64>> {
        self.cached(
            |c| &mut c.raw_ranks,
            (date.to_string(), player.to_string()),
            |conn| super::raw_rank(conn, date, player),
        )
    }

    pub fn get_normalized_rank(&self, date: &str, player: &str) -> QueryResult<Option<u32>> {
        self.cached(
            |c| &mut c.normalized_ranks,
            (date.to_string(), player.to_string()),
            |conn| super::normalized_rank(conn, date, player),
        )
    }

    pub fn rank_table(&self, date: &str, limit: usize) -> QueryResult<Vec<RankedPlayer>> {
        self.cached(
            |c| &mut c.rank_tables,
            (date.to_string(), limit),
            |conn| super::rank_table(conn, date, limit),
        )
    }

    // ── All-time ───────────────────────────────────────────────

    pub fn all_time_aggregates(&self) -> QueryResult<AllTimeStats> {
        self.cached(|c| &mut c.all_time, (), super::all_time_stats)
    }

    pub fn all_daily_winners(&self) -> QueryResult<Vec<DailyWinner>> {
        self.cached(|c| &mut c.daily_winners, (), super::daily_winners)
    }

    pub fn list_all_players(&self) -> QueryResult<Vec<String>> {
        self.cached(|c| &mut c.all_players, (), super::all_players)
    }

    pub fn all_time_leaderboard(
        &self,
        metric: CareerMetric,
        limit: usize,
    ) -> QueryResult<Vec<PlayerTotals>> {
        self.cached(|c| &mut c.leaderboards, (metric, limit), |conn| {
            super::all_time_leaderboard(conn, metric, limit)
        })
    }

    pub fn player_career(&self, player: &str) -> QueryResult<Option<CareerStats>> {
        self.cached(|c| &mut c.careers, player.to_string(), |conn| {
            super::player_career(conn, player)
        })
    }

    pub fn battle_history(&self, player: &str) -> QueryResult<Vec<HistoryEntry>> {
        self.cached(|c| &mut c.histories, player.to_string(), |conn| {
            super::battle_history(conn, player)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::models::RankingRecord;
    use crate::storage::BattleStore;
    use tempfile::TempDir;

    const DATE: &str = "20250705_180000";
    const TTL: Duration = Duration::from_secs(300);

    fn record(player: &str, kills: i64, dealt: f64) -> PlayerBattleRecord {
        let mut r = PlayerBattleRecord::new(BattleDate::from(DATE), player);
        r.kills = kills;
        r.damage_dealt = dealt;
        r
    }

    fn seed(path: &Path, players: &[PlayerBattleRecord]) {
        let mut store = BattleStore::open(path).unwrap();
        store.migrate().unwrap();
        let summary = BattleSummary {
            date: BattleDate::from(DATE),
            participant_count: players.len() as i64,
            winner: players.first().map(|p| p.player.clone()),
        };
        let ranking: Vec<RankingRecord> = players
            .iter()
            .enumerate()
            .map(|(i, p)| RankingRecord {
                date: BattleDate::from(DATE),
                player: p.player.clone(),
                rank: (i as i64) * 3,
            })
            .collect();
        store.replace_battle(&summary, players, &ranking).unwrap();
    }

    #[test]
    fn test_missing_database_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let service = StatsService::new(tmp.path().join("daily_stats.db"), TTL);

        assert!(service.list_battle_dates().unwrap().is_empty());
        assert!(service.get_battle_summary(DATE).unwrap().is_none());
        assert!(service.all_time_aggregates().unwrap().is_empty());
    }

    #[test]
    fn test_results_served_from_cache_until_invalidated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("daily_stats.db");
        seed(&path, &[record("ash", 2, 40.0), record("birch", 0, 5.0)]);

        let service = StatsService::new(&path, TTL);
        assert_eq!(service.list_participants(DATE).unwrap().len(), 2);

        seed(
            &path,
            &[
                record("ash", 2, 40.0),
                record("birch", 0, 5.0),
                record("cedar", 1, 12.0),
            ],
        );
        assert_eq!(service.list_participants(DATE).unwrap().len(), 2);

        service.invalidate();
        assert_eq!(service.list_participants(DATE).unwrap().len(), 3);
    }

    #[test]
    fn test_top_players_limits_are_separate_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("daily_stats.db");
        seed(
            &path,
            &[
                record("ash", 2, 40.0),
                record("birch", 0, 5.0),
                record("cedar", 1, 12.0),
            ],
        );

        let service = StatsService::new(&path, TTL);
        let one = service.top_players(DATE, StatColumn::Kills, 1).unwrap();
        let three = service.top_players(DATE, StatColumn::Kills, 3).unwrap();

        assert_eq!(one.len(), 1);
        assert_eq!(three.len(), 3);
        assert_eq!(one[0].player, "ash");
    }

    #[test]
    fn test_normalized_rank_through_service() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("daily_stats.db");
        seed(&path, &[record("ash", 2, 40.0), record("birch", 0, 5.0)]);

        let service = StatsService::new(&path, TTL);
        assert_eq!(service.get_raw_rank(DATE, "birch").unwrap(), Some(3));
        assert_eq!(service.get_normalized_rank(DATE, "birch").unwrap(), Some(2));
        assert_eq!(service.get_normalized_rank(DATE, "nobody").unwrap(), None);
    }
}
