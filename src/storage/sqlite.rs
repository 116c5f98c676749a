//! SQLite persistence layer.
//!
//! Only ingestion writes through [`BattleStore`]. Readers go through
//! [`connect_read_only`] and never hold a connection across calls.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

use super::StorageError;
use crate::models::{BattleSummary, PlayerBattleRecord, RankingRecord};

/// Open a fresh read-only connection to an existing database.
pub fn connect_read_only(path: &Path) -> Result<Connection, StorageError> {
    if !path.exists() {
        return Err(StorageError::DatabaseNotFound(path.to_path_buf()));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    )?;
    Ok(conn)
}

/// Writable handle on the statistics database.
pub struct BattleStore {
    conn: Connection,
}

impl BattleStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!("Opened battle store at {:?}", path);
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create any missing tables. Safe to run repeatedly.
    pub fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_battle_stats.sql"))?;
        Ok(())
    }

    /// Borrow the underlying connection for read queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ── Battle writes ──────────────────────────────────────────

    /// Replace everything stored for one battle in a single transaction.
    ///
    /// Existing `player_stats` rows for the date are removed first so a
    /// re-ingested battle never leaves stale participants behind. The
    /// `ranking` rows for the date are only replaced when `ranking` is
    /// non-empty. On any error the transaction is rolled back and nothing
    /// is persisted.
    pub fn replace_battle(
        &mut self,
        summary: &BattleSummary,
        players: &[PlayerBattleRecord],
        ranking: &[RankingRecord],
    ) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        let date = summary.date.as_str();

        tx.execute("DELETE FROM player_stats WHERE date = ?1", params![date])?;
        for record in players {
            insert_player_record(&tx, record)?;
        }

        if !ranking.is_empty() {
            tx.execute("DELETE FROM ranking WHERE date = ?1", params![date])?;
            for record in ranking {
                upsert_rank(&tx, record)?;
            }
        }

        upsert_summary(&tx, summary)?;
        tx.commit()?;

        debug!(
            "Stored battle {} ({} players, {} ranks)",
            date,
            players.len(),
            ranking.len()
        );
        Ok(())
    }

    pub fn insert_player_record(&self, record: &PlayerBattleRecord) -> Result<(), StorageError> {
        insert_player_record(&self.conn, record)
    }

    pub fn upsert_rank(&self, record: &RankingRecord) -> Result<(), StorageError> {
        upsert_rank(&self.conn, record)
    }

    pub fn upsert_summary(&self, summary: &BattleSummary) -> Result<(), StorageError> {
        upsert_summary(&self.conn, summary)
    }

    // ── Test / summary helpers ─────────────────────────────────

    /// Number of `player_stats` rows for a date.
    pub fn player_stats_count(&self, date: &str) -> Result<i64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM player_stats WHERE date = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of `daily_summary` rows for a date.
    pub fn summary_count(&self, date: &str) -> Result<i64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_summary WHERE date = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of `ranking` rows for a date.
    pub fn ranking_count(&self, date: &str) -> Result<i64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ranking WHERE date = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn insert_player_record(conn: &Connection, r: &PlayerBattleRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO player_stats
            (date, player, kills, deaths, damage_dealt, damage_received, nemesis, victim)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            r.date.as_str(),
            r.player,
            r.kills,
            r.deaths,
            r.damage_dealt,
            r.damage_received,
            r.nemesis,
            r.victim,
        ],
    )?;
    Ok(())
}

fn upsert_rank(conn: &Connection, r: &RankingRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO ranking (date, player, rank) VALUES (?1, ?2, ?3)",
        params![r.date.as_str(), r.player, r.rank],
    )?;
    Ok(())
}

fn upsert_summary(conn: &Connection, s: &BattleSummary) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO daily_summary (date, num_players, winner) VALUES (?1, ?2, ?3)",
        params![s.date.as_str(), s.participant_count, s.winner],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BattleDate;
    use tempfile::TempDir;

    const DATE: &str = "20250704_180000";

    fn record(player: &str, kills: i64) -> PlayerBattleRecord {
        let mut r = PlayerBattleRecord::new(BattleDate::from(DATE), player);
        r.kills = kills;
        r
    }

    fn summary(count: i64, winner: Option<&str>) -> BattleSummary {
        BattleSummary {
            date: BattleDate::from(DATE),
            participant_count: count,
            winner: winner.map(str::to_string),
        }
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        assert_eq!(store.player_stats_count(DATE).unwrap(), 0);
    }

    #[test]
    fn test_replace_battle_overwrites_previous_rows() {
        let mut store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();

        let players = vec![record("ash", 1), record("birch", 0), record("cedar", 1)];
        store
            .replace_battle(&summary(3, Some("ash")), &players, &[])
            .unwrap();
        store
            .replace_battle(&summary(2, Some("ash")), &players[..2], &[])
            .unwrap();

        assert_eq!(store.player_stats_count(DATE).unwrap(), 2);
        assert_eq!(store.summary_count(DATE).unwrap(), 1);
    }

    #[test]
    fn test_replace_battle_leaves_ranking_alone_when_not_given() {
        let mut store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .upsert_rank(&RankingRecord {
                date: BattleDate::from(DATE),
                player: "ash".to_string(),
                rank: 0,
            })
            .unwrap();

        store
            .replace_battle(&summary(1, Some("ash")), &[record("ash", 0)], &[])
            .unwrap();

        assert_eq!(store.ranking_count(DATE).unwrap(), 1);
    }

    #[test]
    fn test_replace_battle_rolls_back_on_failure() {
        let mut store = BattleStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
            .replace_battle(&summary(1, Some("ash")), &[record("ash", 0)], &[])
            .unwrap();

        // Break the ranking table so the write fails midway
        store.connection().execute_batch("DROP TABLE ranking;").unwrap();
        let ranking = vec![RankingRecord {
            date: BattleDate::from(DATE),
            player: "birch".to_string(),
            rank: 0,
        }];
        let result = store.replace_battle(
            &summary(2, Some("birch")),
            &[record("birch", 1), record("cedar", 0)],
            &ranking,
        );

        assert!(result.is_err());
        assert_eq!(store.player_stats_count(DATE).unwrap(), 1);
        let winner: Option<String> = store
            .connection()
            .query_row(
                "SELECT winner FROM daily_summary WHERE date = ?1",
                params![DATE],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(winner.as_deref(), Some("ash"));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("daily_stats.db");

        let store = BattleStore::open(&path).unwrap();
        store.migrate().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_connect_read_only_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = connect_read_only(&tmp.path().join("absent.db"));
        assert!(matches!(result, Err(StorageError::DatabaseNotFound(_))));
    }

    #[test]
    fn test_read_only_connection_rejects_writes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("daily_stats.db");
        BattleStore::open(&path).unwrap().migrate().unwrap();

        let conn = connect_read_only(&path).unwrap();
        let result = conn.execute("DELETE FROM player_stats", []);
        assert!(result.is_err());
    }
}
