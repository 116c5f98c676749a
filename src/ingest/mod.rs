//! Collision log ingestion.
//!
//! Turns one simulation log into `player_stats`, `ranking` and
//! `daily_summary` rows for its battle:
//! 1. Find the newest log (or take an explicit path)
//! 2. Parse it, skipping unreadable rows
//! 3. Aggregate per participant
//! 4. Replace the battle's rows in a single transaction
//!
//! Missing or malformed input is reported as an [`IngestOutcome`], not an
//! error. Only storage failures come back as `Err`.

mod aggregate;
mod discovery;
mod parse;

pub use aggregate::*;
pub use discovery::*;
pub use parse::*;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::IngestSettings;
use crate::models::BattleDate;
use crate::storage::{BattleStore, StorageError};

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Log contains no readable events")]
    EmptyLog,

    #[error("Cannot derive a battle key from file name: {0}")]
    BadFileName(String),
}

impl IngestError {
    /// Whether the error is a problem with the log itself rather than the store.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            IngestError::Csv(_)
                | IngestError::Io(_)
                | IngestError::MissingColumns(_)
                | IngestError::EmptyLog
                | IngestError::BadFileName(_)
        )
    }
}

/// What was stored for an ingested battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub path: PathBuf,
    pub date: BattleDate,
    pub participants: usize,
    pub winner: Option<String>,
    pub ranking_rows: usize,
    pub skipped_rows: usize,
}

/// Result of an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    Ingested(IngestReport),
    NoLogFound { dir: PathBuf },
    Malformed { path: PathBuf, reason: String },
}

/// Ingest the most recently modified log in the simulations directory.
pub fn ingest_latest(
    store: &mut BattleStore,
    settings: &IngestSettings,
) -> Result<IngestOutcome, IngestError> {
    let dir = &settings.simulations_dir;
    match latest_log(dir, &settings.log_pattern)? {
        Some(path) => ingest_file(store, &path, settings),
        None => {
            info!(
                "No collision logs matching {:?} in {:?}",
                settings.log_pattern, dir
            );
            Ok(IngestOutcome::NoLogFound { dir: dir.clone() })
        }
    }
}

/// Ingest one log file, replacing anything stored for its battle.
pub fn ingest_file(
    store: &mut BattleStore,
    path: &Path,
    settings: &IngestSettings,
) -> Result<IngestOutcome, IngestError> {
    info!("Processing {:?}", path);

    let log = match read_log(path) {
        Ok(log) => log,
        Err(e) if e.is_bad_input() => {
            warn!("Skipping {:?}: {}", path, e);
            return Ok(IngestOutcome::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    let battle = aggregate(&log.battle_key, &log.events, settings.winner_scan_rows);
    let ranking: &[_] = if settings.write_ranking {
        &battle.ranking
    } else {
        &[]
    };

    if let Err(e) = store.replace_battle(&battle.summary, &battle.players, ranking) {
        error!("Rolled back battle {}: {}", log.battle_key, e);
        return Err(e.into());
    }

    match &battle.summary.winner {
        Some(winner) => info!(
            "Stored battle {}: {} players, winner {}",
            battle.summary.date,
            battle.players.len(),
            winner
        ),
        None => warn!(
            "Stored battle {}: {} players, no winner found",
            battle.summary.date,
            battle.players.len()
        ),
    }

    Ok(IngestOutcome::Ingested(IngestReport {
        path: path.to_path_buf(),
        date: battle.summary.date.clone(),
        participants: battle.players.len(),
        winner: battle.summary.winner.clone(),
        ranking_rows: ranking.len(),
        skipped_rows: log.skipped_rows,
    }))
}
