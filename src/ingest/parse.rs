//! Collision log parsing.
//!
//! A collision log is a CSV written by the arena simulation, one row per
//! collision. Only four columns matter here; any others are ignored.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{de, Deserialize, Deserializer};
use tracing::warn;

use super::IngestError;

/// Columns a log must carry to be ingested.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Particle", "Opponent", "Killed", "Force Received"];

/// One collision between two particles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollisionEvent {
    /// Particle that received the force
    #[serde(rename = "Particle")]
    pub particle: String,

    /// Particle that dealt the force
    #[serde(rename = "Opponent")]
    pub opponent: Option<String>,

    /// Whether this collision eliminated `particle`
    #[serde(rename = "Killed", deserialize_with = "deserialize_flag")]
    pub killed: bool,

    #[serde(rename = "Force Received", deserialize_with = "deserialize_force")]
    pub force_received: f64,
}

/// A parsed log file.
#[derive(Debug, Clone)]
pub struct CollisionLog {
    /// Battle key derived from the file name
    pub battle_key: String,
    pub events: Vec<CollisionEvent>,
    /// Rows that failed to parse and were left out
    pub skipped_rows: usize,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid Killed value: {:?}", raw)))
}

fn deserialize_force<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .map_err(|_| de::Error::custom(format!("invalid Force Received value: {:?}", raw)))
}

/// Parse a boolean column value.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Some(true),
        "false" | "0" | "0.0" | "" => Some(false),
        _ => None,
    }
}

/// Battle key from a log file name.
///
/// `20250704_181500_collision_log.csv` yields `20250704_181500`. Any other
/// name with at least two underscore-separated leading tokens yields those
/// two tokens joined by `_`.
pub fn battle_key_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;

    static TIMESTAMP_PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    let prefix = TIMESTAMP_PREFIX.get_or_init(|| Regex::new(r"^(\d{8})_(\d{6})_").ok());
    if let Some(caps) = prefix.as_ref().and_then(|re| re.captures(name)) {
        return Some(format!("{}_{}", &caps[1], &caps[2]));
    }

    let mut tokens = name.split('_');
    let first = tokens.next().filter(|t| !t.is_empty())?;
    let second = tokens.next().filter(|t| !t.is_empty())?;
    // A lone token with an extension is not a key
    tokens.next()?;
    Some(format!("{}_{}", first, second))
}

/// Read and parse a collision log.
///
/// Rows that fail to parse are skipped with a warning. A file missing any
/// of [`REQUIRED_COLUMNS`] is rejected as a whole.
pub fn read_log(path: &Path) -> Result<CollisionLog, IngestError> {
    let battle_key = battle_key_from_path(path)
        .ok_or_else(|| IngestError::BadFileName(path.display().to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    let mut events = Vec::new();
    let mut skipped_rows = 0;
    for (idx, row) in reader.deserialize::<CollisionEvent>().enumerate() {
        match row {
            Ok(event) if event.particle.is_empty() => {
                warn!("Row {} has no Particle, skipping", idx + 1);
                skipped_rows += 1;
            }
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("Row {} unreadable, skipping: {}", idx + 1, e);
                skipped_rows += 1;
            }
        }
    }

    if events.is_empty() {
        return Err(IngestError::EmptyLog);
    }

    Ok(CollisionLog {
        battle_key,
        events,
        skipped_rows,
    })
}
