//! Rank normalization.
//!
//! Stored ranks are lower-is-better integers that may start at 0 and may
//! have gaps (`{0, 5, 7}`). Display ranks are the 1-based position of a
//! stored rank within the sorted list of every rank stored for the same
//! date, so `{0, 5, 7}` becomes `{1, 2, 3}`.
//!
//! Equal stored ranks share the position of their first occurrence, which
//! leaves a gap after the tie (`{0, 3, 3, 9}` becomes `{1, 2, 2, 4}`).

use crate::models::{RankedPlayer, RankingRecord};

/// Normalize one stored rank against all ranks stored for its date.
///
/// Returns `None` when `raw` is not among `all_ranks`.
pub fn normalize_rank(raw: i64, all_ranks: &[i64]) -> Option<u32> {
    let mut sorted = all_ranks.to_vec();
    sorted.sort_unstable();
    position_in_sorted(raw, &sorted)
}

/// 1-based position of the first occurrence of `raw` in an ascending slice.
fn position_in_sorted(raw: i64, sorted: &[i64]) -> Option<u32> {
    let idx = sorted.partition_point(|&r| r < raw);
    if sorted.get(idx) == Some(&raw) {
        u32::try_from(idx + 1).ok()
    } else {
        None
    }
}

/// Normalize every record of a single date.
///
/// Output is ordered best first; players with equal display rank are
/// ordered by identifier.
pub fn normalize_records(records: &[RankingRecord]) -> Vec<RankedPlayer> {
    let mut sorted_ranks: Vec<i64> = records.iter().map(|r| r.rank).collect();
    sorted_ranks.sort_unstable();

    let mut ranked: Vec<RankedPlayer> = records
        .iter()
        .filter_map(|record| {
            position_in_sorted(record.rank, &sorted_ranks).map(|rank| RankedPlayer {
                player: record.player.clone(),
                raw_rank: record.rank,
                rank,
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.player.cmp(&b.player)));
    ranked
}
