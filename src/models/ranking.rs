//! Ranking models.

use serde::{Deserialize, Serialize};

use super::BattleDate;

/// One row of `ranking`, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub date: BattleDate,
    pub player: String,
    /// Stored rank: lower is better, possibly 0-based and possibly gapped
    pub rank: i64,
}

/// A ranking row with its dense display rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub player: String,
    pub raw_rank: i64,
    /// 1-based position among all ranks stored for the date
    pub rank: u32,
}

/// Display badge for a normalized rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBadge {
    Champion,
    Silver,
    Bronze,
    TopTen,
    Contender,
}

impl RankBadge {
    pub fn for_rank(rank: u32) -> Self {
        match rank {
            1 => RankBadge::Champion,
            2 => RankBadge::Silver,
            3 => RankBadge::Bronze,
            4..=10 => RankBadge::TopTen,
            _ => RankBadge::Contender,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RankBadge::Champion => "👑",
            RankBadge::Silver => "🥈",
            RankBadge::Bronze => "🥉",
            RankBadge::TopTen => "⭐",
            RankBadge::Contender => "⚔️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_for_rank() {
        assert_eq!(RankBadge::for_rank(1), RankBadge::Champion);
        assert_eq!(RankBadge::for_rank(2), RankBadge::Silver);
        assert_eq!(RankBadge::for_rank(3), RankBadge::Bronze);
        assert_eq!(RankBadge::for_rank(4), RankBadge::TopTen);
        assert_eq!(RankBadge::for_rank(10), RankBadge::TopTen);
        assert_eq!(RankBadge::for_rank(11), RankBadge::Contender);
    }

    #[test]
    fn test_rank_zero_is_not_a_display_rank() {
        // Display ranks start at 1; a stray 0 falls through to contender
        assert_eq!(RankBadge::for_rank(0), RankBadge::Contender);
    }

    #[test]
    fn test_badge_serialization() {
        let json = serde_json::to_string(&RankBadge::TopTen).unwrap();
        assert_eq!(json, "\"top_ten\"");
    }
}
