//! Derived metrics computation.
//!
//! Ratios shown on profiles and leaderboards:
//! - Kill/death ratio
//! - Damage efficiency (dealt / received)
//! - Per-battle averages

/// Divide with the denominator floored at 1.
///
/// A player with no deaths gets their kill count as K/D, and a player who
/// took no damage gets their damage dealt as efficiency. Denominators
/// between 0 and 1 are floored the same way.
pub fn floored_ratio(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(1.0)
}

/// Calculate kill/death ratio.
pub fn kill_death_ratio(kills: f64, deaths: f64) -> f64 {
    floored_ratio(kills, deaths)
}

/// Calculate damage efficiency (damage dealt per unit of damage received).
pub fn damage_efficiency(damage_dealt: f64, damage_received: f64) -> f64 {
    floored_ratio(damage_dealt, damage_received)
}

/// Mean of a total over a number of battles; 0 when there were none.
pub fn per_battle_average(total: f64, battles: i64) -> f64 {
    if battles <= 0 {
        0.0
    } else {
        total / battles as f64
    }
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
