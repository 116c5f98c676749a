//! Collapse a collision log into per-player battle rows.

use std::collections::{BTreeMap, HashMap};

use super::parse::CollisionEvent;
use crate::models::{BattleDate, BattleSummary, PlayerBattleRecord, RankingRecord};

/// Everything written for one battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleAggregate {
    pub summary: BattleSummary,
    pub players: Vec<PlayerBattleRecord>,
    pub ranking: Vec<RankingRecord>,
}

#[derive(Debug, Default)]
struct Tally {
    kills: i64,
    deaths: i64,
    damage_dealt: f64,
    damage_received: f64,
    /// Opponent on the latest row that killed this particle
    nemesis: Option<String>,
    /// Row index of the latest kill of this particle
    last_death: Option<usize>,
}

/// Aggregate the events of one battle.
///
/// Participants are the distinct `Particle` values. Kills and damage dealt
/// are credited to the `Opponent` of each row, but only when that opponent
/// is itself a participant.
pub fn aggregate(
    battle_key: &str,
    events: &[CollisionEvent],
    winner_scan_rows: usize,
) -> BattleAggregate {
    let date = BattleDate::from(battle_key);

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    for event in events {
        tallies.entry(event.particle.as_str()).or_default();
    }

    // (killer, victim) -> force the killer dealt to the victim
    let mut dealt_to: HashMap<(&str, &str), f64> = HashMap::new();
    let mut eliminated: HashMap<&str, Vec<&str>> = HashMap::new();

    for (idx, event) in events.iter().enumerate() {
        if let Some(tally) = tallies.get_mut(event.particle.as_str()) {
            tally.damage_received += event.force_received;
            if event.killed {
                tally.deaths += 1;
                tally.nemesis = event.opponent.clone();
                tally.last_death = Some(idx);
            }
        }

        let Some(opponent) = event.opponent.as_deref() else {
            continue;
        };
        if let Some(tally) = tallies.get_mut(opponent) {
            tally.damage_dealt += event.force_received;
            if event.killed {
                tally.kills += 1;
                eliminated
                    .entry(opponent)
                    .or_default()
                    .push(event.particle.as_str());
            }
        }
        *dealt_to
            .entry((opponent, event.particle.as_str()))
            .or_default() += event.force_received;
    }

    let winner = find_winner(events, &tallies, winner_scan_rows);

    let players: Vec<PlayerBattleRecord> = tallies
        .iter()
        .map(|(&player, tally)| PlayerBattleRecord {
            date: date.clone(),
            player: player.to_string(),
            kills: tally.kills,
            deaths: tally.deaths,
            damage_dealt: tally.damage_dealt,
            damage_received: tally.damage_received,
            nemesis: tally.nemesis.clone(),
            victim: top_victim(player, eliminated.get(player), &dealt_to),
        })
        .collect();

    let ranking = finishing_order(&tallies, winner.as_deref())
        .into_iter()
        .enumerate()
        .map(|(rank, player)| RankingRecord {
            date: date.clone(),
            player: player.to_string(),
            rank: rank as i64,
        })
        .collect();

    BattleAggregate {
        summary: BattleSummary {
            date,
            participant_count: players.len() as i64,
            winner,
        },
        players,
        ranking,
    }
}

/// Most recent row in the last `scan_rows` whose particle was never killed.
fn find_winner(
    events: &[CollisionEvent],
    tallies: &BTreeMap<&str, Tally>,
    scan_rows: usize,
) -> Option<String> {
    events
        .iter()
        .rev()
        .take(scan_rows)
        .find(|event| {
            tallies
                .get(event.particle.as_str())
                .is_some_and(|t| t.deaths == 0)
        })
        .map(|event| event.particle.clone())
}

/// Eliminated player this one hit hardest. Ties go to the smaller name.
fn top_victim(
    player: &str,
    victims: Option<&Vec<&str>>,
    dealt_to: &HashMap<(&str, &str), f64>,
) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for &victim in victims? {
        let force = dealt_to.get(&(player, victim)).copied().unwrap_or(0.0);
        best = match best {
            Some((name, top)) if top > force || (top == force && name <= victim) => {
                Some((name, top))
            }
            _ => Some((victim, force)),
        };
    }
    best.map(|(name, _)| name.to_string())
}

/// Players ordered best first: the winner, remaining survivors by damage
/// dealt, then eliminated players with the latest death first.
fn finishing_order<'a>(
    tallies: &BTreeMap<&'a str, Tally>,
    winner: Option<&str>,
) -> Vec<&'a str> {
    let mut survivors: Vec<(&'a str, &Tally)> = Vec::new();
    let mut fallen: Vec<(&'a str, &Tally)> = Vec::new();
    for (&player, tally) in tallies {
        if Some(player) == winner {
            continue;
        }
        if tally.deaths == 0 {
            survivors.push((player, tally));
        } else {
            fallen.push((player, tally));
        }
    }

    survivors.sort_by(|a, b| {
        b.1.damage_dealt
            .total_cmp(&a.1.damage_dealt)
            .then_with(|| a.0.cmp(b.0))
    });
    fallen.sort_by(|a, b| {
        b.1.last_death
            .cmp(&a.1.last_death)
            .then_with(|| a.0.cmp(b.0))
    });

    let mut order: Vec<&'a str> = Vec::with_capacity(tallies.len());
    if let Some((&name, _)) = winner.and_then(|w| tallies.get_key_value(w)) {
        order.push(name);
    }
    order.extend(survivors.into_iter().map(|(p, _)| p));
    order.extend(fallen.into_iter().map(|(p, _)| p));
    order
}
