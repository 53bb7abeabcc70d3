//! Achievement system for Formicid.
//!
//! Defines every achievement, checks conditions each frame after the tick
//! pipeline settles, and fires `AchievementUnlockedEvent` when one is
//! earned. Unlocks are one-way latches: once an id is in
//! `Achievements.unlocked` it never leaves.

use bevy::prelude::*;

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// ACHIEVEMENT DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

/// Static description of a single achievement.
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_larva",
        name: "First Larva",
        description: "Raise your first larva",
    },
    AchievementDef {
        id: "growing_colony",
        name: "Growing Colony",
        description: "House 10 ants",
    },
    AchievementDef {
        id: "ant_legion",
        name: "Ant Legion",
        description: "House 250 ants",
    },
    AchievementDef {
        id: "royal_chamber",
        name: "Royal Chamber",
        description: "Crown your first queen",
    },
    AchievementDef {
        id: "royal_court",
        name: "Royal Court",
        description: "Keep 5 queens at once",
    },
    AchievementDef {
        id: "granary_full",
        name: "Granary Full",
        description: "Fill the seed store to its cap",
    },
    AchievementDef {
        id: "seed_fortune",
        name: "Seed Fortune",
        description: "Gather 1,000,000 seeds in total",
    },
    AchievementDef {
        id: "battle_tested",
        name: "Battle Tested",
        description: "Defeat 10 intruders",
    },
    AchievementDef {
        id: "war_machine",
        name: "War Machine",
        description: "Defeat 250 intruders",
    },
    AchievementDef {
        id: "elite_vanguard",
        name: "Elite Vanguard",
        description: "Train an elite ant",
    },
    AchievementDef {
        id: "first_flight",
        name: "First Flight",
        description: "Complete a founding flight",
    },
    AchievementDef {
        id: "serial_founder",
        name: "Serial Founder",
        description: "Complete 5 founding flights",
    },
];

// ═══════════════════════════════════════════════════════════════════════
// HELPER: evaluate each achievement condition
// ═══════════════════════════════════════════════════════════════════════

/// Returns `true` if the achievement with the given id should be unlocked
/// given the current game state. Assumes the achievement is not yet
/// unlocked. All reads come from the same settled post-tick snapshot.
fn evaluate_condition(
    id: &str,
    ledger: &ColonyLedger,
    prestige: &PrestigeState,
    stats: &ColonyStats,
) -> bool {
    match id {
        // ── Brood ────────────────────────────────────────────────────────
        "first_larva" => stats.total_larvae_spawned >= 1,

        // ── Population ───────────────────────────────────────────────────
        "growing_colony" => ledger.amount(PoolKind::Ants) >= 10.0,
        "ant_legion" => ledger.amount(PoolKind::Ants) >= 250.0,
        "royal_chamber" => ledger.amount(PoolKind::Queens) >= 1.0,
        "royal_court" => ledger.amount(PoolKind::Queens) >= 5.0,
        "elite_vanguard" => ledger.amount(PoolKind::EliteAnts) >= 1.0,

        // ── Economy ──────────────────────────────────────────────────────
        "granary_full" => ledger.amount(PoolKind::Seeds) >= ledger.cap(PoolKind::Seeds),
        "seed_fortune" => stats.total_seeds_earned >= 1_000_000.0,

        // ── Combat ───────────────────────────────────────────────────────
        "battle_tested" => stats.enemies_defeated >= 10,
        "war_machine" => stats.enemies_defeated >= 250,

        // ── Meta ─────────────────────────────────────────────────────────
        "first_flight" => prestige.times_prestiged >= 1,
        "serial_founder" => prestige.times_prestiged >= 5,

        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEM: check_achievements
// ═══════════════════════════════════════════════════════════════════════

/// Runs after production and auto-creation have settled for the frame.
///
/// For each defined achievement not yet unlocked, evaluates its condition
/// and fires an `AchievementUnlockedEvent` when it becomes true. Also
/// pushes the id into `Achievements.unlocked` — the latch never re-locks.
pub fn check_achievements(
    ledger: Res<ColonyLedger>,
    prestige: Res<PrestigeState>,
    stats: Res<ColonyStats>,
    mut achievements: ResMut<Achievements>,
    mut events: EventWriter<AchievementUnlockedEvent>,
) {
    let mut newly_unlocked: Vec<(&'static str, &'static str, &'static str)> = Vec::new();

    for def in ACHIEVEMENTS {
        if achievements.is_unlocked(def.id) {
            continue;
        }
        if evaluate_condition(def.id, &ledger, &prestige, &stats) {
            newly_unlocked.push((def.id, def.name, def.description));
        }
    }

    for (id, name, description) in newly_unlocked {
        achievements.unlocked.push(id.to_string());

        events.send(AchievementUnlockedEvent {
            achievement_id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        });

        info!("[Achievements] Unlocked: \"{}\" — {}", name, description);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEM: notify_achievement_unlocked
// ═══════════════════════════════════════════════════════════════════════

/// Surfaces a notification when an achievement is unlocked.
pub fn notify_achievement_unlocked(
    mut events: EventReader<AchievementUnlockedEvent>,
    mut notify: EventWriter<NotificationEvent>,
) {
    for event in events.read() {
        notify.send(NotificationEvent::new(format!(
            "Achievement: {}!",
            event.name
        )));
        info!(
            "[Achievements] Notified: {} — {}",
            event.name, event.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_against_fresh_state() {
        let ledger = ColonyLedger::default();
        let prestige = PrestigeState::default();
        let stats = ColonyStats::default();
        for def in ACHIEVEMENTS {
            assert!(
                !evaluate_condition(def.id, &ledger, &prestige, &stats),
                "{} should not unlock on a fresh colony",
                def.id
            );
        }
    }

    #[test]
    fn test_population_conditions() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.amount = 10.0;
        ledger.queens.amount = 1.0;
        let prestige = PrestigeState::default();
        let stats = ColonyStats::default();
        assert!(evaluate_condition("growing_colony", &ledger, &prestige, &stats));
        assert!(evaluate_condition("royal_chamber", &ledger, &prestige, &stats));
        assert!(!evaluate_condition("ant_legion", &ledger, &prestige, &stats));
    }

    #[test]
    fn test_granary_full_at_cap() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = ledger.seeds.cap;
        let prestige = PrestigeState::default();
        let stats = ColonyStats::default();
        assert!(evaluate_condition("granary_full", &ledger, &prestige, &stats));
    }

    #[test]
    fn test_unknown_id_never_unlocks() {
        let ledger = ColonyLedger::default();
        let prestige = PrestigeState::default();
        let stats = ColonyStats::default();
        assert!(!evaluate_condition("does_not_exist", &ledger, &prestige, &stats));
    }
}
