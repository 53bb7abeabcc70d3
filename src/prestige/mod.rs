//! Prestige domain — the founding flight.
//!
//! Converts the colony's current population into permanent prestige
//! points, resets every session-scoped resource back to its starting
//! constants, and replays the purchase history so permanent upgrades
//! survive. The reset is a single atomic operation: either the whole
//! cycle happens or (with zero points earned) nothing does.

use bevy::prelude::*;

use crate::economy::upgrades::{apply_effect, EffectTargets, UpgradeShop};
use crate::save::{now_millis, write_save, LastSaved, SaveStore};
use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Fired by the UI when the player confirms a founding flight.
#[derive(Event, Debug, Clone)]
pub struct PrestigeRequestEvent;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Domain outcome of a prestige attempt. Never an error: a pointless
/// flight simply doesn't happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrestigeResult {
    Completed { points_earned: u64 },
    NoPointsEarned,
}

// ─────────────────────────────────────────────────────────────────────────────
// Point formula
// ─────────────────────────────────────────────────────────────────────────────

/// Points contributed by one population pool. Thresholds stiffen with
/// each prestige for pools that scale; early flights (and opted-out
/// pools) use the flat `+1` curve.
fn contribution(
    amount: f64,
    base_threshold: f64,
    times_prestiged: u32,
    scales_with_prestige: bool,
) -> u64 {
    let times = times_prestiged as f64;
    let scaling_factor = if !scales_with_prestige || times_prestiged < 5 {
        1.0
    } else {
        1.0 + times * 0.2
    };
    let threshold = base_threshold * scaling_factor;
    if amount < threshold {
        return 0;
    }
    if !scales_with_prestige || times_prestiged <= 5 {
        (amount / threshold).floor() as u64 + 1
    } else {
        ((amount / threshold) * (1.0 + times * 0.05)).floor().max(0.0) as u64
    }
}

/// Points a flight would earn right now: ants scale with prestige count,
/// queens are exempt from scaling.
pub fn calculate_points(ledger: &ColonyLedger, prestige: &PrestigeState) -> u64 {
    contribution(
        ledger.amount(PoolKind::Ants),
        BASE_ANT_THRESHOLD,
        prestige.times_prestiged,
        true,
    ) + contribution(
        ledger.amount(PoolKind::Queens),
        BASE_QUEEN_THRESHOLD,
        prestige.times_prestiged,
        false,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// The reset-and-replay cycle
// ─────────────────────────────────────────────────────────────────────────────

/// Executes the full prestige cycle against in-memory state:
/// credit points, bump the flight count, reset ledger/rates/unlocks and
/// shop prices to their starting constants, then replay the purchase
/// history in original order (non-carrying upgrades are skipped, nothing
/// is re-deducted, prices stay at base).
///
/// Returns `NoPointsEarned` — with no state touched at all — when the
/// colony is not worth a single point.
pub fn perform_prestige(
    ledger: &mut ColonyLedger,
    rates: &mut ProductionRates,
    unlocks: &mut ColonyUnlocks,
    shop: &mut UpgradeShop,
    prestige: &mut PrestigeState,
) -> PrestigeResult {
    let points_earned = calculate_points(ledger, prestige);
    if points_earned == 0 {
        return PrestigeResult::NoPointsEarned;
    }

    prestige.points += points_earned;
    prestige.times_prestiged += 1;

    *ledger = ColonyLedger::default();
    *rates = ProductionRates::default();
    *unlocks = ColonyUnlocks::default();
    shop.reset_costs();

    let history = prestige.purchase_history.clone();
    let mut targets = EffectTargets {
        ledger,
        rates,
        unlocks,
    };
    for kind in history {
        apply_effect(kind, &mut targets, true);
    }

    PrestigeResult::Completed { points_earned }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Handles founding-flight requests from the UI: runs the cycle, clears
/// the old durable save, persists the fresh combined state, and emits the
/// one-shot notifications.
pub fn handle_prestige_request(
    mut events: EventReader<PrestigeRequestEvent>,
    mut ledger: ResMut<ColonyLedger>,
    mut rates: ResMut<ProductionRates>,
    mut unlocks: ResMut<ColonyUnlocks>,
    mut shop: ResMut<UpgradeShop>,
    mut prestige: ResMut<PrestigeState>,
    achievements: Res<Achievements>,
    stats: Res<ColonyStats>,
    store: Res<SaveStore>,
    mut last_saved: ResMut<LastSaved>,
    mut notify: EventWriter<NotificationEvent>,
    mut completed: EventWriter<PrestigeCompletedEvent>,
) {
    for _ in events.read() {
        let result = perform_prestige(
            &mut ledger,
            &mut rates,
            &mut unlocks,
            &mut shop,
            &mut prestige,
        );
        let points_earned = match result {
            PrestigeResult::NoPointsEarned => {
                info!("[Prestige] Flight denied: the colony would earn no points.");
                notify.send(NotificationEvent::new(
                    "The colony is too small to found a new one.",
                ));
                continue;
            }
            PrestigeResult::Completed { points_earned } => points_earned,
        };

        info!(
            "[Prestige] Founding flight #{} complete: +{} points ({} total).",
            prestige.times_prestiged, points_earned, prestige.points
        );
        notify.send(NotificationEvent::new(format!(
            "Founding flight! +{} prestige point(s).",
            points_earned
        )));
        // The tier milestone fires exactly once: the count passes the
        // threshold on a single increment.
        if prestige.times_prestiged == ELITE_TIER_PRESTIGES {
            notify.send(NotificationEvent::new(
                "The elite brood stirs — a new upgrade tier is open.",
            ));
        }
        completed.send(PrestigeCompletedEvent {
            points_earned,
            total_points: prestige.points,
            times_prestiged: prestige.times_prestiged,
        });

        // Drop the pre-flight save, then persist the combined state.
        if let Err(e) = store.delete(SAVE_KEY) {
            warn!("[Prestige] Could not clear the old save: {}", e);
        }
        last_saved.0 = now_millis();
        if let Err(e) = write_save(
            &store,
            &ledger,
            &rates,
            &unlocks,
            &shop,
            &prestige,
            &achievements,
            &stats,
            last_saved.0,
        ) {
            error!("[Prestige] Post-flight save failed: {}", e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct PrestigePlugin;

impl Plugin for PrestigePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PrestigeRequestEvent>().add_systems(
            Update,
            handle_prestige_request.run_if(in_state(GameState::Running)),
        );

        info!("[Prestige] PrestigePlugin registered.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::shop::buy;

    #[test]
    fn test_first_flight_ant_contribution() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.amount = 60.0;
        let prestige = PrestigeState::default();
        // floor(60 / 50) + 1
        assert_eq!(calculate_points(&ledger, &prestige), 2);
    }

    #[test]
    fn test_below_threshold_earns_nothing() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.amount = 49.0;
        ledger.queens.amount = 4.0;
        let prestige = PrestigeState::default();
        assert_eq!(calculate_points(&ledger, &prestige), 0);
    }

    #[test]
    fn test_queens_contribute_without_scaling() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 5.0;
        let prestige = PrestigeState {
            times_prestiged: 10,
            ..Default::default()
        };
        // Queens keep the flat curve no matter how many flights happened.
        assert_eq!(calculate_points(&ledger, &prestige), 2);
    }

    #[test]
    fn test_fifth_flight_stiffens_threshold_but_keeps_flat_curve() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.cap = 1_000.0;
        ledger.ants.amount = 250.0;
        let prestige = PrestigeState {
            times_prestiged: 5,
            ..Default::default()
        };
        // Threshold 50 × (1 + 5×0.2) = 100; flat curve still applies at 5.
        assert_eq!(calculate_points(&ledger, &prestige), 3);
    }

    #[test]
    fn test_late_flights_use_scaled_curve() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.cap = 1_000.0;
        ledger.ants.amount = 250.0;
        let prestige = PrestigeState {
            times_prestiged: 6,
            ..Default::default()
        };
        // Threshold 50 × 2.2 = 110; floor((250/110) × 1.3) = 2.
        assert_eq!(calculate_points(&ledger, &prestige), 2);
    }

    #[test]
    fn test_zero_point_prestige_touches_nothing() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 777.0;
        let mut rates = ProductionRates::default();
        let mut unlocks = ColonyUnlocks::default();
        let mut shop = UpgradeShop::default();
        let mut prestige = PrestigeState {
            points: 3,
            times_prestiged: 2,
            purchase_history: vec![UpgradeKind::NimbleForagers],
        };

        let result = perform_prestige(
            &mut ledger,
            &mut rates,
            &mut unlocks,
            &mut shop,
            &mut prestige,
        );
        assert_eq!(result, PrestigeResult::NoPointsEarned);
        assert_eq!(ledger.amount(PoolKind::Seeds), 777.0);
        assert_eq!(prestige.points, 3);
        assert_eq!(prestige.times_prestiged, 2);
    }

    #[test]
    fn test_flight_resets_and_replays_in_order() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 1_000.0;
        let mut rates = ProductionRates::default();
        let mut unlocks = ColonyUnlocks::default();
        let mut shop = UpgradeShop::default();
        let mut prestige = PrestigeState::default();

        // Two forager levels and one brood level, bought the normal way.
        for kind in [
            UpgradeKind::NimbleForagers,
            UpgradeKind::NimbleForagers,
            UpgradeKind::RoyalJelly,
        ] {
            let mut targets = EffectTargets {
                ledger: &mut ledger,
                rates: &mut rates,
                unlocks: &mut unlocks,
            };
            assert!(buy(kind, &mut shop, &mut prestige, &mut targets));
        }
        let rates_before = rates.clone();

        ledger.ants.amount = 60.0;
        let result = perform_prestige(
            &mut ledger,
            &mut rates,
            &mut unlocks,
            &mut shop,
            &mut prestige,
        );
        assert_eq!(result, PrestigeResult::Completed { points_earned: 2 });
        assert_eq!(prestige.points, 2);
        assert_eq!(prestige.times_prestiged, 1);

        // Pools back to their starting constants...
        assert_eq!(ledger.amount(PoolKind::Ants), STARTING_ANTS);
        assert_eq!(ledger.amount(PoolKind::Seeds), STARTING_SEEDS);
        // ...prices back to base...
        assert_eq!(shop.cost(UpgradeKind::NimbleForagers), 50.0);
        // ...and the multiplier state reproduced exactly by the replay.
        assert_eq!(
            rates.seeds_per_ant_per_min,
            rates_before.seeds_per_ant_per_min
        );
        assert_eq!(
            rates.larvae_per_queen_per_min,
            rates_before.larvae_per_queen_per_min
        );
        // History untouched by the replay itself.
        assert_eq!(prestige.purchase_history.len(), 3);
    }

    #[test]
    fn test_replay_skips_non_carrying_grants() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 500.0;
        let mut rates = ProductionRates::default();
        let mut unlocks = ColonyUnlocks::default();
        let mut shop = UpgradeShop::default();
        let mut prestige = PrestigeState::default();

        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        assert!(buy(
            UpgradeKind::ForagersBounty,
            &mut shop,
            &mut prestige,
            &mut targets
        ));

        ledger.ants.amount = 60.0;
        perform_prestige(
            &mut ledger,
            &mut rates,
            &mut unlocks,
            &mut shop,
            &mut prestige,
        );
        // The one-shot seed cache is not granted again.
        assert_eq!(ledger.amount(PoolKind::Seeds), STARTING_SEEDS);
        // But it stays in the history and stays unpurchasable.
        ledger.seeds.amount = 500.0;
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        assert!(!buy(
            UpgradeKind::ForagersBounty,
            &mut shop,
            &mut prestige,
            &mut targets
        ));
    }
}
