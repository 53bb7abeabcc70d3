//! Colony domain — the resource ledger's heartbeat.
//!
//! Responsible for:
//! - Accruing production in fixed ticks (queens brood larvae, foragers
//!   gather seeds), clamped at the storage caps
//! - Spawn conversions: seeds → larva, larva → ant, ants → queen,
//!   larvae + seeds → elite ant
//! - Auto-creation once the corresponding overseer upgrades are owned
//! - Display formatting for resource amounts

use bevy::prelude::*;

use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulates real elapsed seconds and releases them in whole fixed ticks.
/// Zeroed whenever the simulation leaves `Running`, so a pause never banks
/// time and stopping twice is a no-op.
#[derive(Resource, Debug, Clone, Default)]
pub struct ProductionClock {
    pub accumulator: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Events (internal — spawn requests arrive from UI input)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Larva,
    Ant,
    Queen,
    EliteAnt,
}

/// Fired by the UI when the player orders a new colony member.
#[derive(Event, Debug, Clone)]
pub struct SpawnRequestEvent {
    pub kind: SpawnKind,
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct ColonyPlugin;

impl Plugin for ColonyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProductionClock>()
            .add_event::<SpawnRequestEvent>()
            .add_systems(
                Update,
                // Production settles before conversions, so a single frame
                // observes accrual → auto-creation in that order.
                (accrue_production, auto_spawn, handle_spawn_request)
                    .chain()
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(OnExit(GameState::Running), reset_production_clock);

        info!("[Colony] ColonyPlugin registered.");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Spawn conversions
// ─────────────────────────────────────────────────────────────────────────────

/// The resources consumed to create one colony member of each kind, at
/// the current (upgrade-adjusted) conversion costs.
pub fn spawn_cost(kind: SpawnKind, rates: &ProductionRates) -> Vec<(PoolKind, f64)> {
    match kind {
        SpawnKind::Larva => vec![(PoolKind::Seeds, rates.larva_seed_cost)],
        SpawnKind::Ant => vec![
            (PoolKind::Larvae, rates.ant_larva_cost),
            (PoolKind::Seeds, rates.ant_seed_cost),
        ],
        SpawnKind::Queen => vec![(PoolKind::Ants, rates.queen_ant_cost)],
        SpawnKind::EliteAnt => vec![
            (PoolKind::Larvae, rates.elite_ant_larva_cost),
            (PoolKind::Seeds, rates.elite_ant_seed_cost),
        ],
    }
}

fn spawn_target(kind: SpawnKind) -> PoolKind {
    match kind {
        SpawnKind::Larva => PoolKind::Larvae,
        SpawnKind::Ant => PoolKind::Ants,
        SpawnKind::Queen => PoolKind::Queens,
        SpawnKind::EliteAnt => PoolKind::EliteAnts,
    }
}

/// Attempts one spawn conversion. Insufficient resources, a full target
/// pool, or a locked tier all fail without deducting anything.
pub fn try_spawn(
    ledger: &mut ColonyLedger,
    rates: &ProductionRates,
    unlocks: &ColonyUnlocks,
    stats: &mut ColonyStats,
    kind: SpawnKind,
) -> bool {
    if kind == SpawnKind::EliteAnt && !unlocks.elite_ants {
        return false;
    }
    let target = spawn_target(kind);
    if ledger.pool(target).headroom() < 1.0 {
        return false;
    }
    if !ledger.spend(&spawn_cost(kind, rates)) {
        return false;
    }
    ledger.add(target, 1.0);
    if kind == SpawnKind::Larva {
        stats.total_larvae_spawned = stats.total_larvae_spawned.saturating_add(1);
    }
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Banks real delta time and applies every whole fixed tick it covers.
/// Sub-tick remainders stay in the accumulator for the next frame.
pub fn accrue_production(
    time: Res<Time>,
    mut clock: ResMut<ProductionClock>,
    mut ledger: ResMut<ColonyLedger>,
    rates: Res<ProductionRates>,
    mut stats: ResMut<ColonyStats>,
) {
    clock.accumulator += time.delta_secs();
    while clock.accumulator >= TICK_SECONDS {
        clock.accumulator -= TICK_SECONDS;
        let gains = ledger.tick(TICK_SECONDS as f64, &rates);
        stats.total_seeds_earned += gains.seeds;
    }
}

/// Repeats the ordinary spawn conversion while it is affordable and below
/// cap: larvae first, then ants, so a freshly brooded larva can mature
/// within the same frame.
pub fn auto_spawn(
    unlocks: Res<ColonyUnlocks>,
    rates: Res<ProductionRates>,
    mut ledger: ResMut<ColonyLedger>,
    mut stats: ResMut<ColonyStats>,
) {
    if unlocks.auto_larvae {
        while try_spawn(&mut ledger, &rates, &unlocks, &mut stats, SpawnKind::Larva) {}
    }
    if unlocks.auto_ants {
        while try_spawn(&mut ledger, &rates, &unlocks, &mut stats, SpawnKind::Ant) {}
    }
}

/// Processes player spawn orders. Failure is a notification, not an error.
pub fn handle_spawn_request(
    mut events: EventReader<SpawnRequestEvent>,
    mut ledger: ResMut<ColonyLedger>,
    rates: Res<ProductionRates>,
    unlocks: Res<ColonyUnlocks>,
    mut stats: ResMut<ColonyStats>,
    mut notify: EventWriter<NotificationEvent>,
) {
    for ev in events.read() {
        if try_spawn(&mut ledger, &rates, &unlocks, &mut stats, ev.kind) {
            info!("[Colony] Spawned {:?}.", ev.kind);
        } else {
            info!("[Colony] Spawn {:?} denied.", ev.kind);
            notify.send(NotificationEvent::new(format!(
                "The colony cannot support another {} yet.",
                match ev.kind {
                    SpawnKind::Larva => "larva",
                    SpawnKind::Ant => "ant",
                    SpawnKind::Queen => "queen",
                    SpawnKind::EliteAnt => "elite ant",
                }
            )));
        }
    }
}

/// Forgets banked sub-tick time on pause/stop. Running this repeatedly is
/// harmless, and a later restart begins from a clean accumulator.
pub fn reset_production_clock(mut clock: ResMut<ProductionClock>) {
    clock.accumulator = 0.0;
}

// ─────────────────────────────────────────────────────────────────────────────
// Display formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Formats a resource amount for the HUD: whole numbers below 1,000,
/// two-decimal K/M scaling below 100,000,000, scientific notation above.
pub fn format_amount(n: f64) -> String {
    if n < 1_000.0 {
        if n.fract() == 0.0 {
            format!("{}", n as i64)
        } else {
            format!("{:.2}", n)
        }
    } else if n < 1_000_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else if n < 100_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else {
        format!("{:.2e}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_whole_numbers() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(7.0), "7");
        assert_eq!(format_amount(999.0), "999");
    }

    #[test]
    fn test_format_amount_fractional_below_thousand() {
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(0.25), "0.25");
    }

    #[test]
    fn test_format_amount_scaled() {
        assert_eq!(format_amount(1_000.0), "1.00K");
        assert_eq!(format_amount(25_500.0), "25.50K");
        assert_eq!(format_amount(1_000_000.0), "1.00M");
        assert_eq!(format_amount(99_999_999.0), "100.00M");
    }

    #[test]
    fn test_format_amount_scientific() {
        assert_eq!(format_amount(100_000_000.0), "1.00e8");
        assert_eq!(format_amount(2.5e12), "2.50e12");
    }

    #[test]
    fn test_tick_respects_caps() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 5.0;
        let rates = ProductionRates::default();
        // 1 hour of brooding at 5 larvae/min would be 300, cap is 10.
        ledger.tick(3_600.0, &rates);
        assert_eq!(ledger.amount(PoolKind::Larvae), STARTING_LARVAE_CAP);
        assert_eq!(ledger.amount(PoolKind::Seeds), STARTING_SEED_CAP);
    }

    #[test]
    fn test_tick_gains_report_clamped_amounts() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 1.0;
        let rates = ProductionRates::default();
        let gains = ledger.tick(60.0, &rates);
        assert_eq!(gains.larvae, 1.0);
        // 1 ant at 10 seeds/min, starting from 20 seeds.
        assert_eq!(gains.seeds, 10.0);
        assert_eq!(ledger.amount(PoolKind::Seeds), 30.0);
    }

    #[test]
    fn test_elite_ants_forage_harder() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.amount = 0.0;
        ledger.elite_ants.amount = 2.0;
        let rates = ProductionRates::default();
        let gains = ledger.tick(60.0, &rates);
        // 2 elites × 5 workers-worth × 10 seeds/min.
        assert_eq!(gains.seeds, 100.0);
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 100.0;
        ledger.larvae.amount = 0.5;
        let ok = ledger.spend(&[
            (PoolKind::Seeds, 50.0),
            (PoolKind::Larvae, 1.0),
        ]);
        assert!(!ok);
        // The affordable half must not have been deducted.
        assert_eq!(ledger.amount(PoolKind::Seeds), 100.0);
        assert_eq!(ledger.amount(PoolKind::Larvae), 0.5);
    }

    #[test]
    fn test_spawn_larva_insufficient_seeds_is_a_noop() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 10.0;
        let rates = ProductionRates::default();
        let unlocks = ColonyUnlocks::default();
        let mut stats = ColonyStats::default();
        assert!(!try_spawn(&mut ledger, &rates, &unlocks, &mut stats, SpawnKind::Larva));
        assert_eq!(ledger.amount(PoolKind::Larvae), 0.0);
        assert_eq!(ledger.amount(PoolKind::Seeds), 10.0);
    }

    #[test]
    fn test_spawn_larva_deducts_and_counts() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 250.0;
        let rates = ProductionRates::default();
        let unlocks = ColonyUnlocks::default();
        let mut stats = ColonyStats::default();
        assert!(try_spawn(&mut ledger, &rates, &unlocks, &mut stats, SpawnKind::Larva));
        assert_eq!(ledger.amount(PoolKind::Larvae), 1.0);
        assert_eq!(ledger.amount(PoolKind::Seeds), 150.0);
        assert_eq!(stats.total_larvae_spawned, 1);
    }

    #[test]
    fn test_spawn_fails_at_target_cap() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 1_000.0;
        ledger.larvae.amount = ledger.cap(PoolKind::Larvae);
        let rates = ProductionRates::default();
        let unlocks = ColonyUnlocks::default();
        let mut stats = ColonyStats::default();
        assert!(!try_spawn(&mut ledger, &rates, &unlocks, &mut stats, SpawnKind::Larva));
        assert_eq!(ledger.amount(PoolKind::Seeds), 1_000.0);
    }

    #[test]
    fn test_elite_spawn_requires_unlock() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 5_000.0;
        ledger.larvae.amount = ledger.cap(PoolKind::Larvae);
        let rates = ProductionRates::default();
        let mut stats = ColonyStats::default();

        let locked = ColonyUnlocks::default();
        assert!(!try_spawn(&mut ledger, &rates, &locked, &mut stats, SpawnKind::EliteAnt));

        let unlocked = ColonyUnlocks {
            elite_ants: true,
            ..Default::default()
        };
        assert!(try_spawn(&mut ledger, &rates, &unlocked, &mut stats, SpawnKind::EliteAnt));
        assert_eq!(ledger.amount(PoolKind::EliteAnts), 1.0);
    }

    #[test]
    fn test_grow_floors_integer_pools() {
        let mut ledger = ColonyLedger::default();
        ledger.ants.amount = 7.0;
        ledger.grow(PoolKind::Ants, 1.2);
        assert_eq!(ledger.amount(PoolKind::Ants), 8.0); // floor(8.4)

        ledger.seeds.amount = 7.0;
        ledger.grow(PoolKind::Seeds, 1.2);
        assert_eq!(ledger.amount(PoolKind::Seeds), 8.4);
    }

    #[test]
    fn test_increase_cap_floors() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.cap = 15.0;
        ledger.increase_cap(PoolKind::Seeds, 1.5);
        assert_eq!(ledger.cap(PoolKind::Seeds), 22.0); // floor(22.5)
    }
}
