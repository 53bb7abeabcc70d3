//! Offline reconciliation — one-shot catch-up for time spent away.
//!
//! Runs exactly once per load, synchronously, right after the save is
//! applied. Because it advances the very anchor it reads, a second call
//! against the same clock grants nothing — that at-most-once behavior is
//! intended and load-bearing, not an accident.

use super::LastSaved;
use crate::shared::*;

/// What the colony produced while the game was closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGains {
    pub larvae_granted: f64,
    pub seeds_granted: f64,
}

/// Grants `min(floor(elapsed_minutes × rate), cap − amount)` per pool,
/// never negative, then advances the anchor to `now_ms`.
pub fn reconcile(
    now_ms: u64,
    last_saved: &mut LastSaved,
    ledger: &mut ColonyLedger,
    rates: &ProductionRates,
) -> OfflineGains {
    let elapsed_minutes = now_ms.saturating_sub(last_saved.0) as f64 / 60_000.0;

    let larvae_per_min = ledger.amount(PoolKind::Queens) * rates.larvae_per_queen_per_min;
    let foragers = ledger.amount(PoolKind::Ants)
        + ledger.amount(PoolKind::EliteAnts) * rates.elite_forage_multiplier;
    let seeds_per_min = foragers * rates.seeds_per_ant_per_min;

    let gains = OfflineGains {
        larvae_granted: grant(ledger, PoolKind::Larvae, elapsed_minutes * larvae_per_min),
        seeds_granted: grant(ledger, PoolKind::Seeds, elapsed_minutes * seeds_per_min),
    };

    last_saved.0 = now_ms;
    gains
}

/// Floors the produced amount and clamps it to the pool's remaining
/// headroom before crediting it.
fn grant(ledger: &mut ColonyLedger, kind: PoolKind, produced: f64) -> f64 {
    let granted = produced
        .floor()
        .max(0.0)
        .min(ledger.pool(kind).headroom());
    ledger.add(kind, granted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_minutes_away_grants_two_larvae() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 1.0;
        ledger.ants.amount = 0.0;
        let rates = ProductionRates::default();
        let mut last_saved = LastSaved(0);

        let gains = reconcile(120_000, &mut last_saved, &mut ledger, &rates);
        assert_eq!(gains.larvae_granted, 2.0);
        assert_eq!(ledger.amount(PoolKind::Larvae), 2.0);
        assert_eq!(last_saved.0, 120_000);
    }

    #[test]
    fn test_grants_are_floored() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 1.0;
        ledger.ants.amount = 0.0;
        let rates = ProductionRates::default();
        let mut last_saved = LastSaved(0);

        // 90 seconds at 1 larva/min is 1.5 — floored to 1.
        let gains = reconcile(90_000, &mut last_saved, &mut ledger, &rates);
        assert_eq!(gains.larvae_granted, 1.0);
    }

    #[test]
    fn test_grant_never_exceeds_headroom() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 5.0;
        ledger.larvae.amount = 7.0;
        let rates = ProductionRates::default();
        let mut last_saved = LastSaved(0);

        // A week offline: production dwarfs the 3 larvae of headroom.
        let week_ms = 7 * 24 * 60 * 60 * 1_000;
        let gains = reconcile(week_ms, &mut last_saved, &mut ledger, &rates);
        assert_eq!(gains.larvae_granted, 3.0);
        assert_eq!(
            ledger.amount(PoolKind::Larvae),
            ledger.cap(PoolKind::Larvae)
        );
    }

    #[test]
    fn test_second_reconcile_with_same_clock_grants_nothing() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 1.0;
        let rates = ProductionRates::default();
        let mut last_saved = LastSaved(0);

        let first = reconcile(600_000, &mut last_saved, &mut ledger, &rates);
        assert!(first.larvae_granted > 0.0);
        let second = reconcile(600_000, &mut last_saved, &mut ledger, &rates);
        assert_eq!(second.larvae_granted, 0.0);
        assert_eq!(second.seeds_granted, 0.0);
    }

    #[test]
    fn test_clock_going_backwards_grants_nothing() {
        let mut ledger = ColonyLedger::default();
        ledger.queens.amount = 1.0;
        let rates = ProductionRates::default();
        let mut last_saved = LastSaved(600_000);

        let gains = reconcile(0, &mut last_saved, &mut ledger, &rates);
        assert_eq!(gains.larvae_granted, 0.0);
        assert_eq!(gains.seeds_granted, 0.0);
        assert_eq!(last_saved.0, 0);
    }
}
