//! Upgrade catalog — static definitions, unlock predicates, and effect
//! application.
//!
//! The catalog is a closed set: `UpgradeKind` enumerates every upgrade and
//! `apply_effect` matches exhaustively, so an unrecognized upgrade cannot
//! exist past compile time.

use bevy::prelude::*;

use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Static description of a single upgrade. `base_cost` is the price at the
/// start of a save (and again after each shop-cost reset); the live price
/// is tracked by [`UpgradeShop`].
pub struct UpgradeDef {
    pub kind: UpgradeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub category: UpgradeCategory,
    pub base_cost: f64,
    /// Price multiplier applied (then floored) after each purchase.
    pub cost_growth: f64,
    pub one_time: bool,
    /// One-shot grants set this to `false`: they stay purchased across a
    /// prestige but their effect is not replayed.
    pub applies_on_prestige: bool,
}

pub const UPGRADES: &[UpgradeDef] = &[
    UpgradeDef {
        kind: UpgradeKind::NimbleForagers,
        name: "Nimble Foragers",
        description: "Workers gather seeds 25% faster",
        category: UpgradeCategory::Colony,
        base_cost: 50.0,
        cost_growth: DEFAULT_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::RoyalJelly,
        name: "Royal Jelly",
        description: "Queens brood larvae 25% faster",
        category: UpgradeCategory::Colony,
        base_cost: 150.0,
        cost_growth: DEFAULT_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::SeedGranary,
        name: "Seed Granary",
        description: "Doubles seed storage",
        category: UpgradeCategory::Colony,
        base_cost: 200.0,
        cost_growth: STORAGE_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::BroodChambers,
        name: "Brood Chambers",
        description: "Doubles larvae storage",
        category: UpgradeCategory::Colony,
        base_cost: 250.0,
        cost_growth: STORAGE_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::PheromoneCall,
        name: "Pheromone Call",
        description: "Draws stray ants to the colony (+20%)",
        category: UpgradeCategory::Colony,
        base_cost: 500.0,
        cost_growth: 2.0,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::ForagersBounty,
        name: "Forager's Bounty",
        description: "A lucky cache: 500 seeds, once",
        category: UpgradeCategory::Colony,
        base_cost: 100.0,
        cost_growth: 1.0,
        one_time: true,
        applies_on_prestige: false,
    },
    UpgradeDef {
        kind: UpgradeKind::NurseryWorkers,
        name: "Nursery Workers",
        description: "Larvae are created automatically",
        category: UpgradeCategory::Colony,
        base_cost: 1_000.0,
        cost_growth: 1.0,
        one_time: true,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::OverseerAnts,
        name: "Overseer Ants",
        description: "Workers are raised automatically",
        category: UpgradeCategory::Colony,
        base_cost: 2_500.0,
        cost_growth: 1.0,
        one_time: true,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::FrugalNursery,
        name: "Frugal Nursery",
        description: "Larvae need 20% fewer seeds",
        category: UpgradeCategory::Colony,
        base_cost: 750.0,
        cost_growth: DEFAULT_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::EliteBrood,
        name: "Elite Brood",
        description: "Unlocks elite ants",
        category: UpgradeCategory::Elite,
        base_cost: 10_000.0,
        cost_growth: 1.0,
        one_time: true,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::EliteDrills,
        name: "Elite Drills",
        description: "Elite ants forage 50% harder",
        category: UpgradeCategory::Elite,
        base_cost: 5_000.0,
        cost_growth: DEFAULT_COST_GROWTH,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::QueensFavor,
        name: "Queen's Favor",
        description: "All production doubled",
        category: UpgradeCategory::Prestige,
        base_cost: 5.0,
        cost_growth: 2.0,
        one_time: false,
        applies_on_prestige: true,
    },
    UpgradeDef {
        kind: UpgradeKind::DeepTunnels,
        name: "Deep Tunnels",
        description: "Doubles ant housing",
        category: UpgradeCategory::Prestige,
        base_cost: 3.0,
        cost_growth: 2.0,
        one_time: false,
        applies_on_prestige: true,
    },
];

/// Looks up the static definition for an upgrade. Every `UpgradeKind` has
/// exactly one catalog entry (enforced by a test below).
pub fn upgrade_def(kind: UpgradeKind) -> &'static UpgradeDef {
    UPGRADES
        .iter()
        .find(|d| d.kind == kind)
        .expect("every UpgradeKind has a catalog entry")
}

// ─────────────────────────────────────────────────────────────────────────────
// Unlock predicates
// ─────────────────────────────────────────────────────────────────────────────

/// Whether an upgrade is visible/purchasable right now. Evaluated freshly
/// on every query: a purchase that flips shared state (e.g. unlocking
/// elite ants) is immediately visible to dependent upgrades within the
/// same call chain.
pub fn is_unlocked(
    kind: UpgradeKind,
    prestige: &PrestigeState,
    unlocks: &ColonyUnlocks,
) -> bool {
    match kind {
        UpgradeKind::EliteBrood => prestige.times_prestiged >= ELITE_TIER_PRESTIGES,
        UpgradeKind::EliteDrills => unlocks.elite_ants,
        UpgradeKind::QueensFavor | UpgradeKind::DeepTunnels => {
            prestige.times_prestiged >= 1
        }
        _ => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Effects
// ─────────────────────────────────────────────────────────────────────────────

/// Everything an upgrade effect is allowed to touch. Bundled so the shop,
/// the prestige replay, and tests hand effects the same surface.
pub struct EffectTargets<'a> {
    pub ledger: &'a mut ColonyLedger,
    pub rates: &'a mut ProductionRates,
    pub unlocks: &'a mut ColonyUnlocks,
}

/// Applies an upgrade's effect exactly once. On the prestige-replay path
/// (`from_prestige = true`) non-carrying upgrades are skipped.
pub fn apply_effect(kind: UpgradeKind, targets: &mut EffectTargets<'_>, from_prestige: bool) {
    if from_prestige && !upgrade_def(kind).applies_on_prestige {
        return;
    }
    match kind {
        UpgradeKind::NimbleForagers => targets.rates.seeds_per_ant_per_min *= 1.25,
        UpgradeKind::RoyalJelly => targets.rates.larvae_per_queen_per_min *= 1.25,
        UpgradeKind::SeedGranary => targets.ledger.increase_cap(PoolKind::Seeds, 2.0),
        UpgradeKind::BroodChambers => targets.ledger.increase_cap(PoolKind::Larvae, 2.0),
        UpgradeKind::PheromoneCall => targets.ledger.grow(PoolKind::Ants, 1.2),
        UpgradeKind::ForagersBounty => {
            targets.ledger.add(PoolKind::Seeds, 500.0);
        }
        UpgradeKind::NurseryWorkers => targets.unlocks.auto_larvae = true,
        UpgradeKind::OverseerAnts => targets.unlocks.auto_ants = true,
        UpgradeKind::FrugalNursery => targets.rates.larva_seed_cost *= 0.8,
        UpgradeKind::EliteBrood => targets.unlocks.elite_ants = true,
        UpgradeKind::EliteDrills => targets.rates.elite_forage_multiplier *= 1.5,
        UpgradeKind::QueensFavor => {
            targets.rates.seeds_per_ant_per_min *= 2.0;
            targets.rates.larvae_per_queen_per_min *= 2.0;
        }
        UpgradeKind::DeepTunnels => targets.ledger.increase_cap(PoolKind::Ants, 2.0),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Live prices
// ─────────────────────────────────────────────────────────────────────────────

/// Current price of every upgrade, in catalog order. Prices only move up
/// (purchase compounding) until an explicit shop-cost reset.
#[derive(Resource, Debug, Clone)]
pub struct UpgradeShop {
    costs: Vec<(UpgradeKind, f64)>,
}

impl Default for UpgradeShop {
    fn default() -> Self {
        Self {
            costs: UPGRADES.iter().map(|d| (d.kind, d.base_cost)).collect(),
        }
    }
}

impl UpgradeShop {
    pub fn cost(&self, kind: UpgradeKind) -> f64 {
        self.costs
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| *c)
            .unwrap_or_else(|| upgrade_def(kind).base_cost)
    }

    pub fn set_cost(&mut self, kind: UpgradeKind, cost: f64) {
        if let Some(entry) = self.costs.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = cost;
        } else {
            self.costs.push((kind, cost));
        }
    }

    /// The one sanctioned price decrease: every cost back to base.
    pub fn reset_costs(&mut self) {
        *self = Self::default();
    }

    pub fn costs(&self) -> &[(UpgradeKind, f64)] {
        &self.costs
    }

    pub fn restore_costs(&mut self, saved: &[(UpgradeKind, f64)]) {
        for &(kind, cost) in saved {
            self.set_cost(kind, cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: &[UpgradeKind] = &[
        UpgradeKind::NimbleForagers,
        UpgradeKind::RoyalJelly,
        UpgradeKind::SeedGranary,
        UpgradeKind::BroodChambers,
        UpgradeKind::PheromoneCall,
        UpgradeKind::ForagersBounty,
        UpgradeKind::NurseryWorkers,
        UpgradeKind::OverseerAnts,
        UpgradeKind::FrugalNursery,
        UpgradeKind::EliteBrood,
        UpgradeKind::EliteDrills,
        UpgradeKind::QueensFavor,
        UpgradeKind::DeepTunnels,
    ];

    #[test]
    fn test_catalog_covers_every_kind() {
        for &kind in ALL_KINDS {
            assert_eq!(upgrade_def(kind).kind, kind);
        }
        assert_eq!(UPGRADES.len(), ALL_KINDS.len());
    }

    #[test]
    fn test_unlock_predicate_sees_fresh_state() {
        let prestige = PrestigeState {
            times_prestiged: ELITE_TIER_PRESTIGES,
            ..Default::default()
        };
        let mut unlocks = ColonyUnlocks::default();
        assert!(!is_unlocked(UpgradeKind::EliteDrills, &prestige, &unlocks));

        let mut ledger = ColonyLedger::default();
        let mut rates = ProductionRates::default();
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        apply_effect(UpgradeKind::EliteBrood, &mut targets, false);
        assert!(is_unlocked(UpgradeKind::EliteDrills, &prestige, &unlocks));
    }

    #[test]
    fn test_non_carrying_effect_skipped_on_replay() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = 0.0;
        let mut rates = ProductionRates::default();
        let mut unlocks = ColonyUnlocks::default();
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        apply_effect(UpgradeKind::ForagersBounty, &mut targets, true);
        assert_eq!(ledger.amount(PoolKind::Seeds), 0.0);

        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        apply_effect(UpgradeKind::ForagersBounty, &mut targets, false);
        assert_eq!(ledger.amount(PoolKind::Seeds), 500.0);
    }

    #[test]
    fn test_bounty_grant_clamps_at_cap() {
        let mut ledger = ColonyLedger::default();
        ledger.seeds.amount = ledger.cap(PoolKind::Seeds) - 100.0;
        let mut rates = ProductionRates::default();
        let mut unlocks = ColonyUnlocks::default();
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        apply_effect(UpgradeKind::ForagersBounty, &mut targets, false);
        assert_eq!(ledger.amount(PoolKind::Seeds), ledger.cap(PoolKind::Seeds));
    }

    #[test]
    fn test_shop_reset_restores_base_costs() {
        let mut shop = UpgradeShop::default();
        shop.set_cost(UpgradeKind::NimbleForagers, 75.0);
        shop.set_cost(UpgradeKind::SeedGranary, 600.0);
        shop.reset_costs();
        assert_eq!(shop.cost(UpgradeKind::NimbleForagers), 50.0);
        assert_eq!(shop.cost(UpgradeKind::SeedGranary), 200.0);
    }
}
