//! Shared resources, events, and states for Formicid.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly, except where a pure
//! helper is explicitly exported for cross-domain use.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE — top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Running,
    Paused,
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCE POOLS
// ═══════════════════════════════════════════════════════════════════════

/// The five colony resources. Ants, queens, and elite ants are
/// integer-valued; seeds and larvae accrue continuously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    Seeds,
    Larvae,
    Ants,
    Queens,
    EliteAnts,
}

impl PoolKind {
    /// Integer-valued pools are floored whenever a multiplier is applied.
    pub fn is_integer_valued(self) -> bool {
        matches!(self, PoolKind::Ants | PoolKind::Queens | PoolKind::EliteAnts)
    }
}

/// A single resource: its current amount and its storage cap.
/// Invariant: `0 <= amount <= cap` whenever a pool is observable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pool {
    pub amount: f64,
    pub cap: f64,
}

impl Pool {
    pub fn new(amount: f64, cap: f64) -> Self {
        Self { amount, cap }
    }

    pub fn headroom(&self) -> f64 {
        (self.cap - self.amount).max(0.0)
    }
}

/// Quantities produced by a single fixed tick, after cap clamping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickGains {
    pub larvae: f64,
    pub seeds: f64,
}

/// Owns every pool. The only mutator of amounts and caps — upgrades and
/// the prestige cycle go through `grow` / `increase_cap` / `spend`, the UI
/// never writes amounts directly.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct ColonyLedger {
    pub seeds: Pool,
    pub larvae: Pool,
    pub ants: Pool,
    pub queens: Pool,
    pub elite_ants: Pool,
}

impl Default for ColonyLedger {
    fn default() -> Self {
        Self {
            seeds: Pool::new(STARTING_SEEDS, STARTING_SEED_CAP),
            larvae: Pool::new(0.0, STARTING_LARVAE_CAP),
            ants: Pool::new(STARTING_ANTS, STARTING_ANT_CAP),
            queens: Pool::new(0.0, STARTING_QUEEN_CAP),
            elite_ants: Pool::new(0.0, STARTING_ELITE_ANT_CAP),
        }
    }
}

impl ColonyLedger {
    pub fn pool(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::Seeds => &self.seeds,
            PoolKind::Larvae => &self.larvae,
            PoolKind::Ants => &self.ants,
            PoolKind::Queens => &self.queens,
            PoolKind::EliteAnts => &self.elite_ants,
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut Pool {
        match kind {
            PoolKind::Seeds => &mut self.seeds,
            PoolKind::Larvae => &mut self.larvae,
            PoolKind::Ants => &mut self.ants,
            PoolKind::Queens => &mut self.queens,
            PoolKind::EliteAnts => &mut self.elite_ants,
        }
    }

    pub fn amount(&self, kind: PoolKind) -> f64 {
        self.pool(kind).amount
    }

    pub fn cap(&self, kind: PoolKind) -> f64 {
        self.pool(kind).cap
    }

    /// Adds to a pool, clamped to `[0, cap]`. Returns the amount actually
    /// credited (may be less than requested when the pool fills up).
    pub fn add(&mut self, kind: PoolKind, amount: f64) -> f64 {
        let pool = self.pool_mut(kind);
        let before = pool.amount;
        pool.amount = (pool.amount + amount).clamp(0.0, pool.cap);
        pool.amount - before
    }

    /// Applies one fixed production tick: queens brood larvae, foragers
    /// gather seeds. Overflow is silently clamped at the caps.
    pub fn tick(&mut self, dt_secs: f64, rates: &ProductionRates) -> TickGains {
        let minutes = dt_secs / 60.0;
        let brooded = self.queens.amount * rates.larvae_per_queen_per_min * minutes;
        let foragers =
            self.ants.amount + self.elite_ants.amount * rates.elite_forage_multiplier;
        let gathered = foragers * rates.seeds_per_ant_per_min * minutes;
        TickGains {
            larvae: self.add(PoolKind::Larvae, brooded),
            seeds: self.add(PoolKind::Seeds, gathered),
        }
    }

    /// All-or-nothing spend across every listed resource. If any single
    /// cost cannot be covered, nothing is deducted and `false` is returned.
    pub fn spend(&mut self, costs: &[(PoolKind, f64)]) -> bool {
        for &(kind, amount) in costs {
            if self.pool(kind).amount < amount {
                return false;
            }
        }
        for &(kind, amount) in costs {
            self.pool_mut(kind).amount -= amount;
        }
        true
    }

    /// Multiplies a pool's amount, flooring integer-valued pools, clamped
    /// to the cap. Used by upgrade effects only.
    pub fn grow(&mut self, kind: PoolKind, factor: f64) {
        let integer_valued = kind.is_integer_valued();
        let pool = self.pool_mut(kind);
        let mut grown = pool.amount * factor;
        if integer_valued {
            grown = grown.floor();
        }
        pool.amount = grown.clamp(0.0, pool.cap);
    }

    /// Multiplies a pool's storage cap, floored at the cap boundary.
    /// Used by upgrade effects only.
    pub fn increase_cap(&mut self, kind: PoolKind, factor: f64) {
        let pool = self.pool_mut(kind);
        pool.cap = (pool.cap * factor).floor();
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PRODUCTION RATES
// ═══════════════════════════════════════════════════════════════════════

/// Production multipliers and conversion costs. Owned by the ledger
/// domain; mutated only through upgrade / prestige effect application.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRates {
    pub larvae_per_queen_per_min: f64,
    pub seeds_per_ant_per_min: f64,
    /// One elite ant forages like this many workers.
    pub elite_forage_multiplier: f64,
    pub larva_seed_cost: f64,
    pub ant_larva_cost: f64,
    pub ant_seed_cost: f64,
    pub queen_ant_cost: f64,
    pub elite_ant_larva_cost: f64,
    pub elite_ant_seed_cost: f64,
}

impl Default for ProductionRates {
    fn default() -> Self {
        Self {
            larvae_per_queen_per_min: BASE_LARVAE_PER_QUEEN_PER_MIN,
            seeds_per_ant_per_min: BASE_SEEDS_PER_ANT_PER_MIN,
            elite_forage_multiplier: BASE_ELITE_FORAGE_MULTIPLIER,
            larva_seed_cost: LARVA_SEED_COST,
            ant_larva_cost: ANT_LARVA_COST,
            ant_seed_cost: ANT_SEED_COST,
            queen_ant_cost: QUEEN_ANT_COST,
            elite_ant_larva_cost: ELITE_ANT_LARVA_COST,
            elite_ant_seed_cost: ELITE_ANT_SEED_COST,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// UNLOCK FLAGS
// ═══════════════════════════════════════════════════════════════════════

/// One-way feature flags flipped by upgrade effects.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColonyUnlocks {
    pub elite_ants: bool,
    pub auto_larvae: bool,
    pub auto_ants: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// UPGRADES — identifiers only; catalog and effects live in the economy
// domain. The closed enum makes an unrecognized upgrade impossible.
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    NimbleForagers,
    RoyalJelly,
    SeedGranary,
    BroodChambers,
    PheromoneCall,
    ForagersBounty,
    NurseryWorkers,
    OverseerAnts,
    FrugalNursery,
    EliteBrood,
    EliteDrills,
    QueensFavor,
    DeepTunnels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeCategory {
    /// Bought with seeds.
    Colony,
    /// Bought with seeds; visible once the elite tier is reached.
    Elite,
    /// Bought with prestige points.
    Prestige,
}

// ═══════════════════════════════════════════════════════════════════════
// PRESTIGE
// ═══════════════════════════════════════════════════════════════════════

/// Permanent meta-progression. Explicitly exempt from the reset it
/// triggers: points, count, and the purchase history all survive.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrestigeState {
    pub points: u64,
    pub times_prestiged: u32,
    /// Every purchase ever made, in order, duplicates allowed for
    /// repeatable upgrades. Replayed after each prestige reset.
    pub purchase_history: Vec<UpgradeKind>,
}

// ═══════════════════════════════════════════════════════════════════════
// ACHIEVEMENTS & LIFETIME STATS
// ═══════════════════════════════════════════════════════════════════════

/// Unlocked achievement ids. Push-only: an id is never removed.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Achievements {
    pub unlocked: Vec<String>,
}

impl Achievements {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }
}

/// Counters that only ever go up. They feed achievements and survive the
/// prestige reset; only a brand-new game clears them.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColonyStats {
    pub total_seeds_earned: f64,
    pub total_larvae_spawned: u64,
    pub enemies_defeated: u64,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS — cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// Fire-and-forget player-facing notification. The core emits these; a UI
/// collaborator renders them (or nobody does — no acknowledgment needed).
#[derive(Event, Debug, Clone)]
pub struct NotificationEvent {
    pub message: String,
    pub duration_secs: f32,
}

impl NotificationEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duration_secs: 4.0,
        }
    }
}

/// Fired once per achievement, the frame its latch flips.
#[derive(Event, Debug, Clone)]
pub struct AchievementUnlockedEvent {
    pub achievement_id: String,
    pub name: String,
    pub description: String,
}

/// Reported by the (external) combat collaborator whenever the colony's
/// soldiers win a fight.
#[derive(Event, Debug, Clone)]
pub struct EnemyDefeatedEvent {
    pub count: u32,
}

/// Fired after a successful prestige cycle.
#[derive(Event, Debug, Clone)]
pub struct PrestigeCompletedEvent {
    pub points_earned: u64,
    pub total_points: u64,
    pub times_prestiged: u32,
}

// ═══════════════════════════════════════════════════════════════════════
// SAVE DATA — flat, JSON-compatible, stable field names
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;

/// The full durable snapshot. Loaded blobs pass through an explicit
/// migration step (see the save domain) before any field is read, so a
/// `SaveData` in memory is always fully populated at the current schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub seeds: f64,
    pub seed_cap: f64,
    pub larvae: f64,
    pub larvae_cap: f64,
    pub ants: f64,
    pub ant_cap: f64,
    pub queens: f64,
    pub queen_cap: f64,
    pub elite_ants: f64,
    pub elite_ant_cap: f64,
    pub larvae_per_queen_per_min: f64,
    pub seeds_per_ant_per_min: f64,
    pub elite_forage_multiplier: f64,
    pub larva_seed_cost: f64,
    pub ant_larva_cost: f64,
    pub ant_seed_cost: f64,
    pub queen_ant_cost: f64,
    pub elite_ant_larva_cost: f64,
    pub elite_ant_seed_cost: f64,
    pub upgrade_costs: Vec<(UpgradeKind, f64)>,
    pub purchase_history: Vec<UpgradeKind>,
    pub prestige_points: u64,
    pub times_prestiged: u32,
    pub unlocked_achievements: Vec<String>,
    pub elite_unlocked: bool,
    pub auto_larvae: bool,
    pub auto_ants: bool,
    pub total_seeds_earned: f64,
    pub total_larvae_spawned: u64,
    pub enemies_defeated: u64,
    /// Wall-clock anchor (ms since epoch) for offline reconciliation.
    pub last_saved_ms: u64,
}

impl Default for SaveData {
    /// A fresh colony at the current schema. Doubles as the source of
    /// per-field defaults when migrating an older blob.
    fn default() -> Self {
        let ledger = ColonyLedger::default();
        let rates = ProductionRates::default();
        Self {
            version: SAVE_VERSION,
            seeds: ledger.seeds.amount,
            seed_cap: ledger.seeds.cap,
            larvae: ledger.larvae.amount,
            larvae_cap: ledger.larvae.cap,
            ants: ledger.ants.amount,
            ant_cap: ledger.ants.cap,
            queens: ledger.queens.amount,
            queen_cap: ledger.queens.cap,
            elite_ants: ledger.elite_ants.amount,
            elite_ant_cap: ledger.elite_ants.cap,
            larvae_per_queen_per_min: rates.larvae_per_queen_per_min,
            seeds_per_ant_per_min: rates.seeds_per_ant_per_min,
            elite_forage_multiplier: rates.elite_forage_multiplier,
            larva_seed_cost: rates.larva_seed_cost,
            ant_larva_cost: rates.ant_larva_cost,
            ant_seed_cost: rates.ant_seed_cost,
            queen_ant_cost: rates.queen_ant_cost,
            elite_ant_larva_cost: rates.elite_ant_larva_cost,
            elite_ant_seed_cost: rates.elite_ant_seed_cost,
            // Empty means "base price for everything" when restored.
            upgrade_costs: Vec::new(),
            purchase_history: Vec::new(),
            prestige_points: 0,
            times_prestiged: 0,
            unlocked_achievements: Vec::new(),
            elite_unlocked: false,
            auto_larvae: false,
            auto_ants: false,
            total_seeds_earned: 0.0,
            total_larvae_spawned: 0,
            enemies_defeated: 0,
            last_saved_ms: 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Length of one production tick. Real elapsed time is accumulated and
/// consumed in whole ticks.
pub const TICK_SECONDS: f32 = 1.0;
pub const AUTOSAVE_SECONDS: f32 = 60.0;
pub const SAVE_KEY: &str = "formicid_save";

pub const STARTING_SEEDS: f64 = 20.0;
pub const STARTING_SEED_CAP: f64 = 1_000.0;
pub const STARTING_LARVAE_CAP: f64 = 10.0;
pub const STARTING_ANTS: f64 = 1.0;
pub const STARTING_ANT_CAP: f64 = 100.0;
pub const STARTING_QUEEN_CAP: f64 = 5.0;
pub const STARTING_ELITE_ANT_CAP: f64 = 10.0;

pub const BASE_LARVAE_PER_QUEEN_PER_MIN: f64 = 1.0;
pub const BASE_SEEDS_PER_ANT_PER_MIN: f64 = 10.0;
pub const BASE_ELITE_FORAGE_MULTIPLIER: f64 = 5.0;

pub const LARVA_SEED_COST: f64 = 100.0;
pub const ANT_LARVA_COST: f64 = 1.0;
pub const ANT_SEED_COST: f64 = 50.0;
pub const QUEEN_ANT_COST: f64 = 50.0;
pub const ELITE_ANT_LARVA_COST: f64 = 10.0;
pub const ELITE_ANT_SEED_COST: f64 = 1_000.0;

pub const BASE_ANT_THRESHOLD: f64 = 50.0;
pub const BASE_QUEEN_THRESHOLD: f64 = 5.0;
/// Prestiging this many times opens the elite upgrade tier.
pub const ELITE_TIER_PRESTIGES: u32 = 3;

pub const DEFAULT_COST_GROWTH: f64 = 1.5;
/// Storage-tier upgrades triple in price instead.
pub const STORAGE_COST_GROWTH: f64 = 3.0;
