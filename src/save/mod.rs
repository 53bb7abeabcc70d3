//! Save domain — durable persistence behind an opaque key-value gateway.
//!
//! The simulation serializes its full state into one flat JSON blob and
//! hands it to a [`PersistenceGateway`]: the filesystem on native builds,
//! `localStorage` in the browser, plain memory under test. A storage
//! failure is never fatal — it is logged and the session continues with
//! in-memory state only.
//!
//! Loading runs once at startup: raw JSON passes through an explicit
//! versioned migration that produces a fully-defaulted current-schema
//! record *before* any component reads a field, then offline
//! reconciliation grants the production that accrued while the game was
//! closed.

pub mod offline;

use bevy::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

use crate::economy::upgrades::UpgradeShop;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// PERSISTENCE GATEWAY
// ═══════════════════════════════════════════════════════════════════════

/// Opaque durable key-value store. Implementations receive an
/// already-serialized snapshot, so no half-updated state can ever be
/// observed or persisted regardless of what the backend does internally.
pub trait PersistenceGateway: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, blob: &str) -> Result<(), String>;
    fn delete(&self, key: &str) -> Result<(), String>;
}

/// The gateway the session writes through.
#[derive(Resource, Clone)]
pub struct SaveStore(pub Arc<dyn PersistenceGateway>);

impl SaveStore {
    pub fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.0.get(key)
    }

    pub fn set(&self, key: &str, blob: &str) -> Result<(), String> {
        self.0.set(key, blob)
    }

    pub fn delete(&self, key: &str) -> Result<(), String> {
        self.0.delete(key)
    }
}

impl Default for SaveStore {
    #[cfg(not(target_arch = "wasm32"))]
    fn default() -> Self {
        Self(Arc::new(FileStore::new(saves_directory())))
    }

    #[cfg(target_arch = "wasm32")]
    fn default() -> Self {
        Self(Arc::new(BrowserStore))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem backend (native)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(target_arch = "wasm32"))]
fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

#[cfg(not(target_arch = "wasm32"))]
pub struct FileStore {
    dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PersistenceGateway for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| format!("Read failed for {}: {}", path.display(), e))
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Could not create saves directory: {}", e))?;
        let path = self.key_path(key);
        // Write to a temp file first, then rename for atomicity.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, blob)
            .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
        fs::rename(&tmp_path, &path).map_err(|e| format!("Rename failed: {}", e))
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Delete failed for {}: {}", path.display(), e)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// localStorage backend (browser)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
pub struct BrowserStore;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    web_sys::window()
        .ok_or_else(|| "no window object".to_string())?
        .local_storage()
        .map_err(|e| format!("localStorage unavailable: {:?}", e))?
        .ok_or_else(|| "localStorage disabled".to_string())
}

#[cfg(target_arch = "wasm32")]
impl PersistenceGateway for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        local_storage()?
            .get_item(key)
            .map_err(|e| format!("localStorage read failed: {:?}", e))
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), String> {
        // Fails with a quota error when the origin's storage is full.
        local_storage()?
            .set_item(key, blob)
            .map_err(|e| format!("localStorage write failed: {:?}", e))
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        local_storage()?
            .remove_item(key)
            .map_err(|e| format!("localStorage delete failed: {:?}", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory backend (tests, storage-failure fallback)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl PersistenceGateway for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| "memory store poisoned".to_string())?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), String> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| "memory store poisoned".to_string())?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), String> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| "memory store poisoned".to_string())?;
        blobs.remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// WALL CLOCK
// ═══════════════════════════════════════════════════════════════════════

/// Milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES & EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Wall-clock anchor of the last durable save (ms since epoch). Offline
/// reconciliation reads it once at load and advances it, so a second
/// reconcile against the same clock grants nothing.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LastSaved(pub u64);

/// Timer resource for automatic saves.
#[derive(Resource)]
pub struct AutosaveTimer(pub Timer);

impl Default for AutosaveTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(AUTOSAVE_SECONDS, TimerMode::Repeating))
    }
}

/// Sent by UI to trigger a manual save.
#[derive(Event, Debug, Clone)]
pub struct SaveRequestEvent;

/// Sent to wipe everything and start a fresh colony.
#[derive(Event, Debug, Clone)]
pub struct NewGameEvent;

/// Sent after a save completes (success or failure).
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Sent after the startup load completes.
#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// SNAPSHOT ↔ RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// Captures the entire session into one flat record. Purely synchronous:
/// the snapshot is complete before the gateway ever sees it.
pub fn build_save_data(
    ledger: &ColonyLedger,
    rates: &ProductionRates,
    unlocks: &ColonyUnlocks,
    shop: &UpgradeShop,
    prestige: &PrestigeState,
    achievements: &Achievements,
    stats: &ColonyStats,
    last_saved_ms: u64,
) -> SaveData {
    SaveData {
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
        upgrade_costs: shop.costs().to_vec(),
        purchase_history: prestige.purchase_history.clone(),
        prestige_points: prestige.points,
        times_prestiged: prestige.times_prestiged,
        unlocked_achievements: achievements.unlocked.clone(),
        elite_unlocked: unlocks.elite_ants,
        auto_larvae: unlocks.auto_larvae,
        auto_ants: unlocks.auto_ants,
        total_seeds_earned: stats.total_seeds_earned,
        total_larvae_spawned: stats.total_larvae_spawned,
        enemies_defeated: stats.enemies_defeated,
        last_saved_ms,
    }
}

fn restored_pool(amount: f64, cap: f64) -> Pool {
    // Saves are floored/clamped at write time, but a hand-edited blob must
    // not be allowed to violate the pool invariant.
    let cap = cap.max(1.0);
    Pool::new(amount.clamp(0.0, cap), cap)
}

/// Writes a fully-migrated record into the live resources.
pub fn apply_save_data(
    data: &SaveData,
    ledger: &mut ColonyLedger,
    rates: &mut ProductionRates,
    unlocks: &mut ColonyUnlocks,
    shop: &mut UpgradeShop,
    prestige: &mut PrestigeState,
    achievements: &mut Achievements,
    stats: &mut ColonyStats,
) {
    *ledger = ColonyLedger {
        seeds: restored_pool(data.seeds, data.seed_cap),
        larvae: restored_pool(data.larvae, data.larvae_cap),
        ants: restored_pool(data.ants, data.ant_cap),
        queens: restored_pool(data.queens, data.queen_cap),
        elite_ants: restored_pool(data.elite_ants, data.elite_ant_cap),
    };
    *rates = ProductionRates {
        larvae_per_queen_per_min: data.larvae_per_queen_per_min,
        seeds_per_ant_per_min: data.seeds_per_ant_per_min,
        elite_forage_multiplier: data.elite_forage_multiplier,
        larva_seed_cost: data.larva_seed_cost,
        ant_larva_cost: data.ant_larva_cost,
        ant_seed_cost: data.ant_seed_cost,
        queen_ant_cost: data.queen_ant_cost,
        elite_ant_larva_cost: data.elite_ant_larva_cost,
        elite_ant_seed_cost: data.elite_ant_seed_cost,
    };
    *unlocks = ColonyUnlocks {
        elite_ants: data.elite_unlocked,
        auto_larvae: data.auto_larvae,
        auto_ants: data.auto_ants,
    };
    *shop = UpgradeShop::default();
    shop.restore_costs(&data.upgrade_costs);
    *prestige = PrestigeState {
        points: data.prestige_points,
        times_prestiged: data.times_prestiged,
        purchase_history: data.purchase_history.clone(),
    };
    achievements.unlocked = data.unlocked_achievements.clone();
    *stats = ColonyStats {
        total_seeds_earned: data.total_seeds_earned,
        total_larvae_spawned: data.total_larvae_spawned,
        enemies_defeated: data.enemies_defeated,
    };
}

/// Serializes and persists the whole session under [`SAVE_KEY`].
pub fn write_save(
    store: &SaveStore,
    ledger: &ColonyLedger,
    rates: &ProductionRates,
    unlocks: &ColonyUnlocks,
    shop: &UpgradeShop,
    prestige: &PrestigeState,
    achievements: &Achievements,
    stats: &ColonyStats,
    last_saved_ms: u64,
) -> Result<(), String> {
    let data = build_save_data(
        ledger,
        rates,
        unlocks,
        shop,
        prestige,
        achievements,
        stats,
        last_saved_ms,
    );
    let blob =
        serde_json::to_string(&data).map_err(|e| format!("Serialization failed: {}", e))?;
    store.set(SAVE_KEY, &blob)
}

// ═══════════════════════════════════════════════════════════════════════
// MIGRATION
// ═══════════════════════════════════════════════════════════════════════

/// Parses a raw blob and migrates it to the current schema in one step,
/// before any component reads a field. Version 0 saves predate the elite
/// tier, automation flags, and lifetime stats; every field a blob is
/// missing takes the current default, so the returned record is always
/// fully populated.
pub fn migrate_save(blob: &str) -> Result<SaveData, String> {
    let raw: Value =
        serde_json::from_str(blob).map_err(|e| format!("Save blob is not JSON: {}", e))?;
    let Value::Object(mut root) = raw else {
        return Err("Save blob is not a JSON object".to_string());
    };

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    if version > SAVE_VERSION {
        warn!(
            "[Save] Blob has version {} but this build understands {}. Attempting to load anyway.",
            version, SAVE_VERSION
        );
    }

    let defaults = serde_json::to_value(SaveData::default())
        .map_err(|e| format!("Default serialization failed: {}", e))?;
    if let Value::Object(default_fields) = defaults {
        for (key, value) in default_fields {
            root.entry(key).or_insert(value);
        }
    }
    root.insert("version".to_string(), Value::from(SAVE_VERSION));

    serde_json::from_value(Value::Object(root))
        .map_err(|e| format!("Deserialization failed: {}", e))
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Startup: fetch, migrate, apply, reconcile offline time, then enter
/// `Running`. Storage failures and corrupted blobs degrade to a fresh
/// in-memory colony — the simulation never refuses to start.
pub fn load_session(
    store: Res<SaveStore>,
    mut ledger: ResMut<ColonyLedger>,
    mut rates: ResMut<ProductionRates>,
    mut unlocks: ResMut<ColonyUnlocks>,
    mut shop: ResMut<UpgradeShop>,
    mut prestige: ResMut<PrestigeState>,
    mut achievements: ResMut<Achievements>,
    mut stats: ResMut<ColonyStats>,
    mut last_saved: ResMut<LastSaved>,
    mut next_state: ResMut<NextState<GameState>>,
    mut notify: EventWriter<NotificationEvent>,
    mut complete: EventWriter<LoadCompleteEvent>,
) {
    let now = now_millis();
    let mut loaded = false;

    match store.get(SAVE_KEY) {
        Ok(Some(blob)) => match migrate_save(&blob) {
            Ok(data) => {
                apply_save_data(
                    &data,
                    &mut ledger,
                    &mut rates,
                    &mut unlocks,
                    &mut shop,
                    &mut prestige,
                    &mut achievements,
                    &mut stats,
                );
                last_saved.0 = data.last_saved_ms;
                let gains = offline::reconcile(now, &mut last_saved, &mut ledger, &rates);
                if gains.larvae_granted > 0.0 || gains.seeds_granted > 0.0 {
                    info!(
                        "[Save] Offline gains: {} larvae, {} seeds.",
                        gains.larvae_granted, gains.seeds_granted
                    );
                    notify.send(NotificationEvent::new(format!(
                        "While you were away: +{} larvae, +{} seeds.",
                        gains.larvae_granted, gains.seeds_granted
                    )));
                }
                info!("[Save] Colony restored.");
                loaded = true;
                complete.send(LoadCompleteEvent {
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                error!("[Save] Discarding unreadable save: {}", e);
                complete.send(LoadCompleteEvent {
                    success: false,
                    error_message: Some(e),
                });
            }
        },
        Ok(None) => {
            info!("[Save] No save found — founding a fresh colony.");
        }
        Err(e) => {
            error!(
                "[Save] Storage unavailable ({}). Continuing with in-memory state only.",
                e
            );
        }
    }

    if !loaded {
        last_saved.0 = now;
    }
    next_state.set(GameState::Running);
}

/// Shared save path for the autosave timer and manual requests.
fn persist_now(
    store: &SaveStore,
    ledger: &ColonyLedger,
    rates: &ProductionRates,
    unlocks: &ColonyUnlocks,
    shop: &UpgradeShop,
    prestige: &PrestigeState,
    achievements: &Achievements,
    stats: &ColonyStats,
    last_saved: &mut LastSaved,
    complete: &mut EventWriter<SaveCompleteEvent>,
) {
    let now = now_millis();
    match write_save(
        store,
        ledger,
        rates,
        unlocks,
        shop,
        prestige,
        achievements,
        stats,
        now,
    ) {
        Ok(()) => {
            last_saved.0 = now;
            info!("[Save] Colony saved.");
            complete.send(SaveCompleteEvent {
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            error!(
                "[Save] Save failed ({}). Progress stays in memory until the next attempt.",
                e
            );
            complete.send(SaveCompleteEvent {
                success: false,
                error_message: Some(e),
            });
        }
    }
}

/// Automatic save on a fixed interval.
pub fn autosave(
    time: Res<Time>,
    mut timer: ResMut<AutosaveTimer>,
    store: Res<SaveStore>,
    ledger: Res<ColonyLedger>,
    rates: Res<ProductionRates>,
    unlocks: Res<ColonyUnlocks>,
    shop: Res<UpgradeShop>,
    prestige: Res<PrestigeState>,
    achievements: Res<Achievements>,
    stats: Res<ColonyStats>,
    mut last_saved: ResMut<LastSaved>,
    mut complete: EventWriter<SaveCompleteEvent>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    info!("[Save] Autosave triggered.");
    persist_now(
        &store,
        &ledger,
        &rates,
        &unlocks,
        &shop,
        &prestige,
        &achievements,
        &stats,
        &mut last_saved,
        &mut complete,
    );
}

/// Manual save requests from the UI. Resets the autosave timer to avoid
/// back-to-back saves.
pub fn handle_save_request(
    mut events: EventReader<SaveRequestEvent>,
    mut timer: ResMut<AutosaveTimer>,
    store: Res<SaveStore>,
    ledger: Res<ColonyLedger>,
    rates: Res<ProductionRates>,
    unlocks: Res<ColonyUnlocks>,
    shop: Res<UpgradeShop>,
    prestige: Res<PrestigeState>,
    achievements: Res<Achievements>,
    stats: Res<ColonyStats>,
    mut last_saved: ResMut<LastSaved>,
    mut complete: EventWriter<SaveCompleteEvent>,
) {
    if events.read().count() == 0 {
        return;
    }
    timer.0.reset();
    persist_now(
        &store,
        &ledger,
        &rates,
        &unlocks,
        &shop,
        &prestige,
        &achievements,
        &stats,
        &mut last_saved,
        &mut complete,
    );
}

/// Wipes everything — pools, upgrades, prestige, achievements, stats, and
/// the durable save — and starts over.
pub fn handle_new_game(
    mut events: EventReader<NewGameEvent>,
    store: Res<SaveStore>,
    mut ledger: ResMut<ColonyLedger>,
    mut rates: ResMut<ProductionRates>,
    mut unlocks: ResMut<ColonyUnlocks>,
    mut shop: ResMut<UpgradeShop>,
    mut prestige: ResMut<PrestigeState>,
    mut achievements: ResMut<Achievements>,
    mut stats: ResMut<ColonyStats>,
    mut last_saved: ResMut<LastSaved>,
    mut notify: EventWriter<NotificationEvent>,
) {
    if events.read().count() == 0 {
        return;
    }
    *ledger = ColonyLedger::default();
    *rates = ProductionRates::default();
    *unlocks = ColonyUnlocks::default();
    shop.reset_costs();
    *prestige = PrestigeState::default();
    *achievements = Achievements::default();
    *stats = ColonyStats::default();
    last_saved.0 = now_millis();
    if let Err(e) = store.delete(SAVE_KEY) {
        error!("[Save] Could not delete the old save: {}", e);
    }
    info!("[Save] New colony founded.");
    notify.send(NotificationEvent::new("A new colony is founded."));
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveStore>()
            .init_resource::<LastSaved>()
            .init_resource::<AutosaveTimer>()
            // Events emitted/received by this plugin
            .add_event::<SaveRequestEvent>()
            .add_event::<NewGameEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            // Startup: restore the previous session exactly once.
            .add_systems(Startup, load_session)
            // Autosave only while the simulation runs.
            .add_systems(Update, autosave.run_if(in_state(GameState::Running)))
            // Manual saves and resets also work from the pause screen.
            .add_systems(
                Update,
                (handle_save_request, handle_new_game)
                    .run_if(in_state(GameState::Running).or(in_state(GameState::Paused))),
            );

        info!("[Save] SavePlugin registered.");
    }
}
