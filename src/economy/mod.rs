//! Economy domain — upgrade catalog, purchase flow, lifetime stats, and
//! achievements.
//!
//! All cross-domain communication goes through `crate::shared::*` events
//! and resources. Other domains may import the pure helpers re-exported
//! here (`upgrades::apply_effect` for the prestige replay).

use bevy::prelude::*;

use crate::colony::auto_spawn;
use crate::shared::*;

pub mod achievements;
pub mod shop;
pub mod stats;
pub mod upgrades;

use achievements::{check_achievements, notify_achievement_unlocked};
use shop::{handle_buy_max_upgrade, handle_buy_upgrade, BuyMaxUpgradeEvent, BuyUpgradeEvent};
use stats::track_enemy_kills;
use upgrades::UpgradeShop;

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        // ── Resources ──────────────────────────────────────────────────────
        app.init_resource::<UpgradeShop>();

        // ── Internal Events ────────────────────────────────────────────────
        app.add_event::<BuyUpgradeEvent>()
            .add_event::<BuyMaxUpgradeEvent>();

        // ── Systems: Running state ─────────────────────────────────────────
        app.add_systems(
            Update,
            (
                // Purchases arrive from UI input at any time.
                handle_buy_upgrade,
                handle_buy_max_upgrade,
                // Kill reports from the combat collaborator.
                track_enemy_kills,
                // Achievement checks run against the settled post-tick
                // state, after production and auto-creation.
                check_achievements.after(auto_spawn),
                // Surface notifications for fresh unlocks.
                notify_achievement_unlocked.after(check_achievements),
            )
                .run_if(in_state(GameState::Running)),
        );

        info!("[Economy] EconomyPlugin registered.");
    }
}
