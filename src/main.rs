mod shared;
mod colony;
mod economy;
mod prestige;
mod save;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use shared::*;

fn main() {
    App::new()
        // Headless schedule: the simulation core owns no window or GPU.
        // The runner wakes often enough that the fixed-step production
        // clock never falls behind.
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(100))),
        )
        .add_plugins(bevy::log::LogPlugin::default())
        .add_plugins(StatesPlugin)
        // Game state
        .init_state::<GameState>()
        // Shared resources
        .init_resource::<ColonyLedger>()
        .init_resource::<ProductionRates>()
        .init_resource::<ColonyUnlocks>()
        .init_resource::<PrestigeState>()
        .init_resource::<Achievements>()
        .init_resource::<ColonyStats>()
        // Events
        .add_event::<NotificationEvent>()
        .add_event::<AchievementUnlockedEvent>()
        .add_event::<EnemyDefeatedEvent>()
        .add_event::<PrestigeCompletedEvent>()
        // Domain plugins
        .add_plugins(colony::ColonyPlugin)
        .add_plugins(economy::EconomyPlugin)
        .add_plugins(prestige::PrestigePlugin)
        .add_plugins(save::SavePlugin)
        .run();
}
