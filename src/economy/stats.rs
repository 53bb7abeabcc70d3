//! Lifetime counters — passive listeners that feed achievements.

use bevy::prelude::*;

use crate::shared::*;

/// Accumulates kill reports from the (external) combat collaborator.
pub fn track_enemy_kills(
    mut events: EventReader<EnemyDefeatedEvent>,
    mut stats: ResMut<ColonyStats>,
) {
    for ev in events.read() {
        stats.enemies_defeated = stats.enemies_defeated.saturating_add(ev.count as u64);
    }
}
