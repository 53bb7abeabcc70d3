//! Upgrade purchasing — the core buy / buy-max flow.
//!
//! Every failure (locked, already owned, unaffordable) is an outcome, not
//! an error: nothing is deducted, `false` comes back, and the player gets
//! a notification explaining the denial.

use bevy::prelude::*;

use super::upgrades::{apply_effect, is_unlocked, upgrade_def, EffectTargets, UpgradeShop};
use crate::shared::*;

// ─────────────────────────────────────────────────────────────────────────────
// Events (internal — used to drive purchases from UI input)
// ─────────────────────────────────────────────────────────────────────────────

/// Fired by the UI when the player confirms a single purchase.
#[derive(Event, Debug, Clone)]
pub struct BuyUpgradeEvent {
    pub kind: UpgradeKind,
}

/// Fired by the UI when the player holds the buy-max button.
#[derive(Event, Debug, Clone)]
pub struct BuyMaxUpgradeEvent {
    pub kind: UpgradeKind,
}

// ─────────────────────────────────────────────────────────────────────────────
// Purchase flow
// ─────────────────────────────────────────────────────────────────────────────

/// Attempts one purchase. On success the price is deducted, the purchase
/// is appended to the permanent history, the shop price compounds (and is
/// floored), and the effect is applied exactly once.
pub fn buy(
    kind: UpgradeKind,
    shop: &mut UpgradeShop,
    prestige: &mut PrestigeState,
    targets: &mut EffectTargets<'_>,
) -> bool {
    let def = upgrade_def(kind);
    if !is_unlocked(kind, prestige, targets.unlocks) {
        return false;
    }
    if def.one_time && prestige.purchase_history.contains(&kind) {
        return false;
    }

    let cost = shop.cost(kind);
    let paid = match def.category {
        UpgradeCategory::Colony | UpgradeCategory::Elite => {
            targets.ledger.spend(&[(PoolKind::Seeds, cost)])
        }
        UpgradeCategory::Prestige => {
            let points_cost = cost as u64;
            if prestige.points >= points_cost {
                prestige.points -= points_cost;
                true
            } else {
                false
            }
        }
    };
    if !paid {
        return false;
    }

    prestige.purchase_history.push(kind);
    shop.set_cost(kind, (cost * def.cost_growth).floor());
    apply_effect(kind, targets, false);
    true
}

/// Repeats [`buy`] while it keeps succeeding, compounding the price each
/// iteration and stopping the instant affordability fails. Zero purchases
/// is a valid, successful outcome.
pub fn buy_max(
    kind: UpgradeKind,
    shop: &mut UpgradeShop,
    prestige: &mut PrestigeState,
    targets: &mut EffectTargets<'_>,
) -> u32 {
    let mut purchases = 0;
    while buy(kind, shop, prestige, targets) {
        purchases += 1;
    }
    purchases
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// Processes single-purchase requests from the UI.
pub fn handle_buy_upgrade(
    mut events: EventReader<BuyUpgradeEvent>,
    mut shop: ResMut<UpgradeShop>,
    mut prestige: ResMut<PrestigeState>,
    mut ledger: ResMut<ColonyLedger>,
    mut rates: ResMut<ProductionRates>,
    mut unlocks: ResMut<ColonyUnlocks>,
    mut notify: EventWriter<NotificationEvent>,
) {
    for ev in events.read() {
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        if buy(ev.kind, &mut shop, &mut prestige, &mut targets) {
            info!(
                "[Economy] Bought {:?}. Next price: {}",
                ev.kind,
                shop.cost(ev.kind)
            );
        } else {
            info!("[Economy] Purchase of {:?} denied.", ev.kind);
            notify.send(NotificationEvent::new(format!(
                "Cannot buy {} right now.",
                upgrade_def(ev.kind).name
            )));
        }
    }
}

/// Processes buy-max requests. Buying nothing is not a failure — the
/// player simply could not afford a single level.
pub fn handle_buy_max_upgrade(
    mut events: EventReader<BuyMaxUpgradeEvent>,
    mut shop: ResMut<UpgradeShop>,
    mut prestige: ResMut<PrestigeState>,
    mut ledger: ResMut<ColonyLedger>,
    mut rates: ResMut<ProductionRates>,
    mut unlocks: ResMut<ColonyUnlocks>,
) {
    for ev in events.read() {
        let mut targets = EffectTargets {
            ledger: &mut ledger,
            rates: &mut rates,
            unlocks: &mut unlocks,
        };
        let purchases = buy_max(ev.kind, &mut shop, &mut prestige, &mut targets);
        info!(
            "[Economy] Buy-max {:?}: {} purchase(s), next price {}",
            ev.kind,
            purchases,
            shop.cost(ev.kind)
        );
    }
}
