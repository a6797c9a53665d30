//! Interact-button economy: shop slots, chests, fountains and weapon racks.

use delve_logic::graph::RoomNode;
use delve_logic::math::Vec2;
use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use super::loot::{chest_contents, drop_pickups};
use super::Feedback;
use crate::components::{Body, Pickup, PickupKind};
use crate::config::Tuning;
use crate::events::{Effect, MSG_FOUNTAIN_DRY, MSG_NO_COINS, MSG_RACK_EMPTY};
use crate::items::{ShopOffer, WeaponId};
use crate::player::Player;
use crate::room::{room_center, Fixture};

/// Damage bonus granted by a rack when every weapon is already owned.
pub const RACK_DAMAGE_BONUS: f32 = 1.15;

/// What the interact button would act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interactable {
    Slot(Entity, ShopOffer),
    Chest(Entity),
    Fixture(Fixture),
}

/// Closest interactable within `interact_range` of the player.
pub fn nearest_interactable(world: &World, player: &Player, fixture: Option<Fixture>, range: f32) -> Option<Interactable> {
    let pos = player.body.pos;
    let mut best: Option<(f32, Interactable)> = None;
    let mut consider = |dist: f32, target: Interactable| {
        if dist <= range && best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, target));
        }
    };

    for (entity, (body, pickup)) in world.query::<(&Body, &Pickup)>().iter() {
        let target = match pickup.kind {
            PickupKind::ShopSlot(offer) => Interactable::Slot(entity, offer),
            PickupKind::Chest => Interactable::Chest(entity),
            _ => continue,
        };
        consider(body.pos.distance(&pos), target);
    }
    if let Some(f) = fixture {
        consider(room_center().distance(&pos), Interactable::Fixture(f));
    }
    best.map(|(_, target)| target)
}

fn apply_offer(player: &mut Player, offer: ShopOffer) {
    match offer {
        ShopOffer::Heart => player.heal(2.0),
        ShopOffer::Key => player.keys += 1,
        ShopOffer::Item(item) => player.take_item(item),
        ShopOffer::Weapon(id) => {
            if !player.give_weapon(id) {
                player.passives.damage_mult *= RACK_DAMAGE_BONUS;
            }
        }
    }
}

fn buy(world: &mut World, player: &mut Player, slot: Entity, offer: ShopOffer, fb: &mut Feedback) {
    let price = offer.price();
    if player.coins < price {
        fb.say(MSG_NO_COINS);
        return;
    }
    if world.despawn(slot).is_err() {
        return;
    }
    player.coins -= price;
    apply_offer(player, offer);
    log::debug!("Bought {} for {}", offer.label(), price);
    fb.emit(Effect::Purchased(offer));
}

fn open_chest(world: &mut World, player: &Player, chest: Entity, rng: &mut impl Rng, fb: &mut Feedback) {
    let pos = match world.get::<&Body>(chest) {
        Ok(body) => body.pos,
        Err(_) => return,
    };
    if world.despawn(chest).is_err() {
        return;
    }
    let contents = chest_contents(rng, player.passives.luck);
    drop_pickups(world, &contents, pos);
    fb.emit(Effect::PickedUp(PickupKind::Chest));
}

fn use_fountain(player: &mut Player, node: &mut RoomNode, fb: &mut Feedback) {
    if node.flags.fountain_used {
        fb.say(MSG_FOUNTAIN_DRY);
        return;
    }
    node.flags.fountain_used = true;
    player.hp = player.hp_max;
}

fn use_rack(player: &mut Player, node: &mut RoomNode, rng: &mut impl Rng, fb: &mut Feedback) {
    if node.flags.armory_used {
        fb.say(MSG_RACK_EMPTY);
        return;
    }
    node.flags.armory_used = true;
    let unowned: Vec<WeaponId> = WeaponId::all()
        .iter()
        .copied()
        .filter(|w| !player.has_weapon(*w))
        .collect();
    match unowned.choose(rng) {
        Some(id) => {
            player.give_weapon(*id);
            fb.emit(Effect::PickedUp(PickupKind::Weapon(*id)));
        }
        None => player.passives.damage_mult *= RACK_DAMAGE_BONUS,
    }
}

/// Resolve one interact press. Failures leave state untouched and set a message.
pub fn interaction_system(
    world: &mut World,
    player: &mut Player,
    node: &mut RoomNode,
    fixture: Option<Fixture>,
    tuning: &Tuning,
    rng: &mut impl Rng,
    fb: &mut Feedback,
) {
    let Some(target) = nearest_interactable(world, player, fixture, tuning.world.interact_range) else {
        return;
    };
    match target {
        Interactable::Slot(entity, offer) => buy(world, player, entity, offer, fb),
        Interactable::Chest(entity) => open_chest(world, player, entity, rng, fb),
        Interactable::Fixture(Fixture::Fountain) => use_fountain(player, node, fb),
        Interactable::Fixture(Fixture::WeaponRack) => use_rack(player, node, rng, fb),
    }
}
