//! Walk-over pickups: coin magnet and collection.

use hecs::{Entity, World};

use super::Feedback;
use crate::components::{Body, Pickup, PickupKind};
use crate::config::Tuning;
use crate::events::Effect;
use crate::player::Player;

/// Coins paid out instead of a duplicate weapon.
const DUPLICATE_WEAPON_COINS: u32 = 5;

/// Apply a touched pickup to the player. Returns false if it stays on the
/// floor (a heart at full health).
fn collect(player: &mut Player, pickup: &Pickup, fb: &mut Feedback) -> bool {
    match pickup.kind {
        PickupKind::Coin => player.coins += pickup.value,
        PickupKind::Heart => {
            if player.hp >= player.hp_max {
                return false;
            }
            player.heal(1.0);
        }
        PickupKind::Key => player.keys += 1,
        PickupKind::Item(item) => player.take_item(item),
        PickupKind::Weapon(id) => {
            if !player.give_weapon(id) {
                player.coins += DUPLICATE_WEAPON_COINS;
            }
        }
        PickupKind::Portal => fb.portal = true,
        PickupKind::Chest | PickupKind::ShopSlot(_) => return false,
    }
    true
}

/// Pull nearby coins in, then collect whatever the player is touching.
pub fn pickup_system(world: &mut World, player: &mut Player, tuning: &Tuning, dt: f32, fb: &mut Feedback) {
    let reach = player.passives.pickup_radius;
    let magnet = tuning.loot.magnet_range + reach;
    let me = player.body;

    for (_, (body, pickup)) in world.query_mut::<(&mut Body, &Pickup)>() {
        if pickup.kind != PickupKind::Coin {
            continue;
        }
        let to_player = me.pos - body.pos;
        let dist = to_player.length();
        if dist > 0.0 && dist <= magnet {
            let step = (tuning.loot.magnet_speed * dt).min(dist);
            body.pos = body.pos + to_player.normalize() * step;
        }
    }

    let touched: Vec<(Entity, Pickup)> = world
        .query::<(&Body, &Pickup)>()
        .iter()
        .filter(|(_, (body, pickup))| {
            pickup.kind.is_touch() && body.pos.distance(&me.pos) <= me.radius + body.radius + reach
        })
        .map(|(e, (_, pickup))| (e, *pickup))
        .collect();

    for (entity, pickup) in touched {
        if !collect(player, &pickup, fb) {
            continue;
        }
        if world.despawn(entity).is_ok() {
            fb.emit(Effect::PickedUp(pickup.kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemId, WeaponId};
    use crate::spawn::spawn_pickup;
    use delve_logic::math::Vec2;

    fn setup() -> (World, Player, Tuning) {
        let t = Tuning::default();
        let p = Player::new(&t.player, Vec2::new(200.0, 160.0));
        (World::new(), p, t)
    }

    fn count(w: &World) -> usize {
        w.query::<&Pickup>().iter().count()
    }

    #[test]
    fn coins_are_collected_on_touch() {
        let (mut w, mut p, t) = setup();
        spawn_pickup(&mut w, PickupKind::Coin, p.body.pos + Vec2::new(4.0, 0.0));
        let mut fb = Feedback::default();
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut fb);
        assert_eq!(p.coins, t.player.start_coins + 1);
        assert_eq!(count(&w), 0);
        assert_eq!(fb.effects, vec![Effect::PickedUp(PickupKind::Coin)]);
    }

    #[test]
    fn magnet_pulls_coins_closer() {
        let (mut w, mut p, t) = setup();
        let start = p.body.pos + Vec2::new(t.loot.magnet_range - 5.0, 0.0);
        let coin = spawn_pickup(&mut w, PickupKind::Coin, start);
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert!(w.get::<&Body>(coin).unwrap().pos.x < start.x);
    }

    #[test]
    fn distant_pickups_stay_put() {
        let (mut w, mut p, t) = setup();
        let far = p.body.pos + Vec2::new(t.loot.magnet_range + 60.0, 0.0);
        let coin = spawn_pickup(&mut w, PickupKind::Coin, far);
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert_eq!(w.get::<&Body>(coin).unwrap().pos, far);
    }

    #[test]
    fn hearts_wait_while_health_is_full() {
        let (mut w, mut p, t) = setup();
        spawn_pickup(&mut w, PickupKind::Heart, p.body.pos);
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert_eq!(count(&w), 1);
        p.hp -= 2.0;
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert_eq!(count(&w), 0);
        assert_eq!(p.hp, t.player.hp_max - 1.0);
    }

    #[test]
    fn duplicate_weapon_becomes_coins() {
        let (mut w, mut p, t) = setup();
        spawn_pickup(&mut w, PickupKind::Weapon(WeaponId::Pistol), p.body.pos);
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert_eq!(p.weapons.len(), 1);
        assert_eq!(p.coins, t.player.start_coins + DUPLICATE_WEAPON_COINS);
    }

    #[test]
    fn items_keys_and_portal() {
        let (mut w, mut p, t) = setup();
        spawn_pickup(&mut w, PickupKind::Item(ItemId::Whetstone), p.body.pos);
        spawn_pickup(&mut w, PickupKind::Key, p.body.pos);
        spawn_pickup(&mut w, PickupKind::Portal, p.body.pos);
        let mut fb = Feedback::default();
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut fb);
        assert_eq!(p.items, vec![ItemId::Whetstone]);
        assert_eq!(p.keys, t.player.start_keys + 1);
        assert!(fb.portal);
    }

    #[test]
    fn chests_and_shop_slots_need_interaction() {
        let (mut w, mut p, t) = setup();
        spawn_pickup(&mut w, PickupKind::Chest, p.body.pos);
        spawn_pickup(&mut w, PickupKind::ShopSlot(crate::items::ShopOffer::Key), p.body.pos);
        pickup_system(&mut w, &mut p, &t, 1.0 / 60.0, &mut Feedback::default());
        assert_eq!(count(&w), 2);
    }
}
