//! Loot rolls: enemy drops, boss drops, room-clear rewards and chests.

use delve_logic::graph::RoomKind;
use delve_logic::math::Vec2;
use hecs::World;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::PickupKind;
use crate::config::LootTuning;
use crate::items::{ItemId, WeaponId};
use crate::spawn::spawn_pickup;

/// Bernoulli trial with `p` clamped to `[0, 1]`; NaN never succeeds.
pub fn chance(rng: &mut impl Rng, p: f32) -> bool {
    if !(p > 0.0) {
        return false;
    }
    rng.gen_bool(p.min(1.0) as f64)
}

pub fn random_item(rng: &mut impl Rng) -> ItemId {
    *ItemId::all().choose(rng).unwrap_or(&ItemId::Whetstone)
}

/// Any weapon but the starting pistol.
pub fn random_weapon(rng: &mut impl Rng) -> WeaponId {
    let pool = &WeaponId::all()[1..];
    *pool.choose(rng).unwrap_or(&WeaponId::Shotgun)
}

/// Independent drop rolls for a regular enemy.
pub fn roll_drops(rng: &mut impl Rng, loot: &LootTuning, elite: bool, luck: f32) -> Vec<PickupKind> {
    let rare = if elite { loot.elite_rare_mult } else { 1.0 };
    let mut drops = Vec::new();
    if chance(rng, loot.coin_chance + luck) {
        drops.push(PickupKind::Coin);
    }
    if chance(rng, loot.heart_chance + luck) {
        drops.push(PickupKind::Heart);
    }
    if chance(rng, loot.item_chance * rare + luck) {
        drops.push(PickupKind::Item(random_item(rng)));
    }
    if chance(rng, loot.weapon_chance * rare + luck) {
        drops.push(PickupKind::Weapon(random_weapon(rng)));
    }
    drops
}

/// A boss always leaves the way down and one item.
pub fn boss_drops(rng: &mut impl Rng) -> Vec<PickupKind> {
    vec![PickupKind::Portal, PickupKind::Item(random_item(rng))]
}

/// Reward spawned at the room center when a room is cleared.
pub fn clear_reward(kind: RoomKind, rng: &mut impl Rng, loot: &LootTuning) -> Vec<PickupKind> {
    match kind {
        RoomKind::Key => vec![PickupKind::Key],
        RoomKind::Elite => vec![PickupKind::Chest],
        RoomKind::Combat if chance(rng, loot.clear_coin_chance) => {
            let n = rng.gen_range(3..=5);
            vec![PickupKind::Coin; n]
        }
        _ => Vec::new(),
    }
}

/// What spills out of an opened chest.
pub fn chest_contents(rng: &mut impl Rng, luck: f32) -> Vec<PickupKind> {
    let n = rng.gen_range(3..=5);
    let mut out = vec![PickupKind::Coin; n];
    if chance(rng, 0.5 + luck) {
        out.push(PickupKind::Item(random_item(rng)));
    } else {
        out.push(PickupKind::Heart);
    }
    out
}

/// Position `i` of `n` on a small ring around `center`.
pub fn scatter(center: Vec2, i: usize, n: usize) -> Vec2 {
    if n <= 1 {
        return center;
    }
    let angle = std::f32::consts::TAU * i as f32 / n as f32;
    center + Vec2::from_angle(angle) * 14.0
}

pub fn drop_pickups(world: &mut World, kinds: &[PickupKind], center: Vec2) {
    for (i, kind) in kinds.iter().enumerate() {
        spawn_pickup(world, *kind, scatter(center, i, kinds.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn certain_and_impossible_rolls() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(chance(&mut rng, 1.5));
        assert!(!chance(&mut rng, 0.0));
        assert!(!chance(&mut rng, -1.0));
        assert!(!chance(&mut rng, f32::NAN));
    }

    #[test]
    fn full_luck_drops_everything() {
        let mut rng = StdRng::seed_from_u64(4);
        let drops = roll_drops(&mut rng, &LootTuning::default(), false, 1.0);
        assert_eq!(drops.len(), 4);
    }

    #[test]
    fn drop_rates_roughly_match_tuning() {
        let mut rng = StdRng::seed_from_u64(8);
        let loot = LootTuning::default();
        let coins = (0..4000)
            .filter(|_| roll_drops(&mut rng, &loot, false, 0.0).contains(&PickupKind::Coin))
            .count();
        let rate = coins as f32 / 4000.0;
        assert!((rate - loot.coin_chance).abs() < 0.05, "coin rate {rate}");
    }

    #[test]
    fn boss_always_drops_portal() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10 {
            let d = boss_drops(&mut rng);
            assert_eq!(d[0], PickupKind::Portal);
            assert!(matches!(d[1], PickupKind::Item(_)));
        }
    }

    #[test]
    fn clear_rewards_by_kind() {
        let mut rng = StdRng::seed_from_u64(3);
        let loot = LootTuning::default();
        assert_eq!(clear_reward(RoomKind::Key, &mut rng, &loot), vec![PickupKind::Key]);
        assert_eq!(clear_reward(RoomKind::Elite, &mut rng, &loot), vec![PickupKind::Chest]);
        assert!(clear_reward(RoomKind::Shop, &mut rng, &loot).is_empty());
    }

    #[test]
    fn random_weapon_is_never_the_pistol() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_ne!(random_weapon(&mut rng), WeaponId::Pistol);
        }
    }
}
