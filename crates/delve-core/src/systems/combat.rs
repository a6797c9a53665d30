//! Damage resolution: enemies, the player, contact hits, hazards, deaths.

use delve_logic::collision::Solids;
use delve_logic::math::Vec2;
use delve_logic::tiles::TileKind;
use hecs::{Entity, World};
use rand::Rng;

use super::loot::{boss_drops, drop_pickups, roll_drops};
use super::Feedback;
use crate::components::{Archetype, Body, DecalKind, Enemy, Knockback};
use crate::config::Tuning;
use crate::events::Effect;
use crate::player::Player;
use crate::spawn::spawn_decal;

/// Damage one enemy through its armor. Returns the damage actually dealt;
/// enemies already at zero hp take nothing.
pub fn damage_enemy(world: &mut World, target: Entity, amount: f32, knock_dir: Vec2, tuning: &Tuning) -> f32 {
    let (dealt, knockable) = match world.get::<&mut Enemy>(target) {
        Ok(mut enemy) => {
            if !enemy.is_alive() || amount <= 0.0 {
                return 0.0;
            }
            let dealt = amount * (1.0 - enemy.armor.clamp(0.0, 1.0));
            enemy.hp -= dealt;
            (dealt, enemy.archetype.knockable())
        }
        Err(_) => return 0.0,
    };
    if knockable && knock_dir.length_squared() > 0.0 {
        if let Ok(mut kb) = world.get::<&mut Knockback>(target) {
            let c = &tuning.combat;
            kb.push(knock_dir.normalize() * c.knockback_speed, c.knockback_time);
        }
    }
    dealt
}

/// Player-sourced damage: applies life steal on whatever lands.
pub fn strike(world: &mut World, player: &mut Player, target: Entity, amount: f32, knock_dir: Vec2, tuning: &Tuning) -> f32 {
    let dealt = damage_enemy(world, target, amount, knock_dir, tuning);
    if dealt > 0.0 && player.passives.life_steal > 0.0 {
        player.heal(player.passives.life_steal * dealt);
    }
    dealt
}

/// Hurt the player. Returns true if the hit landed.
pub fn hurt_player(player: &mut Player, amount: f32, tuning: &Tuning, fb: &mut Feedback) -> bool {
    match player.take_damage(amount, &tuning.player) {
        Some(taken) => {
            fb.emit(Effect::PlayerHurt { amount: taken });
            fb.shake(6.0);
            true
        }
        None => false,
    }
}

/// Enemies touching the player deal contact damage; thorns reflect part of it.
pub fn contact_system(world: &mut World, player: &mut Player, tuning: &Tuning, fb: &mut Feedback) {
    let touching: Vec<(Entity, Vec2, f32)> = world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(_, (body, enemy))| enemy.is_alive() && body.touches(&player.body))
        .map(|(e, (body, enemy))| (e, body.pos, enemy.contact_damage))
        .collect();

    for (entity, pos, damage) in touching {
        if !hurt_player(player, damage, tuning, fb) {
            continue;
        }
        let away = (player.body.pos - pos).normalize();
        player
            .knockback
            .push(away * tuning.combat.contact_knockback, tuning.combat.knockback_time);
        if player.passives.thorns > 0.0 {
            damage_enemy(world, entity, player.passives.thorns * damage, -away, tuning);
        }
    }
}

/// Standing on spikes hurts.
pub fn hazard_system(player: &mut Player, solids: &Solids, tuning: &Tuning, fb: &mut Feedback) {
    if player.is_dashing() {
        return;
    }
    if solids.tile_at(player.body.pos) == TileKind::Hazard {
        hurt_player(player, tuning.player.hazard_damage, tuning, fb);
    }
}

fn kill_score(enemy: &Enemy) -> u64 {
    if enemy.archetype == Archetype::Boss {
        250
    } else if enemy.minion {
        2
    } else if enemy.elite {
        25
    } else {
        10
    }
}

/// Remove every enemy at or below zero hp, exactly once each, and roll its loot.
pub fn death_system(world: &mut World, player: &Player, tuning: &Tuning, rng: &mut impl Rng, fb: &mut Feedback) {
    let dead: Vec<(Entity, Vec2, Enemy)> = world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(_, (_, enemy))| !enemy.is_alive())
        .map(|(e, (body, enemy))| (e, body.pos, enemy.clone()))
        .collect();

    for (entity, pos, enemy) in dead {
        if world.despawn(entity).is_err() {
            continue;
        }
        fb.kills += 1;
        fb.score += kill_score(&enemy);
        fb.emit(Effect::EnemyKilled {
            pos,
            archetype: enemy.archetype,
            elite: enemy.elite,
        });
        spawn_decal(world, pos, 10.0, DecalKind::Splat, tuning.world.decal_cap);

        let drops = if enemy.archetype == Archetype::Boss {
            boss_drops(rng)
        } else if enemy.minion {
            Vec::new()
        } else {
            roll_drops(rng, &tuning.loot, enemy.elite, player.passives.luck)
        };
        drop_pickups(world, &drops, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Pickup, StatusEffects};
    use crate::spawn::spawn_enemy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (World, Player, Tuning, StdRng) {
        let t = Tuning::default();
        let p = Player::new(&t.player, Vec2::new(200.0, 160.0));
        (World::new(), p, t, StdRng::seed_from_u64(7))
    }

    #[test]
    fn armor_reduces_damage() {
        let (mut w, _, t, mut rng) = setup();
        let e = spawn_enemy(&mut w, Archetype::Shooter, true, Vec2::new(50.0, 50.0), 0, &t, &mut rng);
        let hp = w.get::<&Enemy>(e).unwrap().hp;
        let dealt = damage_enemy(&mut w, e, 10.0, Vec2::ZERO, &t);
        assert!((dealt - 8.0).abs() < 1e-5);
        assert!((w.get::<&Enemy>(e).unwrap().hp - (hp - 8.0)).abs() < 1e-4);
    }

    #[test]
    fn dead_enemies_take_no_more_damage() {
        let (mut w, _, t, mut rng) = setup();
        let e = spawn_enemy(&mut w, Archetype::Chaser, false, Vec2::new(50.0, 50.0), 0, &t, &mut rng);
        w.get::<&mut Enemy>(e).unwrap().hp = 0.0;
        assert_eq!(damage_enemy(&mut w, e, 5.0, Vec2::ZERO, &t), 0.0);
    }

    #[test]
    fn life_steal_heals_by_share_of_damage() {
        let (mut w, mut p, t, mut rng) = setup();
        p.hp = 2.0;
        p.passives.life_steal = 0.1;
        let e = spawn_enemy(&mut w, Archetype::Chaser, false, Vec2::new(50.0, 50.0), 0, &t, &mut rng);
        strike(&mut w, &mut p, e, 5.0, Vec2::new(1.0, 0.0), &t);
        assert!((p.hp - 2.5).abs() < 1e-5);
    }

    #[test]
    fn knockback_is_applied_to_knockable_enemies() {
        let (mut w, _, t, mut rng) = setup();
        let chaser = spawn_enemy(&mut w, Archetype::Chaser, false, Vec2::new(50.0, 50.0), 0, &t, &mut rng);
        let turret = spawn_enemy(&mut w, Archetype::Turret, false, Vec2::new(90.0, 50.0), 0, &t, &mut rng);
        damage_enemy(&mut w, chaser, 1.0, Vec2::new(1.0, 0.0), &t);
        damage_enemy(&mut w, turret, 1.0, Vec2::new(1.0, 0.0), &t);
        assert!(w.get::<&Knockback>(chaser).unwrap().is_active());
        assert!(!w.get::<&Knockback>(turret).unwrap().is_active());
    }

    #[test]
    fn thorns_reflect_contact_damage() {
        let (mut w, mut p, t, mut rng) = setup();
        p.passives.thorns = 2.0;
        let e = spawn_enemy(&mut w, Archetype::Chaser, false, p.body.pos, 0, &t, &mut rng);
        let before = w.get::<&Enemy>(e).unwrap().hp;
        let mut fb = Feedback::default();
        contact_system(&mut w, &mut p, &t, &mut fb);
        assert_eq!(p.hp, t.player.hp_max - 1.0);
        let after = w.get::<&Enemy>(e).unwrap().hp;
        assert!((before - after - 2.0).abs() < 1e-5);
        assert!(p.knockback.is_active());
    }

    #[test]
    fn contact_respects_invulnerability() {
        let (mut w, mut p, t, mut rng) = setup();
        spawn_enemy(&mut w, Archetype::Chaser, false, p.body.pos, 0, &t, &mut rng);
        spawn_enemy(&mut w, Archetype::Chaser, false, p.body.pos, 0, &t, &mut rng);
        let mut fb = Feedback::default();
        contact_system(&mut w, &mut p, &t, &mut fb);
        assert_eq!(p.hp, t.player.hp_max - 1.0);
        assert_eq!(fb.effects.len(), 1);
    }

    #[test]
    fn each_death_is_processed_once() {
        let (mut w, p, mut t, mut rng) = setup();
        t.loot.coin_chance = 1.0;
        t.loot.heart_chance = 0.0;
        t.loot.item_chance = 0.0;
        t.loot.weapon_chance = 0.0;
        let e = spawn_enemy(&mut w, Archetype::Chaser, false, Vec2::new(80.0, 80.0), 0, &t, &mut rng);
        w.get::<&mut Enemy>(e).unwrap().hp = -3.0;
        let mut fb = Feedback::default();
        death_system(&mut w, &p, &t, &mut rng, &mut fb);
        death_system(&mut w, &p, &t, &mut rng, &mut fb);
        assert_eq!(fb.kills, 1);
        assert_eq!(w.query::<&Pickup>().iter().count(), 1);
        assert_eq!(w.query::<&StatusEffects>().iter().count(), 0);
    }

    #[test]
    fn boss_death_drops_portal() {
        let (mut w, p, t, mut rng) = setup();
        let e = spawn_enemy(&mut w, Archetype::Boss, false, Vec2::new(200.0, 160.0), 0, &t, &mut rng);
        w.get::<&mut Enemy>(e).unwrap().hp = 0.0;
        let mut fb = Feedback::default();
        death_system(&mut w, &p, &t, &mut rng, &mut fb);
        let kinds: Vec<_> = w.query::<&Pickup>().iter().map(|(_, p)| p.kind).collect();
        assert!(kinds.contains(&crate::components::PickupKind::Portal));
    }
}
