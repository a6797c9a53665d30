//! Enemy AI - movement and firing per archetype.
//!
//! Two passes, as the borrow rules require: first read every enemy and
//! compute its new state plus the bullets and minions it wants to spawn,
//! then write the results back and spawn.

use std::f32::consts::TAU;

use delve_logic::collision::{move_and_collide, Layer, Solids};
use delve_logic::math::Vec2;
use hecs::{Entity, World};

use crate::components::*;
use crate::config::{CombatTuning, Tuning};
use crate::spawn::{enemy_bullet, spawn_bullet, spawn_minion};

/// Distance band around the standoff range where a ranged enemy holds still.
const STANDOFF_SLACK: f32 = 24.0;
const TURRET_SPREAD: f32 = 0.2;
const RADIAL_COUNT: u32 = 12;
const FAN_COUNT: u32 = 5;
const FAN_SPREAD: f32 = 0.6;
const SPIRAL_COUNT: u32 = 8;
const SPIRAL_STEP: f32 = 0.35;
const SHELL_SPEED_FACTOR: f32 = 0.55;
const SHELL_RADIUS: f32 = 40.0;

/// Boss phase implied by an hp fraction: one per threshold crossed.
pub fn boss_phase_for(hp_fraction: f32, thresholds: &[f32]) -> u8 {
    thresholds.iter().filter(|t| hp_fraction <= **t).count() as u8
}

/// Movement direction for the archetype, not yet scaled by speed.
fn desired_direction(enemy: &Enemy, pos: Vec2, target: Vec2) -> Vec2 {
    let to_player = target - pos;
    let dist = to_player.length();
    let toward = to_player.normalize();
    let keep_distance = || {
        if dist > enemy.standoff + STANDOFF_SLACK {
            toward
        } else if dist < enemy.standoff - STANDOFF_SLACK {
            -toward
        } else {
            Vec2::ZERO
        }
    };
    match enemy.archetype {
        Archetype::Chaser => toward,
        Archetype::Turret => Vec2::ZERO,
        Archetype::Shooter | Archetype::Lobber | Archetype::Boss => keep_distance(),
        Archetype::Orbiter => (keep_distance() + toward.perp() * enemy.orbit_dir).normalize(),
    }
}

/// Bullets for one volley. Boss patterns depend on the phase at fire time.
fn volley(enemy: &Enemy, pos: Vec2, target: Vec2, tuning: &Tuning) -> Vec<(Body, Bullet)> {
    let speed = tuning.enemies.bullet_speed;
    let aim = (target - pos).normalize();
    let aim = if aim == Vec2::ZERO { Vec2::new(1.0, 0.0) } else { aim };
    let mut shots = Vec::new();
    match enemy.archetype {
        Archetype::Chaser => {}
        Archetype::Shooter | Archetype::Orbiter => {
            shots.push(enemy_bullet(pos, aim * speed, 1.0));
        }
        Archetype::Turret => {
            for k in [-1.0, 0.0, 1.0] {
                shots.push(enemy_bullet(pos, aim.rotate(k * TURRET_SPREAD) * speed, 1.0));
            }
        }
        Archetype::Lobber => {
            let shell_speed = speed * SHELL_SPEED_FACTOR;
            let (mut body, mut bullet) = enemy_bullet(pos, aim * shell_speed, 1.0);
            body.radius = 6.0;
            bullet.lifetime = (pos.distance(&target) / shell_speed).clamp(0.3, 2.5);
            bullet.mods.explode_radius = SHELL_RADIUS;
            shots.push((body, bullet));
        }
        Archetype::Boss => match enemy.phase {
            0 => {
                for k in 0..RADIAL_COUNT {
                    let dir = Vec2::from_angle(TAU * k as f32 / RADIAL_COUNT as f32);
                    shots.push(enemy_bullet(pos, dir * speed, 1.0));
                }
            }
            1 => {
                for k in 0..FAN_COUNT {
                    let off = -FAN_SPREAD / 2.0 + FAN_SPREAD * k as f32 / (FAN_COUNT - 1) as f32;
                    shots.push(enemy_bullet(pos, aim.rotate(off) * speed * 1.2, 1.0));
                }
            }
            _ => {
                let base = enemy.volley as f32 * SPIRAL_STEP;
                for k in 0..SPIRAL_COUNT {
                    let dir = Vec2::from_angle(base + TAU * k as f32 / SPIRAL_COUNT as f32);
                    shots.push(enemy_bullet(pos, dir * speed, 1.0));
                }
            }
        },
    }
    shots
}

/// Advance the fire timer. Returns true when a volley is due.
fn ready_to_fire(enemy: &mut Enemy, status: &StatusEffects, combat: &CombatTuning, dt: f32) -> bool {
    if enemy.fire_interval <= 0.0 {
        return false;
    }
    if enemy.archetype == Archetype::Boss && status.is_frozen() {
        return false;
    }
    enemy.fire_cooldown -= dt * status.factor(combat);
    if enemy.fire_cooldown > 0.0 {
        return false;
    }
    enemy.fire_cooldown += enemy.fire_interval;
    if enemy.fire_cooldown <= 0.0 {
        enemy.fire_cooldown = enemy.fire_interval;
    }
    true
}

struct Update {
    entity: Entity,
    body: Body,
    enemy: Enemy,
    knockback: Knockback,
}

/// Move every enemy and fire volleys.
pub fn enemy_ai_system(world: &mut World, player: &Body, solids: &Solids, tuning: &Tuning, eff_depth: u32, dt: f32) {
    let mut updates: Vec<Update> = Vec::with_capacity(16);
    let mut shots: Vec<(Body, Bullet)> = Vec::new();
    let mut summons: Vec<Vec2> = Vec::new();

    for (entity, (body, enemy, status, knockback)) in world
        .query::<(&Body, &Enemy, &StatusEffects, &Knockback)>()
        .iter()
    {
        if !enemy.is_alive() {
            continue;
        }
        let mut body = *body;
        let mut enemy = enemy.clone();
        let mut knockback = *knockback;
        let factor = status.factor(&tuning.combat);

        if enemy.archetype == Archetype::Boss {
            let phase = boss_phase_for(enemy.hp_fraction(), &tuning.combat.boss_phase_thresholds);
            if phase > enemy.phase {
                log::debug!("Boss entered phase {}", phase);
                enemy.phase = phase;
            }
        }

        let dir = desired_direction(&enemy, body.pos, player.pos);
        body.vel = dir * (enemy.speed * factor);
        let delta = body.vel * dt + knockback.step(dt);
        let out = move_and_collide(solids, body.pos, delta, body.radius, Layer::Walker);
        body.pos = out.pos;

        if ready_to_fire(&mut enemy, status, &tuning.combat, dt) {
            shots.extend(volley(&enemy, body.pos, player.pos, tuning));
            if enemy.archetype == Archetype::Boss && enemy.phase >= 2 && enemy.volley % 3 == 2 {
                summons.push(body.pos);
            }
            enemy.volley += 1;
        }

        updates.push(Update {
            entity,
            body,
            enemy,
            knockback,
        });
    }

    for u in updates {
        if let Ok(mut b) = world.get::<&mut Body>(u.entity) {
            *b = u.body;
        }
        if let Ok(mut e) = world.get::<&mut Enemy>(u.entity) {
            *e = u.enemy;
        }
        if let Ok(mut k) = world.get::<&mut Knockback>(u.entity) {
            *k = u.knockback;
        }
    }
    for (body, bullet) in shots {
        spawn_bullet(world, body, bullet);
    }

    let mut minions = world
        .query::<&Enemy>()
        .iter()
        .filter(|(_, e)| e.minion && e.is_alive())
        .count();
    for pos in summons {
        if minions >= tuning.combat.minion_cap {
            break;
        }
        spawn_minion(world, pos + Vec2::new(0.0, 30.0), eff_depth, tuning);
        minions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::spawn_enemy;
    use delve_logic::doors::DoorSet;
    use delve_logic::tiles::{TileKind, TileMap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn open_map() -> TileMap {
        let mut map = TileMap::filled(TileKind::Wall);
        for y in 1..10 {
            for x in 1..14 {
                map.set(x, y, TileKind::Floor);
            }
        }
        map
    }

    fn bullets(w: &World) -> usize {
        w.query::<&Bullet>().iter().count()
    }

    fn spawn(w: &mut World, a: Archetype, pos: Vec2) -> Entity {
        let mut rng = StdRng::seed_from_u64(3);
        spawn_enemy(w, a, false, pos, 0, &Tuning::default(), &mut rng)
    }

    #[test]
    fn phase_counts_thresholds_crossed() {
        let th = [0.66, 0.33];
        assert_eq!(boss_phase_for(1.0, &th), 0);
        assert_eq!(boss_phase_for(0.66, &th), 1);
        assert_eq!(boss_phase_for(0.5, &th), 1);
        assert_eq!(boss_phase_for(0.1, &th), 2);
    }

    #[test]
    fn chaser_closes_in() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Chaser, Vec2::new(100.0, 100.0));
        let player = Body::new(Vec2::new(300.0, 100.0), 10.0);
        enemy_ai_system(&mut w, &player, &solids, &Tuning::default(), 0, DT);
        assert!(w.get::<&Body>(e).unwrap().pos.x > 100.0);
    }

    #[test]
    fn shooter_backs_off_when_crowded() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Shooter, Vec2::new(200.0, 160.0));
        let player = Body::new(Vec2::new(230.0, 160.0), 10.0);
        enemy_ai_system(&mut w, &player, &solids, &Tuning::default(), 0, DT);
        assert!(w.get::<&Body>(e).unwrap().pos.x < 200.0);
    }

    #[test]
    fn turret_never_moves_and_fires_three() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Turret, Vec2::new(200.0, 160.0));
        w.get::<&mut Enemy>(e).unwrap().fire_cooldown = 0.0;
        let player = Body::new(Vec2::new(300.0, 160.0), 10.0);
        enemy_ai_system(&mut w, &player, &solids, &Tuning::default(), 0, DT);
        assert_eq!(w.get::<&Body>(e).unwrap().pos, Vec2::new(200.0, 160.0));
        assert_eq!(bullets(&w), 3);
    }

    #[test]
    fn frozen_enemies_slow_down() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut w = World::new();
        let free = spawn(&mut w, Archetype::Chaser, Vec2::new(100.0, 100.0));
        let cold = spawn(&mut w, Archetype::Chaser, Vec2::new(100.0, 200.0));
        w.get::<&mut StatusEffects>(cold).unwrap().freeze(1.0);
        let player = Body::new(Vec2::new(400.0, 150.0), 10.0);
        enemy_ai_system(&mut w, &player, &solids, &Tuning::default(), 0, DT);
        let moved_free = w.get::<&Body>(free).unwrap().pos.x - 100.0;
        let moved_cold = w.get::<&Body>(cold).unwrap().pos.x - 100.0;
        assert!(moved_cold > 0.0 && moved_cold < moved_free * 0.5);
    }

    #[test]
    fn frozen_boss_holds_fire() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Boss, Vec2::new(240.0, 176.0));
        w.get::<&mut Enemy>(e).unwrap().fire_cooldown = 0.0;
        w.get::<&mut StatusEffects>(e).unwrap().freeze(1.0);
        let player = Body::new(Vec2::new(100.0, 100.0), 10.0);
        enemy_ai_system(&mut w, &player, &solids, &Tuning::default(), 0, DT);
        assert_eq!(bullets(&w), 0);
    }

    #[test]
    fn boss_phase_changes_pattern_at_next_volley() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let t = Tuning::default();
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Boss, Vec2::new(240.0, 176.0));
        let player = Body::new(Vec2::new(100.0, 100.0), 10.0);

        {
            let mut boss = w.get::<&mut Enemy>(e).unwrap();
            boss.fire_cooldown = 0.0;
        }
        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(bullets(&w), RADIAL_COUNT as usize);

        {
            let mut boss = w.get::<&mut Enemy>(e).unwrap();
            boss.hp = boss.hp_max * 0.6;
        }
        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(w.get::<&Enemy>(e).unwrap().phase, 1);
        assert_eq!(bullets(&w), RADIAL_COUNT as usize, "no volley until the cooldown expires");

        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(w.get::<&Enemy>(e).unwrap().phase, 1, "phase advances once");

        w.get::<&mut Enemy>(e).unwrap().fire_cooldown = 0.0;
        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(bullets(&w), (RADIAL_COUNT + FAN_COUNT) as usize);
    }

    #[test]
    fn phase_never_goes_back() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let t = Tuning::default();
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Boss, Vec2::new(240.0, 176.0));
        let player = Body::new(Vec2::new(100.0, 100.0), 10.0);
        w.get::<&mut Enemy>(e).unwrap().hp = 1.0;
        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(w.get::<&Enemy>(e).unwrap().phase, 2);
        {
            let mut boss = w.get::<&mut Enemy>(e).unwrap();
            boss.hp = boss.hp_max;
        }
        enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        assert_eq!(w.get::<&Enemy>(e).unwrap().phase, 2);
    }

    #[test]
    fn spiral_summons_are_capped() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let t = Tuning::default();
        let mut w = World::new();
        let e = spawn(&mut w, Archetype::Boss, Vec2::new(240.0, 176.0));
        let player = Body::new(Vec2::new(100.0, 100.0), 10.0);
        w.get::<&mut Enemy>(e).unwrap().hp = 1.0;
        for _ in 0..60 {
            w.get::<&mut Enemy>(e).unwrap().fire_cooldown = 0.0;
            enemy_ai_system(&mut w, &player, &solids, &t, 0, DT);
        }
        let minions = w.query::<&Enemy>().iter().filter(|(_, en)| en.minion).count();
        assert_eq!(minions, t.combat.minion_cap);
    }
}
