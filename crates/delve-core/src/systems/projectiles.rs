//! Bullet physics and hit resolution.
//!
//! Per bullet, per tick:
//! 1. Age; at end of life, burst if explosive and disappear
//! 2. Steer toward the nearest enemy if homing
//! 3. Move against the room's projectile solids; reflect off a wall while
//!    bounces remain, otherwise die (bursting if explosive)
//! 4. Resolve entity hits: damage, chain, explosion, status, then spend a
//!    pierce charge or die

use delve_logic::collision::{move_and_collide, Layer, Solids};
use delve_logic::math::{angle_delta, Vec2};
use hecs::{Entity, World};
use rand::Rng;

use super::combat::{hurt_player, strike};
use super::Feedback;
use crate::components::{Body, Bullet, BulletOwner, DecalKind, Enemy, StatusEffects};
use crate::config::Tuning;
use crate::events::Effect;
use crate::player::Player;
use crate::spawn::spawn_decal;

pub fn projectile_system(
    world: &mut World,
    player: &mut Player,
    solids: &Solids,
    tuning: &Tuning,
    dt: f32,
    rng: &mut impl Rng,
    fb: &mut Feedback,
) {
    let bullets: Vec<(Entity, Body, Bullet)> = world
        .query::<(&Body, &Bullet)>()
        .iter()
        .map(|(e, (body, bullet))| (e, *body, *bullet))
        .collect();

    let mut spent = Vec::new();
    for (entity, mut body, mut bullet) in bullets {
        let alive = step_bullet(world, player, &mut body, &mut bullet, solids, tuning, dt, rng, fb);
        if !alive {
            spent.push(entity);
            continue;
        }
        if let Ok(mut b) = world.get::<&mut Body>(entity) {
            *b = body;
        }
        if let Ok(mut b) = world.get::<&mut Bullet>(entity) {
            *b = bullet;
        }
    }
    for entity in spent {
        let _ = world.despawn(entity);
    }
}

#[allow(clippy::too_many_arguments)]
fn step_bullet(
    world: &mut World,
    player: &mut Player,
    body: &mut Body,
    bullet: &mut Bullet,
    solids: &Solids,
    tuning: &Tuning,
    dt: f32,
    rng: &mut impl Rng,
    fb: &mut Feedback,
) -> bool {
    bullet.lifetime -= dt;
    if bullet.lifetime <= 0.0 {
        if bullet.mods.explode_radius > 0.0 {
            explode(world, player, bullet, body.pos, None, tuning, fb);
        }
        return false;
    }

    if bullet.owner == BulletOwner::Player && bullet.mods.homing > 0.0 {
        if let Some((_, target)) = nearest_enemy(world, body.pos, f32::INFINITY, &[]) {
            let want = (target - body.pos).angle();
            let have = body.vel.angle();
            let turn = angle_delta(have, want).clamp(-bullet.mods.homing * dt, bullet.mods.homing * dt);
            body.vel = body.vel.rotate(turn);
        }
    }

    let out = move_and_collide(solids, body.pos, body.vel * dt, body.radius, Layer::Projectile);
    body.pos = out.pos;
    if out.blocked_x || out.blocked_y {
        if bullet.mods.bounce == 0 {
            if bullet.mods.explode_radius > 0.0 {
                explode(world, player, bullet, body.pos, None, tuning, fb);
            }
            return false;
        }
        bullet.mods.bounce -= 1;
        if out.blocked_x {
            body.vel.x = -body.vel.x;
        }
        if out.blocked_y {
            body.vel.y = -body.vel.y;
        }
    }

    match bullet.owner {
        BulletOwner::Player => hit_enemies(world, player, body, bullet, tuning, rng, fb),
        BulletOwner::Enemy => {
            if !body.touches(&player.body) {
                return true;
            }
            if bullet.mods.explode_radius > 0.0 {
                explode(world, player, bullet, body.pos, None, tuning, fb);
            } else {
                hurt_player(player, bullet.damage, tuning, fb);
            }
            false
        }
    }
}

fn hit_enemies(
    world: &mut World,
    player: &mut Player,
    body: &Body,
    bullet: &mut Bullet,
    tuning: &Tuning,
    rng: &mut impl Rng,
    fb: &mut Feedback,
) -> bool {
    let target = world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(e, (b, enemy))| enemy.is_alive() && !bullet.has_hit(*e) && b.touches(body))
        .map(|(e, _)| e)
        .next();
    let Some(target) = target else {
        return true;
    };

    strike(world, player, target, bullet.damage, body.vel, tuning);

    let c = &tuning.combat;
    let p = &player.passives;
    let freeze = bullet.mods.freeze || super::loot::chance(rng, p.freeze_proc);
    let shock = bullet.mods.shock || super::loot::chance(rng, p.shock_proc);
    if let Ok(mut status) = world.get::<&mut StatusEffects>(target) {
        if freeze {
            status.freeze(c.freeze_time);
        }
        if shock {
            status.shock(c.shock_time);
        }
    }

    if bullet.mods.chain > 0 {
        chain_lightning(world, player, target, bullet.damage, bullet.mods.chain, bullet.mods.shock, tuning);
    }
    if bullet.mods.explode_radius > 0.0 {
        explode(world, player, bullet, body.pos, Some(target), tuning, fb);
    }

    if bullet.mods.pierce > 0 {
        bullet.mods.pierce -= 1;
        bullet.record_hit(target);
        return true;
    }
    false
}

/// Nearest live enemy within `range` of `from`, skipping `exclude`.
pub fn nearest_enemy(world: &World, from: Vec2, range: f32, exclude: &[Entity]) -> Option<(Entity, Vec2)> {
    world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(e, (b, enemy))| enemy.is_alive() && !exclude.contains(e) && b.pos.distance(&from) <= range)
        .map(|(e, (b, _))| (e, b.pos))
        .min_by(|a, b| a.1.distance_squared(&from).total_cmp(&b.1.distance_squared(&from)))
}

/// Arc from the struck enemy to up to `hops` others. Hop `k` deals
/// `damage · falloffᵏ` and searches `range · range_falloffᵏ⁻¹`.
pub fn chain_lightning(
    world: &mut World,
    player: &mut Player,
    first: Entity,
    damage: f32,
    hops: u32,
    shock: bool,
    tuning: &Tuning,
) -> u32 {
    let c = &tuning.combat;
    let mut visited = vec![first];
    let mut from = match world.get::<&Body>(first) {
        Ok(b) => b.pos,
        Err(_) => return 0,
    };
    let mut dmg = damage;
    let mut range = c.chain_range;
    let mut landed = 0;
    for _ in 0..hops {
        dmg *= c.chain_damage_falloff;
        let Some((next, pos)) = nearest_enemy(world, from, range, &visited) else {
            break;
        };
        strike(world, player, next, dmg, pos - from, tuning);
        if shock {
            if let Ok(mut status) = world.get::<&mut StatusEffects>(next) {
                status.shock(c.shock_time);
            }
        }
        visited.push(next);
        from = pos;
        range *= c.chain_range_falloff;
        landed += 1;
    }
    landed
}

/// Area burst. Player shells hurt enemies (except `exclude`, already hit
/// directly); enemy shells hurt the player.
fn explode(
    world: &mut World,
    player: &mut Player,
    bullet: &Bullet,
    pos: Vec2,
    exclude: Option<Entity>,
    tuning: &Tuning,
    fb: &mut Feedback,
) {
    let radius = bullet.mods.explode_radius;
    let damage = bullet.damage * tuning.combat.explosion_damage_factor;
    match bullet.owner {
        BulletOwner::Player => {
            let caught: Vec<(Entity, Vec2)> = world
                .query::<(&Body, &Enemy)>()
                .iter()
                .filter(|(e, (b, enemy))| {
                    enemy.is_alive() && Some(*e) != exclude && b.pos.distance(&pos) <= radius + b.radius
                })
                .map(|(e, (b, _))| (e, b.pos))
                .collect();
            for (e, at) in caught {
                strike(world, player, e, damage, at - pos, tuning);
            }
        }
        BulletOwner::Enemy => {
            if player.body.pos.distance(&pos) <= radius + player.body.radius {
                hurt_player(player, bullet.damage, tuning, fb);
            }
        }
    }
    spawn_decal(world, pos, radius * 0.5, DecalKind::Scorch, tuning.world.decal_cap);
    fb.emit(Effect::Explosion { pos, radius });
    fb.shake(4.0);
}
