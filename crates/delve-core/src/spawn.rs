//! Entity factories for the active room's ECS world.

use delve_logic::math::Vec2;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::*;
use crate::config::Tuning;

/// Difficulty input for enemy scaling: ring depth plus two per extra floor.
pub fn effective_depth(depth: u32, floor: u32) -> u32 {
    depth + 2 * floor.saturating_sub(1)
}

/// Build enemy stats for an archetype at a given effective depth.
pub fn scaled_enemy(archetype: Archetype, elite: bool, eff_depth: u32, tuning: &Tuning) -> (Enemy, f32) {
    let base = archetype.base_stats();
    let e = &tuning.enemies;
    let d = eff_depth as f32;

    let base_hp = if archetype == Archetype::Boss {
        e.boss_hp
    } else {
        base.hp
    };
    let mut hp = base_hp * (1.0 + e.hp_per_depth * d);
    let speed = base.speed * (1.0 + e.speed_per_depth * d);
    let mut interval = base.fire_interval / (1.0 + e.fire_rate_per_depth * d);
    let mut armor = 0.0;
    let mut radius = base.radius;

    if archetype == Archetype::Boss {
        armor = tuning.combat.boss_armor;
    } else if elite {
        hp *= e.elite_hp_mult;
        interval /= e.elite_tier;
        armor = tuning.combat.elite_armor;
        radius *= 1.2;
    }

    let enemy = Enemy {
        archetype,
        elite,
        minion: false,
        hp,
        hp_max: hp,
        armor,
        speed,
        contact_damage: base.contact_damage,
        fire_cooldown: interval,
        fire_interval: interval,
        standoff: base.standoff,
        phase: 0,
        volley: 0,
        orbit_dir: 1.0,
    };
    (enemy, radius)
}

pub fn spawn_enemy(
    world: &mut World,
    archetype: Archetype,
    elite: bool,
    pos: Vec2,
    eff_depth: u32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Entity {
    let (mut enemy, radius) = scaled_enemy(archetype, elite, eff_depth, tuning);
    // Stagger first volleys so a room does not fire in unison
    enemy.fire_cooldown *= rng.gen_range(0.6..1.2);
    enemy.orbit_dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    world.spawn((
        Body::new(pos, radius),
        enemy,
        StatusEffects::default(),
        Knockback::default(),
    ))
}

/// Boss-summoned chaser. Minions never drop loot.
pub fn spawn_minion(world: &mut World, pos: Vec2, eff_depth: u32, tuning: &Tuning) -> Entity {
    let (mut enemy, radius) = scaled_enemy(Archetype::Chaser, false, eff_depth, tuning);
    enemy.minion = true;
    world.spawn((
        Body::new(pos, radius),
        enemy,
        StatusEffects::default(),
        Knockback::default(),
    ))
}

pub fn spawn_pickup(world: &mut World, kind: PickupKind, pos: Vec2) -> Entity {
    world.spawn((Body::new(pos, kind.radius()), Pickup { kind, value: 1 }))
}

pub fn spawn_bullet(world: &mut World, body: Body, bullet: Bullet) -> Entity {
    world.spawn((body, bullet))
}

/// Plain hostile bullet.
pub fn enemy_bullet(pos: Vec2, vel: Vec2, damage: f32) -> (Body, Bullet) {
    let body = Body {
        pos,
        vel,
        radius: 5.0,
    };
    let bullet = Bullet {
        owner: BulletOwner::Enemy,
        damage,
        lifetime: 3.0,
        mods: BulletMods::default(),
        crit: false,
        recent_hits: [None; BULLET_HIT_MEMORY],
    };
    (body, bullet)
}

/// Add a decal, dropping the oldest ones beyond `cap`.
pub fn spawn_decal(world: &mut World, pos: Vec2, radius: f32, kind: DecalKind, cap: usize) {
    let mut existing: Vec<(Entity, u64)> = world
        .query::<&Decal>()
        .iter()
        .map(|(e, d)| (e, d.serial))
        .collect();
    let serial = existing.iter().map(|(_, s)| *s + 1).max().unwrap_or(0);
    if cap == 0 {
        return;
    }
    existing.sort_by_key(|(_, s)| *s);
    let excess = (existing.len() + 1).saturating_sub(cap);
    for (e, _) in existing.into_iter().take(excess) {
        let _ = world.despawn(e);
    }
    world.spawn((Decal {
        pos,
        radius,
        kind,
        serial,
    },));
}

pub fn enemy_count(world: &World) -> usize {
    world.query::<&Enemy>().iter().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn effective_depth_grows_with_floor() {
        assert_eq!(effective_depth(3, 1), 3);
        assert_eq!(effective_depth(3, 2), 5);
        assert_eq!(effective_depth(0, 0), 0);
    }

    #[test]
    fn elites_are_tougher_and_faster_firing() {
        let t = Tuning::default();
        let (normal, r) = scaled_enemy(Archetype::Shooter, false, 2, &t);
        let (elite, er) = scaled_enemy(Archetype::Shooter, true, 2, &t);
        assert!((elite.hp / normal.hp - t.enemies.elite_hp_mult).abs() < 1e-4);
        assert!((normal.fire_interval / elite.fire_interval - t.enemies.elite_tier).abs() < 1e-4);
        assert_eq!(elite.armor, t.combat.elite_armor);
        assert!(er > r);
    }

    #[test]
    fn depth_scales_hp_and_speed() {
        let t = Tuning::default();
        let (shallow, _) = scaled_enemy(Archetype::Chaser, false, 0, &t);
        let (deep, _) = scaled_enemy(Archetype::Chaser, false, 6, &t);
        assert!(deep.hp > shallow.hp);
        assert!(deep.speed > shallow.speed);
    }

    #[test]
    fn boss_uses_tuned_hp_and_armor() {
        let t = Tuning::default();
        let (boss, _) = scaled_enemy(Archetype::Boss, false, 0, &t);
        assert_eq!(boss.hp_max, t.enemies.boss_hp);
        assert_eq!(boss.armor, t.combat.boss_armor);
    }

    #[test]
    fn spawned_enemy_has_full_bundle() {
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let e = spawn_enemy(&mut w, Archetype::Orbiter, false, Vec2::new(50.0, 50.0), 1, &Tuning::default(), &mut rng);
        assert!(w.get::<&Body>(e).is_ok());
        assert!(w.get::<&StatusEffects>(e).is_ok());
        assert!(w.get::<&Knockback>(e).is_ok());
        assert_eq!(enemy_count(&w), 1);
    }

    #[test]
    fn decals_are_capped_oldest_first() {
        let mut w = World::new();
        for i in 0..5 {
            spawn_decal(&mut w, Vec2::new(i as f32, 0.0), 4.0, DecalKind::Splat, 3);
        }
        let mut xs: Vec<f32> = w.query::<&Decal>().iter().map(|(_, d)| d.pos.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
