//! Player steering, collision movement and weapons.

use delve_logic::collision::{move_and_collide, Layer, Solids};
use delve_logic::math::smoothing;
use hecs::World;
use rand::Rng;

use super::Feedback;
use crate::components::{Body, Bullet, BulletOwner, BULLET_HIT_MEMORY};
use crate::config::{PlayerTuning, Tuning};
use crate::events::{Effect, MSG_CLIP_FULL, MSG_RELOADING};
use crate::input::Intents;
use crate::player::Player;
use crate::spawn::spawn_bullet;

/// Turn intents into the player's own velocity (dash or smoothed walk) and
/// update the aim direction. Runs before the door-intent check.
pub fn steer_player(player: &mut Player, intents: &Intents, tuning: &PlayerTuning, dt: f32) {
    let to_aim = intents.aim_point - player.body.pos;
    if to_aim.length_squared() > 1e-6 {
        player.aim = to_aim.normalize();
    }

    if intents.dash_pressed && !player.is_dashing() && player.dash_cooldown <= 0.0 {
        let dir = if intents.move_vector.length_squared() > 1e-6 {
            intents.move_vector.normalize()
        } else {
            player.aim
        };
        player.dash_dir = dir;
        player.dash_timer = tuning.dash_time;
        player.dash_cooldown = tuning.dash_cooldown;
        player.invuln = player.invuln.max(tuning.dash_time);
    }

    if player.is_dashing() {
        player.body.vel = player.dash_dir * tuning.dash_speed;
        player.dash_timer = (player.dash_timer - dt).max(0.0);
        return;
    }

    let target = intents.move_vector * (tuning.speed * player.passives.move_mult);
    let k = smoothing(tuning.accel, dt);
    player.body.vel = player.body.vel + (target - player.body.vel) * k;
}

/// Resolve the player's movement plus any knockback against the room.
pub fn move_player(player: &mut Player, solids: &Solids, dt: f32) {
    let delta = player.body.vel * dt + player.knockback.step(dt);
    let out = move_and_collide(solids, player.body.pos, delta, player.body.radius, Layer::Walker);
    player.body.pos = out.pos;
    if out.blocked_x {
        player.body.vel.x = 0.0;
    }
    if out.blocked_y {
        player.body.vel.y = 0.0;
    }
}

/// Weapon switching, reloading and firing.
pub fn weapon_system(
    player: &mut Player,
    intents: &Intents,
    world: &mut World,
    tuning: &Tuning,
    rng: &mut impl Rng,
    fb: &mut Feedback,
) {
    player.cycle_weapon(intents.weapon_cycle);
    if intents.reload_pressed && !player.weapon_mut().start_reload() {
        fb.say(if player.weapon().is_reloading() {
            MSG_RELOADING
        } else {
            MSG_CLIP_FULL
        });
    }
    if !intents.fire_held || player.is_dashing() {
        return;
    }

    let slot = *player.weapon();
    if slot.is_reloading() {
        fb.say(MSG_RELOADING);
        return;
    }
    if slot.cooldown > 0.0 {
        return;
    }
    if slot.clip == 0 {
        player.weapon_mut().start_reload();
        fb.say(MSG_RELOADING);
        return;
    }

    let spec = slot.id.spec();
    let passives = player.passives;
    let mut mods = spec.mods;
    mods.pierce += passives.pierce;
    mods.bounce += passives.bounce;
    mods.homing += passives.homing;

    for i in 0..spec.pellets {
        let offset = if spec.pellets > 1 {
            -spec.spread / 2.0 + spec.spread * i as f32 / (spec.pellets - 1) as f32
        } else if spec.spread > 0.0 {
            rng.gen_range(-spec.spread / 2.0..spec.spread / 2.0)
        } else {
            0.0
        };
        let dir = player.aim.rotate(offset);
        let crit = passives.crit_chance > 0.0 && rng.gen_bool(passives.crit_chance.min(1.0) as f64);
        let mut damage = spec.damage * passives.damage_mult;
        if crit {
            damage *= tuning.combat.crit_multiplier;
        }
        let body = Body {
            pos: player.body.pos,
            vel: dir * spec.bullet_speed,
            radius: spec.bullet_radius,
        };
        let bullet = Bullet {
            owner: BulletOwner::Player,
            damage,
            lifetime: spec.lifetime,
            mods,
            crit,
            recent_hits: [None; BULLET_HIT_MEMORY],
        };
        spawn_bullet(world, body, bullet);
    }

    let w = player.weapon_mut();
    w.clip -= 1;
    w.cooldown = spec.interval;
    if w.clip == 0 {
        w.start_reload();
    }
    fb.emit(Effect::Shot { weapon: slot.id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::WeaponId;
    use delve_logic::doors::DoorSet;
    use delve_logic::math::Vec2;
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

    fn player() -> Player {
        Player::new(&PlayerTuning::default(), Vec2::new(200.0, 150.0))
    }

    fn fire() -> Intents {
        Intents {
            fire_held: true,
            aim_point: Vec2::new(400.0, 150.0),
            ..Intents::default()
        }
    }

    #[test]
    fn velocity_approaches_target() {
        let t = PlayerTuning::default();
        let mut p = player();
        let i = Intents::walk(Vec2::new(1.0, 0.0));
        steer_player(&mut p, &i, &t, DT);
        let first = p.body.vel.x;
        assert!(first > 0.0 && first < t.speed);
        for _ in 0..120 {
            steer_player(&mut p, &i, &t, DT);
        }
        assert!((p.body.vel.x - t.speed).abs() < 1.0);
    }

    #[test]
    fn dash_is_gated_by_cooldown() {
        let t = PlayerTuning::default();
        let mut p = player();
        let dash = Intents {
            dash_pressed: true,
            move_vector: Vec2::new(0.0, 1.0),
            ..Intents::default()
        };
        steer_player(&mut p, &dash, &t, DT);
        assert_eq!(p.body.vel, Vec2::new(0.0, t.dash_speed));
        for _ in 0..20 {
            steer_player(&mut p, &Intents::default(), &t, DT);
            p.tick_timers(DT, &t);
        }
        assert!(!p.is_dashing());
        assert!(p.dash_cooldown > 0.0);
        steer_player(&mut p, &dash, &t, DT);
        assert!(!p.is_dashing(), "still cooling down");
    }

    #[test]
    fn movement_is_blocked_by_walls() {
        let map = open_map();
        let solids = Solids::new(&map, DoorSet::ALL);
        let mut p = player();
        p.body.pos = Vec2::new(45.0, 150.0);
        p.body.vel = Vec2::new(-600.0, 0.0);
        move_player(&mut p, &solids, 0.1);
        assert!(p.body.pos.x >= 42.0 - 1e-3);
        assert_eq!(p.body.vel.x, 0.0);
    }

    #[test]
    fn firing_spends_ammo_and_respects_cooldown() {
        let t = Tuning::default();
        let mut p = player();
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut fb = Feedback::default();
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut fb);
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut fb);
        assert_eq!(w.query::<&Bullet>().iter().count(), 1);
        assert_eq!(p.weapon().clip, WeaponId::Pistol.spec().clip - 1);
        assert_eq!(fb.effects, vec![Effect::Shot { weapon: WeaponId::Pistol }]);
    }

    #[test]
    fn shotgun_fires_a_fan() {
        let t = Tuning::default();
        let mut p = player();
        p.give_weapon(WeaponId::Shotgun);
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut Feedback::default());
        assert_eq!(w.query::<&Bullet>().iter().count(), WeaponId::Shotgun.spec().pellets as usize);
    }

    #[test]
    fn empty_clip_reloads_automatically() {
        let t = Tuning::default();
        let mut p = player();
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(2);
        let clip = WeaponId::Pistol.spec().clip;
        for _ in 0..clip {
            p.weapon_mut().cooldown = 0.0;
            weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut Feedback::default());
        }
        assert_eq!(p.weapon().clip, 0);
        assert!(p.weapon().is_reloading());
        p.tick_timers(WeaponId::Pistol.spec().reload + 0.01, &PlayerTuning::default());
        assert_eq!(p.weapon().clip, clip);
    }

    #[test]
    fn dry_trigger_and_full_reload_explain_themselves() {
        let t = Tuning::default();
        let mut p = player();
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(4);

        let reload = Intents {
            reload_pressed: true,
            ..Intents::default()
        };
        let mut fb = Feedback::default();
        weapon_system(&mut p, &reload, &mut w, &t, &mut rng, &mut fb);
        assert_eq!(fb.message, Some(MSG_CLIP_FULL));
        assert!(!p.weapon().is_reloading());

        p.weapon_mut().clip = 0;
        let mut fb = Feedback::default();
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut fb);
        assert_eq!(fb.message, Some(MSG_RELOADING));
        assert!(p.weapon().is_reloading());
        assert_eq!(w.query::<&Bullet>().iter().count(), 0);

        let mut fb = Feedback::default();
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut fb);
        assert_eq!(fb.message, Some(MSG_RELOADING));
        assert!(fb.effects.is_empty());
    }

    #[test]
    fn passive_mods_are_added_to_bullets() {
        let t = Tuning::default();
        let mut p = player();
        p.take_item(crate::items::ItemId::PiercingRound);
        p.take_item(crate::items::ItemId::RubberShot);
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        weapon_system(&mut p, &fire(), &mut w, &t, &mut rng, &mut Feedback::default());
        let b = w.query::<&Bullet>().iter().map(|(_, b)| *b).next().unwrap();
        assert_eq!(b.mods.pierce, 1);
        assert_eq!(b.mods.bounce, 1);
    }
}
