//! ECS components for the live entities of the active room.
//!
//! Enemies carry `(Body, Enemy, StatusEffects, Knockback)`, pickups carry
//! `(Body, Pickup)`, bullets carry `(Body, Bullet)` and decals carry a lone
//! `Decal`. Every spawn path uses exactly these bundles so that each kind of
//! entity lives in a single hecs archetype.

use delve_logic::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::CombatTuning;
use crate::items::{ItemId, ShopOffer, WeaponId};

/// Physical circle: position, velocity, collision radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    pub fn touches(&self, other: &Body) -> bool {
        delve_logic::math::circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }
}

/// Fixed behavioral category of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Runs straight at the player.
    Chaser,
    /// Keeps its distance and fires aimed shots.
    Shooter,
    /// Never moves; fires three-round spreads.
    Turret,
    /// Circles the player at standoff range.
    Orbiter,
    /// Lobs slow shells that burst where they land.
    Lobber,
    Boss,
}

/// Unscaled per-archetype stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeStats {
    pub hp: f32,
    pub speed: f32,
    pub radius: f32,
    pub contact_damage: f32,
    /// Seconds between volleys; zero means the archetype never fires.
    pub fire_interval: f32,
    /// Preferred distance from the player.
    pub standoff: f32,
}

impl Archetype {
    /// Archetypes a regular room may roll.
    pub fn regular() -> &'static [Archetype] {
        &[
            Archetype::Chaser,
            Archetype::Shooter,
            Archetype::Turret,
            Archetype::Orbiter,
            Archetype::Lobber,
        ]
    }

    pub fn base_stats(self) -> ArchetypeStats {
        match self {
            Archetype::Chaser => ArchetypeStats {
                hp: 8.0,
                speed: 95.0,
                radius: 11.0,
                contact_damage: 1.0,
                fire_interval: 0.0,
                standoff: 0.0,
            },
            Archetype::Shooter => ArchetypeStats {
                hp: 6.0,
                speed: 70.0,
                radius: 10.0,
                contact_damage: 1.0,
                fire_interval: 1.6,
                standoff: 150.0,
            },
            Archetype::Turret => ArchetypeStats {
                hp: 10.0,
                speed: 0.0,
                radius: 12.0,
                contact_damage: 1.0,
                fire_interval: 2.2,
                standoff: 0.0,
            },
            Archetype::Orbiter => ArchetypeStats {
                hp: 7.0,
                speed: 90.0,
                radius: 10.0,
                contact_damage: 1.0,
                fire_interval: 1.9,
                standoff: 120.0,
            },
            Archetype::Lobber => ArchetypeStats {
                hp: 9.0,
                speed: 55.0,
                radius: 12.0,
                contact_damage: 1.0,
                fire_interval: 2.6,
                standoff: 170.0,
            },
            Archetype::Boss => ArchetypeStats {
                hp: 120.0,
                speed: 45.0,
                radius: 26.0,
                contact_damage: 2.0,
                fire_interval: 1.1,
                standoff: 140.0,
            },
        }
    }

    /// Whether knockback moves this archetype.
    pub fn knockable(self) -> bool {
        !matches!(self, Archetype::Turret | Archetype::Boss)
    }
}

/// Enemy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub archetype: Archetype,
    pub elite: bool,
    /// Summoned by a boss; drops no loot.
    pub minion: bool,
    pub hp: f32,
    pub hp_max: f32,
    /// Fraction of incoming damage ignored, in `[0, 1]`.
    pub armor: f32,
    pub speed: f32,
    pub contact_damage: f32,
    pub fire_cooldown: f32,
    pub fire_interval: f32,
    pub standoff: f32,
    /// Boss phase, only ever increases.
    pub phase: u8,
    /// Volleys fired so far.
    pub volley: u32,
    /// +1 or -1: which way an orbiter circles.
    pub orbit_dir: f32,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.hp_max > 0.0 {
            (self.hp / self.hp_max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Timed debuffs. Both multiply speed and fire rate while active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub frozen: f32,
    pub shocked: f32,
}

impl StatusEffects {
    pub fn is_frozen(&self) -> bool {
        self.frozen > 0.0
    }

    pub fn is_shocked(&self) -> bool {
        self.shocked > 0.0
    }

    /// Combined speed / fire-rate multiplier.
    pub fn factor(&self, tuning: &CombatTuning) -> f32 {
        let mut f = 1.0;
        if self.is_frozen() {
            f *= tuning.frozen_factor;
        }
        if self.is_shocked() {
            f *= tuning.shocked_factor;
        }
        f
    }

    pub fn freeze(&mut self, duration: f32) {
        self.frozen = self.frozen.max(duration);
    }

    pub fn shock(&mut self, duration: f32) {
        self.shocked = self.shocked.max(duration);
    }

    pub fn tick(&mut self, dt: f32) {
        self.frozen = (self.frozen - dt).max(0.0);
        self.shocked = (self.shocked - dt).max(0.0);
    }
}

/// Externally imposed velocity that decays to nothing over `timer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub vel: Vec2,
    pub timer: f32,
}

impl Knockback {
    pub fn push(&mut self, vel: Vec2, time: f32) {
        self.vel = vel;
        self.timer = time;
    }

    pub fn is_active(&self) -> bool {
        self.timer > 0.0
    }

    /// Displacement for this tick; advances the timer.
    pub fn step(&mut self, dt: f32) -> Vec2 {
        if !self.is_active() {
            return Vec2::ZERO;
        }
        let used = dt.min(self.timer);
        self.timer -= used;
        if self.timer <= 0.0 {
            let d = self.vel * used;
            self.vel = Vec2::ZERO;
            return d;
        }
        self.vel * used
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

/// Behavior modifiers carried by a bullet. Budgets count down as they are used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletMods {
    /// Extra enemies the bullet may pass through.
    pub pierce: u32,
    /// Wall reflections left.
    pub bounce: u32,
    /// Turn rate toward the nearest enemy, radians per second.
    pub homing: f32,
    /// Chain lightning hops on hit.
    pub chain: u32,
    pub explode_radius: f32,
    pub freeze: bool,
    pub shock: bool,
}

/// Projectile state. Bullets are never cached with a room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub owner: BulletOwner,
    pub damage: f32,
    pub lifetime: f32,
    pub mods: BulletMods,
    pub crit: bool,
    /// Most recent enemies struck, newest first. A listed enemy is not hit
    /// again, so a slow piercing round cannot bounce between two bodies.
    pub recent_hits: [Option<hecs::Entity>; BULLET_HIT_MEMORY],
}

pub const BULLET_HIT_MEMORY: usize = 4;

impl Bullet {
    pub fn has_hit(&self, enemy: hecs::Entity) -> bool {
        self.recent_hits.contains(&Some(enemy))
    }

    pub fn record_hit(&mut self, enemy: hecs::Entity) {
        self.recent_hits.rotate_right(1);
        self.recent_hits[0] = Some(enemy);
    }
}

/// Collectible or interactive pickup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Coin,
    Heart,
    Key,
    Item(ItemId),
    Weapon(WeaponId),
    /// Opened with interact.
    Chest,
    /// Bought with interact.
    ShopSlot(ShopOffer),
    /// Takes the player to the next floor.
    Portal,
}

impl PickupKind {
    /// Collected by walking over it.
    pub fn is_touch(self) -> bool {
        !matches!(self, PickupKind::Chest | PickupKind::ShopSlot(_))
    }

    pub fn radius(self) -> f32 {
        match self {
            PickupKind::Coin => 5.0,
            PickupKind::Heart | PickupKind::Key => 7.0,
            PickupKind::Portal => 16.0,
            _ => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecalKind {
    Scorch,
    Splat,
}

/// Cosmetic floor mark, cached with the room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decal {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: DecalKind,
    /// Spawn order within the room; the lowest is dropped first.
    pub serial: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_factors_multiply() {
        let t = CombatTuning::default();
        let mut s = StatusEffects::default();
        assert_eq!(s.factor(&t), 1.0);
        s.freeze(1.0);
        assert!((s.factor(&t) - 0.15).abs() < 1e-6);
        s.shock(1.0);
        assert!((s.factor(&t) - 0.15 * 0.6).abs() < 1e-6);
        s.tick(2.0);
        assert_eq!(s, StatusEffects::default());
    }

    #[test]
    fn freeze_keeps_longest_timer() {
        let mut s = StatusEffects::default();
        s.freeze(2.0);
        s.freeze(0.5);
        assert_eq!(s.frozen, 2.0);
    }

    #[test]
    fn knockback_runs_out() {
        let mut k = Knockback::default();
        k.push(Vec2::new(100.0, 0.0), 0.1);
        let a = k.step(0.06);
        let b = k.step(0.06);
        assert!((a.x - 6.0).abs() < 1e-4);
        assert!((b.x - 4.0).abs() < 1e-3);
        assert!(!k.is_active());
        assert_eq!(k.step(0.06), Vec2::ZERO);
    }

    #[test]
    fn shop_slots_and_chests_need_interaction() {
        assert!(PickupKind::Coin.is_touch());
        assert!(PickupKind::Portal.is_touch());
        assert!(!PickupKind::Chest.is_touch());
        assert!(!PickupKind::ShopSlot(ShopOffer::Key).is_touch());
    }
}
