//! The player: body, health pools, weapons, wallet and passive modifiers.

use delve_logic::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{Body, Knockback};
use crate::config::PlayerTuning;
use crate::items::{ItemId, WeaponId};

/// One owned weapon with its magazine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub id: WeaponId,
    /// Seconds until the next shot is allowed.
    pub cooldown: f32,
    pub clip: u32,
    /// Remaining reload time; zero when not reloading.
    pub reload: f32,
}

impl WeaponSlot {
    pub fn new(id: WeaponId) -> Self {
        Self {
            id,
            cooldown: 0.0,
            clip: id.spec().clip,
            reload: 0.0,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload > 0.0
    }

    /// Start a reload unless one is running or the clip is already full.
    pub fn start_reload(&mut self) -> bool {
        if self.is_reloading() || self.clip >= self.id.spec().clip {
            return false;
        }
        self.reload = self.id.spec().reload;
        true
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.is_reloading() {
            self.reload -= dt;
            if self.reload <= 0.0 {
                self.reload = 0.0;
                self.clip = self.id.spec().clip;
            }
        }
    }
}

/// Stacked modifiers from collected items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Passives {
    pub damage_mult: f32,
    pub crit_chance: f32,
    pub pierce: u32,
    pub bounce: u32,
    pub homing: f32,
    pub life_steal: f32,
    pub thorns: f32,
    pub pickup_radius: f32,
    pub move_mult: f32,
    pub luck: f32,
    pub freeze_proc: f32,
    pub shock_proc: f32,
}

impl Default for Passives {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            crit_chance: 0.05,
            pierce: 0,
            bounce: 0,
            homing: 0.0,
            life_steal: 0.0,
            thorns: 0.0,
            pickup_radius: 0.0,
            move_mult: 1.0,
            luck: 0.0,
            freeze_proc: 0.0,
            shock_proc: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub hp: f32,
    pub hp_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    /// Seconds until the shield starts regenerating.
    pub shield_delay: f32,
    pub invuln: f32,
    pub dash_timer: f32,
    pub dash_cooldown: f32,
    pub dash_dir: Vec2,
    pub knockback: Knockback,
    pub weapons: Vec<WeaponSlot>,
    pub current: usize,
    pub coins: u32,
    pub keys: u32,
    pub passives: Passives,
    pub items: Vec<ItemId>,
    /// Last aim direction, unit length.
    pub aim: Vec2,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, pos: Vec2) -> Self {
        Self {
            body: Body::new(pos, tuning.radius),
            hp: tuning.hp_max,
            hp_max: tuning.hp_max,
            shield: 0.0,
            shield_max: 0.0,
            shield_delay: 0.0,
            invuln: 0.0,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            dash_dir: Vec2::ZERO,
            knockback: Knockback::default(),
            weapons: vec![WeaponSlot::new(WeaponId::Pistol)],
            current: 0,
            coins: tuning.start_coins,
            keys: tuning.start_keys,
            passives: Passives::default(),
            items: Vec::new(),
            aim: Vec2::new(1.0, 0.0),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    pub fn weapon(&self) -> &WeaponSlot {
        // `current` is kept in range by every mutator
        &self.weapons[self.current.min(self.weapons.len() - 1)]
    }

    pub fn weapon_mut(&mut self) -> &mut WeaponSlot {
        let i = self.current.min(self.weapons.len() - 1);
        &mut self.weapons[i]
    }

    pub fn has_weapon(&self, id: WeaponId) -> bool {
        self.weapons.iter().any(|w| w.id == id)
    }

    /// Add a weapon and switch to it. Returns false if it was already owned.
    pub fn give_weapon(&mut self, id: WeaponId) -> bool {
        if self.has_weapon(id) {
            return false;
        }
        self.weapons.push(WeaponSlot::new(id));
        self.current = self.weapons.len() - 1;
        true
    }

    /// Step the current weapon index by `step` (−1, 0 or +1), wrapping.
    pub fn cycle_weapon(&mut self, step: i32) {
        if step == 0 || self.weapons.is_empty() {
            return;
        }
        let n = self.weapons.len() as i32;
        self.current = (self.current as i32 + step).rem_euclid(n) as usize;
    }

    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 && !self.is_dead() {
            self.hp = (self.hp + amount).min(self.hp_max);
        }
    }

    /// Apply incoming damage through the invulnerability gate, then shield,
    /// then hp. Returns the amount actually taken, or `None` if the hit was
    /// ignored.
    pub fn take_damage(&mut self, amount: f32, tuning: &PlayerTuning) -> Option<f32> {
        if amount <= 0.0 || self.invuln > 0.0 || self.is_dead() {
            return None;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.hp = (self.hp - (amount - absorbed)).max(0.0);
        self.invuln = tuning.invuln_time;
        self.shield_delay = tuning.shield_regen_delay;
        Some(amount)
    }

    /// Stack an item's effect onto the player.
    pub fn take_item(&mut self, item: ItemId) {
        let p = &mut self.passives;
        match item {
            ItemId::Whetstone => p.damage_mult *= 1.2,
            ItemId::CritLens => p.crit_chance = (p.crit_chance + 0.1).min(1.0),
            ItemId::PiercingRound => p.pierce += 1,
            ItemId::RubberShot => p.bounce += 1,
            ItemId::SeekerChip => p.homing += 2.5,
            ItemId::VampireFang => p.life_steal += 0.05,
            ItemId::ThornMail => p.thorns += 0.5,
            ItemId::Magnet => p.pickup_radius += 24.0,
            ItemId::SwiftBoots => p.move_mult *= 1.1,
            ItemId::LuckyCharm => p.luck += 0.03,
            ItemId::CryoCore => p.freeze_proc += 0.1,
            ItemId::StaticCore => p.shock_proc += 0.1,
            ItemId::ShieldCore => {
                self.shield_max += 2.0;
                self.shield = self.shield_max;
            }
            ItemId::HeartVessel => {
                self.hp_max += 2.0;
                self.hp += 2.0;
            }
        }
        self.items.push(item);
    }

    /// Per-tick timers: invulnerability, dash cooldown, shield regeneration
    /// and weapon cooldown/reload.
    pub fn tick_timers(&mut self, dt: f32, tuning: &PlayerTuning) {
        self.invuln = (self.invuln - dt).max(0.0);
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        if self.shield_delay > 0.0 {
            self.shield_delay = (self.shield_delay - dt).max(0.0);
        } else if self.shield < self.shield_max {
            self.shield = (self.shield + tuning.shield_regen_rate * dt).min(self.shield_max);
        }
        for w in &mut self.weapons {
            w.tick(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&PlayerTuning::default(), Vec2::new(100.0, 100.0))
    }

    #[test]
    fn shield_absorbs_before_hp() {
        let t = PlayerTuning::default();
        let mut p = player();
        p.take_item(ItemId::ShieldCore);
        assert_eq!(p.shield, 2.0);
        assert_eq!(p.take_damage(3.0, &t), Some(3.0));
        assert_eq!(p.shield, 0.0);
        assert_eq!(p.hp, t.hp_max - 1.0);
    }

    #[test]
    fn invulnerability_gates_repeat_hits() {
        let t = PlayerTuning::default();
        let mut p = player();
        assert!(p.take_damage(1.0, &t).is_some());
        assert!(p.take_damage(1.0, &t).is_none());
        p.tick_timers(t.invuln_time + 0.01, &t);
        assert!(p.take_damage(1.0, &t).is_some());
        assert_eq!(p.hp, t.hp_max - 2.0);
    }

    #[test]
    fn shield_regenerates_after_delay() {
        let t = PlayerTuning::default();
        let mut p = player();
        p.take_item(ItemId::ShieldCore);
        p.take_damage(1.0, &t);
        assert_eq!(p.shield, 1.0);
        p.tick_timers(1.0, &t);
        assert_eq!(p.shield, 1.0, "still inside the regen delay");
        p.tick_timers(t.shield_regen_delay, &t);
        p.tick_timers(0.5, &t);
        assert!(p.shield > 1.0);
        p.tick_timers(10.0, &t);
        assert_eq!(p.shield, p.shield_max);
    }

    #[test]
    fn heal_is_capped() {
        let mut p = player();
        p.hp = 1.0;
        p.heal(100.0);
        assert_eq!(p.hp, p.hp_max);
    }

    #[test]
    fn weapons_cycle_and_dedupe() {
        let mut p = player();
        assert!(p.give_weapon(WeaponId::Shotgun));
        assert!(!p.give_weapon(WeaponId::Shotgun));
        assert_eq!(p.weapon().id, WeaponId::Shotgun);
        p.cycle_weapon(1);
        assert_eq!(p.weapon().id, WeaponId::Pistol);
        p.cycle_weapon(-1);
        assert_eq!(p.weapon().id, WeaponId::Shotgun);
    }

    #[test]
    fn reload_refills_clip() {
        let mut slot = WeaponSlot::new(WeaponId::Pistol);
        assert!(!slot.start_reload(), "full clip");
        slot.clip = 0;
        assert!(slot.start_reload());
        slot.tick(WeaponId::Pistol.spec().reload + 0.01);
        assert_eq!(slot.clip, WeaponId::Pistol.spec().clip);
        assert!(!slot.is_reloading());
    }

    #[test]
    fn items_stack_multiplicatively() {
        let mut p = player();
        p.take_item(ItemId::Whetstone);
        p.take_item(ItemId::Whetstone);
        assert!((p.passives.damage_mult - 1.44).abs() < 1e-5);
        assert_eq!(p.items.len(), 2);
    }
}
