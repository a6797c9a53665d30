//! High-level player intents injected by the driver each tick.

use delve_logic::math::Vec2;
use serde::{Deserialize, Serialize};

/// What the player wants to do this tick. Raw device mapping happens
/// outside the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intents {
    /// Desired movement direction; longer than 1 is clamped.
    pub move_vector: Vec2,
    /// Aim target in room coordinates.
    pub aim_point: Vec2,
    pub fire_held: bool,
    pub dash_pressed: bool,
    pub interact_pressed: bool,
    pub reload_pressed: bool,
    /// −1 previous weapon, +1 next weapon, 0 none.
    pub weapon_cycle: i32,
}

impl Intents {
    /// Copy with NaN removed, the move vector clamped to unit length and
    /// the cycle step clamped to `-1..=1`.
    pub fn sanitized(&self) -> Self {
        Self {
            move_vector: self.move_vector.sanitized().clamp_length(1.0),
            aim_point: self.aim_point.sanitized(),
            weapon_cycle: self.weapon_cycle.clamp(-1, 1),
            ..*self
        }
    }

    /// Convenience for scripted drivers: walk in `dir`.
    pub fn walk(dir: Vec2) -> Self {
        Self {
            move_vector: dir,
            ..Self::default()
        }
    }
}
