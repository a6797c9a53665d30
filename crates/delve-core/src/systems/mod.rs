//! Systems - per-tick logic over the player and the active room's entities
//!
//! Each system takes the pieces of state it touches explicitly and reports
//! side effects into a shared [`Feedback`] sink. The engine calls them in a
//! fixed order.

mod combat;
mod enemy_ai;
mod interaction;
mod loot;
mod pickups;
mod player;
mod projectiles;
mod status;

pub use combat::*;
pub use enemy_ai::*;
pub use interaction::*;
pub use loot::*;
pub use pickups::*;
pub use player::*;
pub use projectiles::*;
pub use status::*;

use crate::events::Effect;

/// Everything a tick produced besides state changes.
#[derive(Debug, Default)]
pub struct Feedback {
    pub effects: Vec<Effect>,
    /// Strongest camera shake requested this tick.
    pub shake: f32,
    pub message: Option<&'static str>,
    pub kills: u32,
    pub score: u64,
    /// The player touched a portal.
    pub portal: bool,
}

impl Feedback {
    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn shake(&mut self, amount: f32) {
        self.shake = self.shake.max(amount);
    }

    pub fn say(&mut self, text: &'static str) {
        self.message = Some(text);
    }
}
