//! Presentation feedback: one-shot effects and the transient message line.

use delve_logic::doors::Direction;
use delve_logic::graph::{Coord, RoomKind};
use delve_logic::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::{Archetype, PickupKind};
use crate::items::{ShopOffer, WeaponId};

/// Something that happened during a tick, for sounds and particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    RoomEntered { coord: Coord, kind: RoomKind },
    DoorLocked(Direction),
    NeedKey,
    KeyUsed,
    RoomCleared(Coord),
    EnemyKilled { pos: Vec2, archetype: Archetype, elite: bool },
    PlayerHurt { amount: f32 },
    Shot { weapon: WeaponId },
    Explosion { pos: Vec2, radius: f32 },
    PickedUp(PickupKind),
    Purchased(ShopOffer),
    FloorAdvanced(u32),
    RunEnded,
}

pub const MSG_DOOR_SEALED: &str = "The door is sealed";
pub const MSG_NEED_KEY: &str = "You need a key";
pub const MSG_NO_COINS: &str = "Not enough coins";
pub const MSG_FOUNTAIN_DRY: &str = "The fountain is dry";
pub const MSG_RACK_EMPTY: &str = "The rack is empty";
pub const MSG_RELOADING: &str = "Reloading";
pub const MSG_CLIP_FULL: &str = "Clip is full";
pub const MSG_NO_DOOR: &str = "There is no way through";

/// Transient on-screen text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub ttl: f32,
}

impl Message {
    pub fn new(text: impl Into<String>, ttl: f32) -> Self {
        Self {
            text: text.into(),
            ttl,
        }
    }

    /// Age the message; returns false once it has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.ttl -= dt;
        self.ttl > 0.0
    }
}
