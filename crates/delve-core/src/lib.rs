//! Delve Core - room-based dungeon shooter simulation
//!
//! A single run: a lazily expanding graph of rooms, one active room whose
//! enemies, bullets and pickups are simulated every tick, and frozen
//! snapshots of every room the player has left.
//!
//! # Architecture
//!
//! The active room's live entities sit in a `hecs` world:
//! - **Entities**: enemies, bullets, pickups, decals
//! - **Components**: plain data (`Body`, `Enemy`, `Bullet`, `Pickup`, ...)
//! - **Systems**: free functions run in a fixed order by [`engine::World::advance`]
//!
//! The player, the room graph and the tile maps live outside the ECS.
//! Leaving a room captures its entities into a [`room::RoomSnapshot`];
//! returning restores them exactly. Bullets are never kept.
//!
//! # Example
//!
//! ```rust,no_run
//! use delve_core::prelude::*;
//!
//! let mut world = World::new(Tuning::default(), 42);
//! let intents = Intents::walk(Vec2::new(0.0, -1.0));
//! while !world.is_over() {
//!     for effect in world.advance(1.0 / 60.0, &intents) {
//!         println!("{:?}", effect);
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod input;
pub mod items;
pub mod persistence;
pub mod player;
pub mod room;
pub mod spawn;
pub mod systems;
pub mod view;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::Tuning;
    pub use crate::engine::{RunState, World};
    pub use crate::events::Effect;
    pub use crate::input::Intents;
    pub use crate::items::{ItemId, ShopOffer, WeaponId};
    pub use crate::persistence::{RunSummary, SaveError};
    pub use crate::player::Player;
    pub use crate::view::StateView;
    pub use delve_logic::{Coord, Direction, RoomKind, Vec2};
}
