//! Pure dungeon logic for Delve.
//!
//! Everything in this crate is independent of the live entity simulation:
//! functions take plain data and return results, so the room graph, tile
//! generator, door protocol and collision kernel can be unit-tested without
//! spinning up a `World`.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`collision`] | Circle-vs-tile collision and per-axis movement resolution |
//! | [`constants`] | Room grid dimensions, tile size, door geometry |
//! | [`doors`] | Door states, trigger bands, committed-crossing detection |
//! | [`graph`] | Lazily expanding room graph with pure special-room placement |
//! | [`math`] | `Vec2`, smoothing and angle helpers, circle/rect primitives |
//! | [`tiles`] | `TileKind`, `TileMap`, per-room tile generation |

pub mod collision;
pub mod constants;
pub mod doors;
pub mod graph;
pub mod math;
pub mod tiles;

pub use doors::{Direction, DoorSet, DoorState};
pub use graph::{Coord, RoomGraph, RoomKind, RoomNode};
pub use math::Vec2;
pub use tiles::{TileKind, TileMap};
