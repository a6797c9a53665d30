//! Room grid constants shared by the generator, collision and door logic.
//!
//! World units are pixels of an unscaled tile: `(0, 0)` is the top-left
//! corner of the room and `y` grows downward (south).

/// Edge length of one tile in world units.
pub const TILE: f32 = 32.0;

/// Room width in tiles.
pub const ROOM_W: usize = 15;

/// Room height in tiles.
pub const ROOM_H: usize = 11;

/// Room width in world units.
pub const ROOM_PX_W: f32 = ROOM_W as f32 * TILE;

/// Room height in world units.
pub const ROOM_PX_H: f32 = ROOM_H as f32 * TILE;

/// Collision radius of a pillar disc, centered in its tile.
pub const PILLAR_RADIUS: f32 = TILE * 0.38;

/// Trigger band half-width around a door's center line.
pub const DOOR_BAND_HALF_WIDTH: f32 = TILE * 0.75;

/// Trigger band depth measured inward from the room boundary.
pub const DOOR_BAND_DEPTH: f32 = TILE * 1.5;

/// Distance from the boundary at which a player is placed after crossing.
pub const ENTRY_INSET: f32 = TILE * 1.6;

/// Doorways closer than this (in tiles) reject enemy spawn positions.
pub const SPAWN_DOOR_CLEARANCE: i32 = 3;

/// Center of the room in world units.
pub fn room_center() -> (f32, f32) {
    (ROOM_PX_W / 2.0, ROOM_PX_H / 2.0)
}
