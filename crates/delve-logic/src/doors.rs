//! Door states and the committed-crossing protocol.
//!
//! A door is reached through a 1-tile doorway carved in the boundary wall.
//! Standing near a doorway is not enough to leave the room: a crossing
//! commits only when the player is inside the door's trigger band, moving
//! outward, and the projected leading edge would pass the boundary.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DOOR_BAND_DEPTH, DOOR_BAND_HALF_WIDTH, ENTRY_INSET, ROOM_H, ROOM_PX_H, ROOM_PX_W, ROOM_W, TILE,
};
use crate::math::{Rect, Vec2};

/// Cardinal direction. North is toward negative `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Grid offset of the neighbor in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Outward unit normal of the wall this door sits on.
    pub fn outward(self) -> Vec2 {
        let (x, y) = self.offset();
        Vec2::new(x as f32, y as f32)
    }

    fn bit(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::South => 2,
            Direction::East => 4,
            Direction::West => 8,
        }
    }
}

/// Bitset over the four cardinal directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorSet(u8);

impl DoorSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.bit();
    }

    pub fn with(mut self, dir: Direction) -> Self {
        self.insert(dir);
        self
    }

    /// Directions in `self` but not in `other`.
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True if every direction in `self` is also in `other`.
    pub fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

/// Per-direction door state as seen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Open,
    /// Neighbor exists but the room's clear state keeps the door shut.
    Closed,
    /// No neighbor in this direction.
    Absent,
}

pub fn door_state(neighbors: DoorSet, open: DoorSet, dir: Direction) -> DoorState {
    if !neighbors.contains(dir) {
        DoorState::Absent
    } else if open.contains(dir) {
        DoorState::Open
    } else {
        DoorState::Closed
    }
}

/// Tile coordinate of the doorway carved through the boundary wall.
pub fn doorway_tile(dir: Direction) -> (usize, usize) {
    match dir {
        Direction::North => (ROOM_W / 2, 0),
        Direction::South => (ROOM_W / 2, ROOM_H - 1),
        Direction::West => (0, ROOM_H / 2),
        Direction::East => (ROOM_W - 1, ROOM_H / 2),
    }
}

/// Interior tile next to the doorway that carries the door marker.
pub fn marker_tile(dir: Direction) -> (usize, usize) {
    match dir {
        Direction::North => (ROOM_W / 2, 1),
        Direction::South => (ROOM_W / 2, ROOM_H - 2),
        Direction::West => (1, ROOM_H / 2),
        Direction::East => (ROOM_W - 2, ROOM_H / 2),
    }
}

/// Door center line position on the boundary, in world units.
pub fn door_center(dir: Direction) -> Vec2 {
    let (tx, ty) = doorway_tile(dir);
    let cx = (tx as f32 + 0.5) * TILE;
    let cy = (ty as f32 + 0.5) * TILE;
    match dir {
        Direction::North => Vec2::new(cx, 0.0),
        Direction::South => Vec2::new(cx, ROOM_PX_H),
        Direction::West => Vec2::new(0.0, cy),
        Direction::East => Vec2::new(ROOM_PX_W, cy),
    }
}

/// Trigger band rectangle of a door, inside the room.
pub fn trigger_band(dir: Direction) -> Rect {
    let c = door_center(dir);
    let hw = DOOR_BAND_HALF_WIDTH;
    match dir {
        Direction::North => Rect::new(c.x - hw, 0.0, hw * 2.0, DOOR_BAND_DEPTH),
        Direction::South => Rect::new(c.x - hw, ROOM_PX_H - DOOR_BAND_DEPTH, hw * 2.0, DOOR_BAND_DEPTH),
        Direction::West => Rect::new(0.0, c.y - hw, DOOR_BAND_DEPTH, hw * 2.0),
        Direction::East => Rect::new(ROOM_PX_W - DOOR_BAND_DEPTH, c.y - hw, DOOR_BAND_DEPTH, hw * 2.0),
    }
}

/// Outcome of the per-tick door-intent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorIntent {
    None,
    /// Pushing outward against a closed door.
    Locked(Direction),
    /// Committed crossing through an open door.
    Cross(Direction),
    /// Pushing outward where the wall has no door at all.
    Blocked(Direction),
}

/// Signed distance the leading edge of a circle at `pos` sits past the boundary.
fn leading_edge_past(dir: Direction, pos: Vec2, radius: f32) -> f32 {
    match dir {
        Direction::North => -(pos.y - radius),
        Direction::South => pos.y + radius - ROOM_PX_H,
        Direction::West => -(pos.x - radius),
        Direction::East => pos.x + radius - ROOM_PX_W,
    }
}

/// Decide whether the player is committing to a door this tick.
///
/// Runs before collision. `vel` is the player's own movement velocity;
/// knockback must not be folded in, so being shoved toward a wall never
/// counts as a crossing.
pub fn check_door_intent(
    pos: Vec2,
    vel: Vec2,
    dt: f32,
    radius: f32,
    neighbors: DoorSet,
    open: DoorSet,
) -> DoorIntent {
    for dir in Direction::ALL {
        if !trigger_band(dir).contains(pos) {
            continue;
        }
        if vel.dot(&dir.outward()) <= 0.0 {
            continue;
        }
        match door_state(neighbors, open, dir) {
            DoorState::Absent => return DoorIntent::Blocked(dir),
            DoorState::Closed => return DoorIntent::Locked(dir),
            DoorState::Open => {
                let next = pos + vel * dt;
                if leading_edge_past(dir, next, radius) > 0.0 {
                    return DoorIntent::Cross(dir);
                }
            }
        }
    }
    DoorIntent::None
}

/// Where the player lands after crossing the door `via` of the previous room.
///
/// The new room is entered through its opposite door; the perpendicular
/// coordinate is kept but clamped to the walkable interior.
pub fn entry_position(via: Direction, pos: Vec2, radius: f32) -> Vec2 {
    let min_x = TILE + radius;
    let max_x = ROOM_PX_W - TILE - radius;
    let min_y = TILE + radius;
    let max_y = ROOM_PX_H - TILE - radius;
    match via {
        Direction::North => Vec2::new(pos.x.clamp(min_x, max_x), ROOM_PX_H - ENTRY_INSET),
        Direction::South => Vec2::new(pos.x.clamp(min_x, max_x), ENTRY_INSET),
        Direction::West => Vec2::new(ROOM_PX_W - ENTRY_INSET, pos.y.clamp(min_y, max_y)),
        Direction::East => Vec2::new(ENTRY_INSET, pos.y.clamp(min_y, max_y)),
    }
}
