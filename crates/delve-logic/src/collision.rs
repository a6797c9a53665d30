//! Circle-vs-tile collision.
//!
//! Algorithm: "axis then bisect"
//! 1. Move along X alone; if the circle now overlaps a solid tile, bisect
//!    the step to the furthest free fraction and flag the axis as blocked
//! 2. Repeat for Y from the resolved X position
//!
//! Walls, pits and sealed doorways are full-tile blocks; pillars are discs.
//! Anything off the grid is solid, so nothing escapes the room.

use crate::constants::{PILLAR_RADIUS, TILE};
use crate::doors::{doorway_tile, DoorSet};
use crate::math::{circle_rect_overlap, circles_overlap, Rect, Vec2};
use crate::tiles::{TileKind, TileMap};

/// Which collision predicate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Walker,
    Projectile,
}

/// Read-only view of a room's solid geometry for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Solids<'a> {
    pub map: &'a TileMap,
    /// Directions whose doorway tile is currently shut.
    pub sealed: DoorSet,
}

impl<'a> Solids<'a> {
    pub fn new(map: &'a TileMap, sealed: DoorSet) -> Self {
        Self { map, sealed }
    }

    /// Tile at `(tx, ty)` after applying sealed doorways.
    pub fn tile(&self, tx: i32, ty: i32) -> TileKind {
        for dir in self.sealed.iter() {
            let (dx, dy) = doorway_tile(dir);
            if dx as i32 == tx && dy as i32 == ty {
                return TileKind::Wall;
            }
        }
        self.map.get(tx, ty)
    }

    fn blocks(&self, kind: TileKind, layer: Layer) -> bool {
        match layer {
            Layer::Walker => kind.blocks_movement(),
            Layer::Projectile => kind.blocks_projectiles(),
        }
    }

    /// True if a circle at `pos` overlaps any solid tile.
    pub fn overlaps(&self, pos: Vec2, radius: f32, layer: Layer) -> bool {
        let x0 = ((pos.x - radius) / TILE).floor() as i32;
        let x1 = ((pos.x + radius) / TILE).floor() as i32;
        let y0 = ((pos.y - radius) / TILE).floor() as i32;
        let y1 = ((pos.y + radius) / TILE).floor() as i32;
        for ty in y0..=y1 {
            for tx in x0..=x1 {
                let kind = self.tile(tx, ty);
                if !self.blocks(kind, layer) {
                    continue;
                }
                let hit = if kind == TileKind::Pillar {
                    let c = tile_center(tx, ty);
                    circles_overlap(pos, radius, c, PILLAR_RADIUS)
                } else {
                    let rect = Rect::new(tx as f32 * TILE, ty as f32 * TILE, TILE, TILE);
                    circle_rect_overlap(pos, radius, &rect)
                };
                if hit {
                    return true;
                }
            }
        }
        false
    }

    /// Tile under a point.
    pub fn tile_at(&self, pos: Vec2) -> TileKind {
        self.tile((pos.x / TILE).floor() as i32, (pos.y / TILE).floor() as i32)
    }
}

/// World-space center of tile `(tx, ty)`.
pub fn tile_center(tx: i32, ty: i32) -> Vec2 {
    Vec2::new((tx as f32 + 0.5) * TILE, (ty as f32 + 0.5) * TILE)
}

/// Result of a resolved move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub pos: Vec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

const BISECT_STEPS: u32 = 6;

fn resolve_axis(solids: &Solids, from: Vec2, step: Vec2, radius: f32, layer: Layer) -> (Vec2, bool) {
    let full = from + step;
    if !solids.overlaps(full, radius, layer) {
        return (full, false);
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    for _ in 0..BISECT_STEPS {
        let mid = (lo + hi) * 0.5;
        if solids.overlaps(from + step * mid, radius, layer) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (from + step * lo, true)
}

/// Move a circle by `delta`, resolving each axis separately.
///
/// A circle that already overlaps geometry (spawned on a pillar edge, say)
/// moves freely until it is clear, so it can never get stuck.
pub fn move_and_collide(solids: &Solids, pos: Vec2, delta: Vec2, radius: f32, layer: Layer) -> MoveOutcome {
    if solids.overlaps(pos, radius, layer) {
        return MoveOutcome {
            pos: pos + delta,
            blocked_x: false,
            blocked_y: false,
        };
    }
    let (after_x, blocked_x) = resolve_axis(solids, pos, Vec2::new(delta.x, 0.0), radius, layer);
    let (after_y, blocked_y) = resolve_axis(solids, after_x, Vec2::new(0.0, delta.y), radius, layer);
    MoveOutcome {
        pos: after_y,
        blocked_x,
        blocked_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ROOM_H, ROOM_W};
    use crate::doors::{door_center, Direction};

    fn open_room() -> TileMap {
        let mut map = TileMap::filled(TileKind::Wall);
        for y in 1..ROOM_H - 1 {
            for x in 1..ROOM_W - 1 {
                map.set(x, y, TileKind::Floor);
            }
        }
        map
    }

    #[test]
    fn free_move_inside_room() {
        let map = open_room();
        let s = Solids::new(&map, DoorSet::EMPTY);
        let out = move_and_collide(&s, Vec2::new(100.0, 100.0), Vec2::new(5.0, -3.0), 10.0, Layer::Walker);
        assert_eq!(out.pos, Vec2::new(105.0, 97.0));
        assert!(!out.blocked_x && !out.blocked_y);
    }

    #[test]
    fn wall_blocks_and_slides() {
        let map = open_room();
        let s = Solids::new(&map, DoorSet::EMPTY);
        // Left wall inner edge at x = 32, radius 10 → stop near x = 42
        let out = move_and_collide(&s, Vec2::new(45.0, 100.0), Vec2::new(-20.0, 6.0), 10.0, Layer::Walker);
        assert!(out.blocked_x);
        assert!(!out.blocked_y);
        assert!(out.pos.x >= 42.0 && out.pos.x < 45.0, "x={}", out.pos.x);
        assert!((out.pos.y - 106.0).abs() < 1e-4);
    }

    #[test]
    fn pillar_is_a_disc() {
        let mut map = open_room();
        map.set(5, 5, TileKind::Pillar);
        let s = Solids::new(&map, DoorSet::EMPTY);
        let c = tile_center(5, 5);
        // Corner of the pillar tile is free space
        let corner = Vec2::new(5.0 * TILE + 1.0, 5.0 * TILE + 1.0);
        assert!(!s.overlaps(corner, 2.0, Layer::Walker));
        assert!(s.overlaps(c + Vec2::new(PILLAR_RADIUS + 1.0, 0.0), 2.0, Layer::Walker));
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let map = TileMap::filled(TileKind::Floor);
        let s = Solids::new(&map, DoorSet::EMPTY);
        assert!(s.overlaps(Vec2::new(5.0, 100.0), 10.0, Layer::Walker));
    }

    #[test]
    fn sealed_doorway_blocks() {
        let mut map = open_room();
        let (dx, dy) = doorway_tile(Direction::North);
        map.set(dx, dy, TileKind::Floor);
        let pos = Vec2::new(door_center(Direction::North).x, TILE + 12.0);
        let step = Vec2::new(0.0, -20.0);

        let open = Solids::new(&map, DoorSet::EMPTY);
        let free = move_and_collide(&open, pos, step, 10.0, Layer::Walker);
        assert!(!free.blocked_y);

        let sealed = Solids::new(&map, DoorSet::EMPTY.with(Direction::North));
        let blocked = move_and_collide(&sealed, pos, step, 10.0, Layer::Walker);
        assert!(blocked.blocked_y);
        assert!(blocked.pos.y >= TILE + 10.0 - 1e-3);
    }

    #[test]
    fn stuck_circle_can_escape() {
        let mut map = open_room();
        map.set(4, 4, TileKind::Pillar);
        let s = Solids::new(&map, DoorSet::EMPTY);
        let inside = tile_center(4, 4);
        let out = move_and_collide(&s, inside, Vec2::new(8.0, 0.0), 6.0, Layer::Walker);
        assert_eq!(out.pos, inside + Vec2::new(8.0, 0.0));
    }
}
