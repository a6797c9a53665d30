//! Tile grid of a single room and its one-shot generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::{ROOM_H, ROOM_W};
use crate::doors::{doorway_tile, marker_tile, Direction, DoorSet};
use crate::graph::{Coord, RoomKind};

/// Closed set of tile types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    Pit,
    DoorMarker,
    /// Collides as a disc centered in the tile, not a full block.
    Pillar,
    /// Walkable spikes that hurt the player.
    Hazard,
    /// Walkable decoration in peaceful rooms.
    Rug,
}

impl TileKind {
    /// Whether walkers (player, enemies) are stopped by this tile.
    pub fn blocks_movement(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Pit | TileKind::Pillar)
    }

    /// Whether bullets collide with this tile.
    pub fn blocks_projectiles(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Pit | TileKind::Pillar)
    }
}

/// Fixed-size `ROOM_W × ROOM_H` tile grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    tiles: Vec<TileKind>,
}

impl TileMap {
    pub fn filled(kind: TileKind) -> Self {
        Self {
            tiles: vec![kind; ROOM_W * ROOM_H],
        }
    }

    pub fn width(&self) -> usize {
        ROOM_W
    }

    pub fn height(&self) -> usize {
        ROOM_H
    }

    /// Tile at signed coordinates. Anything off the grid is a wall.
    pub fn get(&self, x: i32, y: i32) -> TileKind {
        if x < 0 || y < 0 || x as usize >= ROOM_W || y as usize >= ROOM_H {
            return TileKind::Wall;
        }
        self.tiles[y as usize * ROOM_W + x as usize]
    }

    pub fn set(&mut self, x: usize, y: usize, kind: TileKind) {
        if x < ROOM_W && y < ROOM_H {
            self.tiles[y * ROOM_W + x] = kind;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[TileKind]> {
        self.tiles.chunks(ROOM_W)
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| **t == kind).count()
    }
}

/// Per-room generator seed, a pure function of floor seed and coordinate.
pub fn room_seed(floor_seed: u64, coord: Coord) -> u64 {
    let mut h = floor_seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add((coord.x as i64 as u64).wrapping_mul(0x9E3779B97F4A7C15))
        .wrapping_add((coord.y as i64 as u64).wrapping_mul(0xC2B2AE3D27D4EB4F));
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h
}

struct Densities {
    pit: f64,
    hazard: f64,
    pillar: f64,
}

fn densities(kind: RoomKind) -> Densities {
    match kind {
        RoomKind::Combat | RoomKind::Elite => Densities {
            pit: 0.06,
            hazard: 0.02,
            pillar: 0.05,
        },
        RoomKind::Key => Densities {
            pit: 0.06,
            hazard: 0.0,
            pillar: 0.05,
        },
        RoomKind::Boss => Densities {
            pit: 0.0,
            hazard: 0.0,
            pillar: 0.05,
        },
        RoomKind::Start
        | RoomKind::Shop
        | RoomKind::Heal
        | RoomKind::Armory
        | RoomKind::Treasure => Densities {
            pit: 0.0,
            hazard: 0.0,
            pillar: 0.02,
        },
    }
}

/// Generate a room's tile grid from its kind and neighbor set.
///
/// Runs once per room, the first time it is materialized.
pub fn generate_tiles(kind: RoomKind, neighbors: DoorSet, seed: u64) -> TileMap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = TileMap::filled(TileKind::Wall);
    let dens = densities(kind);

    for y in 1..ROOM_H - 1 {
        for x in 1..ROOM_W - 1 {
            let roll: f64 = rng.gen();
            let tile = if roll < dens.pit {
                TileKind::Pit
            } else if roll < dens.pit + dens.hazard {
                TileKind::Hazard
            } else if roll < dens.pit + dens.hazard + dens.pillar {
                TileKind::Pillar
            } else {
                TileKind::Floor
            };
            map.set(x, y, tile);
        }
    }

    let cx = ROOM_W / 2;
    let cy = ROOM_H / 2;

    if kind.is_peaceful() {
        for y in cy - 2..=cy + 2 {
            for x in cx - 3..=cx + 3 {
                let ring = y == cy - 2 || y == cy + 2 || x == cx - 3 || x == cx + 3;
                if ring && map.get(x as i32, y as i32) == TileKind::Floor {
                    map.set(x, y, TileKind::Rug);
                }
            }
        }
    }

    // Spawn patch
    for y in cy - 1..=cy + 1 {
        for x in cx - 1..=cx + 1 {
            map.set(x, y, TileKind::Floor);
        }
    }

    for dir in neighbors.iter() {
        carve_doorway(&mut map, dir);
    }

    map
}

fn carve_doorway(map: &mut TileMap, dir: Direction) {
    let (dx, dy) = doorway_tile(dir);
    map.set(dx, dy, TileKind::Floor);
    let (mx, my) = marker_tile(dir);
    map.set(mx, my, TileKind::DoorMarker);
    // Keep the lane beside the marker walkable
    let lane = match dir {
        Direction::North | Direction::South => [(mx - 1, my), (mx + 1, my)],
        Direction::East | Direction::West => [(mx, my - 1), (mx, my + 1)],
    };
    for (x, y) in lane {
        if map.get(x as i32, y as i32) != TileKind::Wall {
            map.set(x, y, TileKind::Floor);
        }
    }
    // And the tile just past the marker
    let (ox, oy) = dir.opposite().offset();
    let (px, py) = ((mx as i32 + ox) as usize, (my as i32 + oy) as usize);
    if map.get(px as i32, py as i32).blocks_movement() {
        map.set(px, py, TileKind::Floor);
    }
}
