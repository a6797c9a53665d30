//! Lazily expanding room graph.
//!
//! Nodes live on an integer grid and are created the first time they are
//! referenced. Special rooms are placed by [`classify`], a pure function of
//! the coordinate, so the dungeon can be explored in any order and every
//! re-derivation agrees with the first one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::doors::{Direction, DoorSet};

/// Integer grid coordinate of a room. `(0, 0)` is the start room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance from the origin, saturating at `u32::MAX`.
    pub fn depth(self) -> u32 {
        u32::try_from(self.wide_depth()).unwrap_or(u32::MAX)
    }

    /// Exact Manhattan distance; never overflows.
    pub fn wide_depth(self) -> u64 {
        u64::from(self.x.unsigned_abs()) + u64::from(self.y.unsigned_abs())
    }

    /// Neighbor in `dir`. Saturates at the edge of the `i32` grid.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Room kind, fixed at node creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Start,
    Combat,
    Elite,
    Shop,
    Heal,
    Armory,
    Key,
    Treasure,
    Boss,
}

impl RoomKind {
    /// Rooms that spawn enemies and keep their doors shut until cleared.
    pub fn is_combat(self) -> bool {
        matches!(
            self,
            RoomKind::Combat | RoomKind::Elite | RoomKind::Key | RoomKind::Boss
        )
    }

    /// Rooms that are open and cleared from the moment they are generated.
    pub fn is_peaceful(self) -> bool {
        !self.is_combat()
    }
}

/// Room-scoped one-shot usage flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    pub fountain_used: bool,
    pub armory_used: bool,
}

/// Graph-level record of one dungeon cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNode {
    pub coord: Coord,
    pub kind: RoomKind,
    pub depth: u32,
    pub cleared: bool,
    /// Revealed on the minimap (adjacent to a visited room).
    pub seen: bool,
    /// Entered at least once.
    pub visited: bool,
    /// Treasure rooms stay locked until a key is spent on them.
    pub locked: bool,
    pub flags: NodeFlags,
    /// Directions in which a neighbor node has been linked.
    pub links: DoorSet,
}

impl RoomNode {
    fn new(coord: Coord, max_depth: u32) -> Self {
        let kind = classify(coord, max_depth);
        Self {
            coord,
            kind,
            depth: coord.depth(),
            cleared: false,
            seen: false,
            visited: false,
            locked: kind == RoomKind::Treasure,
            flags: NodeFlags::default(),
            links: DoorSet::EMPTY,
        }
    }
}

/// Whether `c` is extremal point `i` of ring `d`, compared without
/// narrowing so rings beyond the `i32` range stay exact.
fn is_extremal(c: Coord, d: u64, i: u64) -> bool {
    let (x, y) = (i64::from(c.x), i64::from(c.y));
    let d = d as i64;
    match i % 4 {
        0 => (x, y) == (d, 0),
        1 => (x, y) == (0, d),
        2 => (x, y) == (-d, 0),
        _ => (x, y) == (0, -d),
    }
}

/// Sparse hash marking rare armory cells.
fn armory_hash(c: Coord, d: i64) -> bool {
    (31 * c.x as i64 + 17 * c.y as i64 + 13 * d).rem_euclid(11) == 0
}

/// Sparse hash marking elite cells.
fn elite_hash(c: Coord, d: i64) -> bool {
    (7 * c.x as i64 + 23 * c.y as i64 + 5 * d).rem_euclid(13) == 0
}

/// Assign a room kind from the coordinate alone.
///
/// Precedence: Start, Boss, Shop, Heal, Treasure/Key, Armory, Elite, Combat.
/// Each ring uses distinct extremal slots for its singleton rooms, so a ring
/// never holds more than one shop, heal, boss, or treasure/key room.
pub fn classify(coord: Coord, max_depth: u32) -> RoomKind {
    let d = coord.wide_depth();
    if d == 0 {
        return RoomKind::Start;
    }
    if d == u64::from(max_depth) && is_extremal(coord, d, d + 1) {
        return RoomKind::Boss;
    }
    if is_extremal(coord, d, d) {
        return RoomKind::Shop;
    }
    if d >= 2 && is_extremal(coord, d, d + 2) {
        return RoomKind::Heal;
    }
    if is_extremal(coord, d, d + 3) {
        if d % 2 == 0 {
            return RoomKind::Treasure;
        }
        return RoomKind::Key;
    }
    if armory_hash(coord, d as i64) {
        return RoomKind::Armory;
    }
    if d >= 2 && elite_hash(coord, d as i64) {
        return RoomKind::Elite;
    }
    RoomKind::Combat
}

/// The bounded, lazily materialized room graph of one floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomGraph {
    max_depth: u32,
    nodes: HashMap<Coord, RoomNode>,
}

impl RoomGraph {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            nodes: HashMap::new(),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.wide_depth() <= u64::from(self.max_depth)
    }

    /// Existing node, or a freshly classified one.
    pub fn ensure_node(&mut self, coord: Coord) -> &mut RoomNode {
        let max_depth = self.max_depth;
        self.nodes
            .entry(coord)
            .or_insert_with(|| RoomNode::new(coord, max_depth))
    }

    /// Create and link every in-bound cardinal neighbor of `coord`.
    ///
    /// Neighbors beyond `max_depth` are never created. Linked neighbors are
    /// marked seen so the minimap can show them.
    pub fn expand_neighbors(&mut self, coord: Coord) -> DoorSet {
        self.ensure_node(coord);
        let mut linked = DoorSet::EMPTY;
        for dir in Direction::ALL {
            let next = coord.step(dir);
            if !self.in_bounds(next) {
                continue;
            }
            let neighbor = self.ensure_node(next);
            neighbor.links.insert(dir.opposite());
            neighbor.seen = true;
            linked.insert(dir);
        }
        if let Some(node) = self.nodes.get_mut(&coord) {
            for dir in linked.iter() {
                node.links.insert(dir);
            }
        }
        linked
    }

    pub fn node(&self, coord: Coord) -> Option<&RoomNode> {
        self.nodes.get(&coord)
    }

    pub fn node_mut(&mut self, coord: Coord) -> Option<&mut RoomNode> {
        self.nodes.get_mut(&coord)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All materialized nodes in coordinate order (for minimap rendering).
    pub fn nodes(&self) -> Vec<&RoomNode> {
        let mut v: Vec<&RoomNode> = self.nodes.values().collect();
        v.sort_by_key(|n| n.coord);
        v
    }

    /// Number of cells that exist within the bound (the full diamond).
    pub fn capacity(&self) -> usize {
        let d = self.max_depth as usize;
        2 * d * (d + 1) + 1
    }
}
