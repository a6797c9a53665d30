//! Materialized rooms: tiles, door state, and the frozen-entity cache.
//!
//! Only the active room has a live ECS world. When the player leaves, its
//! enemies, pickups and decals are captured into a [`RoomSnapshot`] value
//! and the world is dropped; re-entering restores the snapshot verbatim.
//! Bullets are never captured.

use delve_logic::collision::{tile_center, Solids};
use delve_logic::constants::{ROOM_H, ROOM_W, SPAWN_DOOR_CLEARANCE, TILE};
use delve_logic::doors::{door_state, doorway_tile, Direction, DoorSet, DoorState};
use delve_logic::graph::{Coord, RoomKind, RoomNode};
use delve_logic::math::Vec2;
use delve_logic::tiles::{generate_tiles, room_seed, TileKind, TileMap};
use hecs::World;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::Tuning;
use crate::items::{ItemId, ShopOffer};
use crate::spawn::{effective_depth, spawn_enemy, spawn_pickup};

/// Spawn tile attempts per enemy before the spawn is dropped.
const SPAWN_ATTEMPTS: u32 = 40;

/// Interactive fixture standing at the center of some peaceful rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fixture {
    Fountain,
    WeaponRack,
}

impl Fixture {
    pub fn for_kind(kind: RoomKind) -> Option<Fixture> {
        match kind {
            RoomKind::Heal => Some(Fixture::Fountain),
            RoomKind::Armory => Some(Fixture::WeaponRack),
            _ => None,
        }
    }
}

pub fn room_center() -> Vec2 {
    let (x, y) = delve_logic::constants::room_center();
    Vec2::new(x, y)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyRecord {
    pub body: Body,
    pub enemy: Enemy,
    pub status: StatusEffects,
    pub knockback: Knockback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRecord {
    pub body: Body,
    pub pickup: Pickup,
}

/// Frozen contents of a room the player is not in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub enemies: Vec<EnemyRecord>,
    pub pickups: Vec<PickupRecord>,
    pub decals: Vec<Decal>,
}

impl RoomSnapshot {
    /// Copy every cacheable entity out of a live world.
    pub fn capture(world: &World) -> Self {
        let enemies = world
            .query::<(&Body, &Enemy, &StatusEffects, &Knockback)>()
            .iter()
            .map(|(_, (body, enemy, status, knockback))| EnemyRecord {
                body: *body,
                enemy: enemy.clone(),
                status: *status,
                knockback: *knockback,
            })
            .collect();
        let pickups = world
            .query::<(&Body, &Pickup)>()
            .iter()
            .map(|(_, (body, pickup))| PickupRecord {
                body: *body,
                pickup: *pickup,
            })
            .collect();
        let decals = world.query::<&Decal>().iter().map(|(_, d)| *d).collect();
        Self {
            enemies,
            pickups,
            decals,
        }
    }

    /// Rebuild a live world holding exactly the captured entities.
    pub fn restore(&self) -> World {
        let mut world = World::new();
        for r in &self.enemies {
            world.spawn((r.body, r.enemy.clone(), r.status, r.knockback));
        }
        for r in &self.pickups {
            world.spawn((r.body, r.pickup));
        }
        for d in &self.decals {
            world.spawn((*d,));
        }
        world
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty() && self.pickups.is_empty() && self.decals.is_empty()
    }
}

/// A materialized room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub coord: Coord,
    pub kind: RoomKind,
    pub tiles: TileMap,
    neighbors: DoorSet,
    doors_open: DoorSet,
    /// First-visit population has run.
    pub populated: bool,
    /// Contents stored when the player last left.
    pub cache: Option<RoomSnapshot>,
}

impl Room {
    /// Generate the tile grid for a node whose links are final.
    pub fn generate(node: &RoomNode, floor_seed: u64) -> Self {
        let tiles = generate_tiles(node.kind, node.links, room_seed(floor_seed, node.coord));
        Self {
            coord: node.coord,
            kind: node.kind,
            tiles,
            neighbors: node.links,
            doors_open: node.links,
            populated: false,
            cache: None,
        }
    }

    pub fn neighbors(&self) -> DoorSet {
        self.neighbors
    }

    pub fn doors_open(&self) -> DoorSet {
        self.doors_open
    }

    /// Open or close one door. Directions without a neighbor stay closed.
    pub fn set_door_open(&mut self, dir: Direction, open: bool) {
        if open && self.neighbors.contains(dir) {
            self.doors_open.insert(dir);
        } else {
            self.doors_open.remove(dir);
        }
    }

    pub fn set_all_doors(&mut self, open: bool) {
        for dir in Direction::ALL {
            self.set_door_open(dir, open);
        }
    }

    pub fn door_state(&self, dir: Direction) -> DoorState {
        door_state(self.neighbors, self.doors_open, dir)
    }

    /// Collision view with every non-open doorway sealed.
    pub fn solids(&self) -> Solids<'_> {
        Solids::new(&self.tiles, DoorSet::ALL.difference(self.doors_open))
    }

    pub fn fixture(&self) -> Option<Fixture> {
        Fixture::for_kind(self.kind)
    }

    /// First-visit population. Returns the number of enemies spawned.
    pub fn populate(
        &mut self,
        world: &mut World,
        depth: u32,
        floor: u32,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> usize {
        self.populated = true;
        let eff = effective_depth(depth, floor);
        let center = room_center();
        let mut spawned = 0;

        match self.kind {
            RoomKind::Start | RoomKind::Heal | RoomKind::Armory => {}
            RoomKind::Shop => {
                let item = *ItemId::all().choose(rng).unwrap_or(&ItemId::Whetstone);
                let offers = [ShopOffer::Heart, ShopOffer::Key, ShopOffer::Item(item)];
                for (i, offer) in offers.into_iter().enumerate() {
                    let x = center.x + (i as f32 - 1.0) * 2.0 * TILE;
                    spawn_pickup(world, PickupKind::ShopSlot(offer), Vec2::new(x, center.y - TILE));
                }
            }
            RoomKind::Treasure => {
                let item = *ItemId::all().choose(rng).unwrap_or(&ItemId::LuckyCharm);
                spawn_pickup(world, PickupKind::Item(item), center + Vec2::new(-TILE, 0.0));
                spawn_pickup(world, PickupKind::Chest, center + Vec2::new(TILE, 0.0));
            }
            RoomKind::Combat | RoomKind::Key => {
                let e = &tuning.enemies;
                let count = (e.base_count + depth / 2 + floor.saturating_sub(1)).min(e.max_count);
                for _ in 0..count {
                    spawned += self.spawn_regular(world, false, eff, tuning, rng);
                }
            }
            RoomKind::Elite => {
                for _ in 0..2 + depth / 3 {
                    spawned += self.spawn_regular(world, true, eff, tuning, rng);
                }
                spawned += self.spawn_regular(world, false, eff, tuning, rng);
            }
            RoomKind::Boss => {
                spawn_enemy(world, Archetype::Boss, false, center, eff, tuning, rng);
                spawned += 1;
            }
        }

        log::debug!(
            "Populated {:?} room at ({}, {}) with {} enemies",
            self.kind,
            self.coord.x,
            self.coord.y,
            spawned
        );
        spawned
    }

    fn spawn_regular(&self, world: &mut World, elite: bool, eff: u32, tuning: &Tuning, rng: &mut impl Rng) -> usize {
        let archetype = *Archetype::regular().choose(rng).unwrap_or(&Archetype::Chaser);
        match pick_spawn_point(&self.tiles, self.neighbors, rng) {
            Some(pos) => {
                spawn_enemy(world, archetype, elite, pos, eff, tuning, rng);
                1
            }
            None => 0,
        }
    }
}

/// Whether an interior tile may hold a freshly spawned enemy.
pub fn is_spawn_tile(tiles: &TileMap, neighbors: DoorSet, x: i32, y: i32) -> bool {
    if !matches!(tiles.get(x, y), TileKind::Floor | TileKind::Rug) {
        return false;
    }
    let (cx, cy) = ((ROOM_W / 2) as i32, (ROOM_H / 2) as i32);
    if (x - cx).abs() <= 1 && (y - cy).abs() <= 1 {
        return false;
    }
    neighbors.iter().all(|dir| {
        let (dx, dy) = doorway_tile(dir);
        let dist = (x - dx as i32).abs().max((y - dy as i32).abs());
        dist > SPAWN_DOOR_CLEARANCE
    })
}

/// Random spawn position, or `None` after a bounded number of misses.
pub fn pick_spawn_point(tiles: &TileMap, neighbors: DoorSet, rng: &mut impl Rng) -> Option<Vec2> {
    for _ in 0..SPAWN_ATTEMPTS {
        let x = rng.gen_range(1..ROOM_W as i32 - 1);
        let y = rng.gen_range(1..ROOM_H as i32 - 1);
        if is_spawn_tile(tiles, neighbors, x, y) {
            return Some(tile_center(x, y));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::spawn_decal;
    use delve_logic::graph::RoomGraph;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn room_at(coord: Coord) -> Room {
        let mut g = RoomGraph::new(6);
        g.expand_neighbors(coord);
        let node = g.node(coord).cloned().expect("expanded");
        Room::generate(&node, 9)
    }

    #[test]
    fn doors_open_never_exceeds_neighbors() {
        let mut room = room_at(Coord::new(0, -6));
        let neighbors = room.neighbors();
        assert!(!neighbors.contains(Direction::North));
        room.set_all_doors(true);
        assert!(room.doors_open().is_subset(neighbors));
        room.set_door_open(Direction::North, true);
        assert!(!room.doors_open().contains(Direction::North));
        room.set_all_doors(false);
        assert!(room.doors_open().is_empty());
    }

    #[test]
    fn closed_doors_are_sealed_for_collision() {
        let mut room = room_at(Coord::new(1, 1));
        room.set_door_open(Direction::North, false);
        let (x, y) = doorway_tile(Direction::North);
        assert_eq!(room.solids().tile(x as i32, y as i32), TileKind::Wall);
        room.set_door_open(Direction::North, true);
        assert_eq!(room.solids().tile(x as i32, y as i32), TileKind::Floor);
    }

    #[test]
    fn spawn_points_keep_clear_of_doors_and_center() {
        let room = room_at(Coord::new(-1, 0));
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            if let Some(p) = pick_spawn_point(&room.tiles, room.neighbors(), &mut rng) {
                let (tx, ty) = ((p.x / TILE) as i32, (p.y / TILE) as i32);
                assert!(is_spawn_tile(&room.tiles, room.neighbors(), tx, ty));
                for dir in room.neighbors().iter() {
                    let (dx, dy) = doorway_tile(dir);
                    assert!((tx - dx as i32).abs().max((ty - dy as i32).abs()) > SPAWN_DOOR_CLEARANCE);
                }
            }
        }
    }

    #[test]
    fn combat_population_count() {
        let t = Tuning::default();
        let mut room = room_at(Coord::new(-1, 0));
        assert_eq!(room.kind, RoomKind::Combat);
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        let n = room.populate(&mut w, 1, 1, &t, &mut rng);
        assert!(room.populated);
        assert!(n <= 3);
        assert_eq!(n, crate::spawn::enemy_count(&w));
    }

    #[test]
    fn shop_gets_three_offers() {
        let t = Tuning::default();
        let mut room = room_at(Coord::new(0, 1));
        assert_eq!(room.kind, RoomKind::Shop);
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(room.populate(&mut w, 1, 1, &t, &mut rng), 0);
        let slots = w
            .query::<&Pickup>()
            .iter()
            .filter(|(_, p)| matches!(p.kind, PickupKind::ShopSlot(_)))
            .count();
        assert_eq!(slots, 3);
    }

    #[test]
    fn snapshot_roundtrip_is_exact() {
        let t = Tuning::default();
        let mut room = room_at(Coord::new(-1, 0));
        let mut w = World::new();
        let mut rng = StdRng::seed_from_u64(11);
        room.populate(&mut w, 1, 1, &t, &mut rng);
        spawn_pickup(&mut w, PickupKind::Coin, Vec2::new(70.0, 70.0));
        spawn_decal(&mut w, Vec2::new(90.0, 90.0), 6.0, DecalKind::Scorch, 8);

        let snap = RoomSnapshot::capture(&w);
        assert!(!snap.is_empty());
        let restored = snap.restore();
        assert_eq!(RoomSnapshot::capture(&restored), snap);
    }

    #[test]
    fn bullets_are_not_captured() {
        let mut w = World::new();
        let (body, bullet) = crate::spawn::enemy_bullet(Vec2::new(10.0, 10.0), Vec2::ZERO, 1.0);
        crate::spawn::spawn_bullet(&mut w, body, bullet);
        assert!(RoomSnapshot::capture(&w).is_empty());
    }

    #[test]
    fn fixtures_follow_room_kind() {
        assert_eq!(Fixture::for_kind(RoomKind::Heal), Some(Fixture::Fountain));
        assert_eq!(Fixture::for_kind(RoomKind::Armory), Some(Fixture::WeaponRack));
        assert_eq!(Fixture::for_kind(RoomKind::Combat), None);
    }
}
