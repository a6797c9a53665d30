//! Simulation engine - the `World` a driver owns and advances tick by tick

use std::collections::HashMap;

use delve_logic::doors::{check_door_intent, entry_position, Direction, DoorIntent};
use delve_logic::graph::{Coord, RoomGraph};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::Knockback;
use crate::config::{Tuning, TuningIssue};
use crate::events::{Effect, Message, MSG_DOOR_SEALED, MSG_NEED_KEY, MSG_NO_DOOR};
use crate::input::Intents;
use crate::persistence::{RunSummary, SaveData, SaveError};
use crate::player::Player;
use crate::room::{room_center, Room, RoomSnapshot};
use crate::spawn::{effective_depth, enemy_count};
use crate::systems::*;

/// Camera shake lost per second.
const SHAKE_DECAY: f32 = 30.0;
const CLEAR_SCORE: u64 = 50;
const FLOOR_SCORE: u64 = 500;

/// Running totals for the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub kills: u32,
    /// Simulated seconds.
    pub time: f32,
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunState {
    Playing,
    Ended(RunSummary),
}

/// Seed of a floor's tile layouts, mixed from the run seed.
fn floor_seed(seed: u64, floor: u32) -> u64 {
    let mut z = seed ^ (floor as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One run of the game: the floor graph, the active room and its live
/// entities, cached rooms, and the player.
pub struct World {
    pub(crate) tuning: Tuning,
    pub(crate) seed: u64,
    pub(crate) floor: u32,
    pub(crate) floor_seed: u64,
    pub(crate) graph: RoomGraph,
    /// Materialized rooms other than the active one.
    pub(crate) rooms: HashMap<Coord, Room>,
    pub(crate) room: Room,
    /// Live entities of the active room.
    pub(crate) entities: hecs::World,
    pub(crate) player: Player,
    pub(crate) rng: StdRng,
    pub(crate) message: Option<Message>,
    pub(crate) shake: f32,
    pub(crate) stats: RunStats,
    pub(crate) ticks: u64,
    pub(crate) state: RunState,
}

impl World {
    /// Start a run on floor 1 in the Start room.
    ///
    /// Invalid tuning values are repaired with a warning rather than
    /// rejected; use [`Tuning::from_json`] for strict loading.
    pub fn new(mut tuning: Tuning, seed: u64) -> Self {
        warn_repaired(&tuning.repair());
        let floor = 1;
        let fseed = floor_seed(seed, floor);
        let mut graph = RoomGraph::new(tuning.world.max_depth);
        let start = Coord::new(0, 0);
        graph.expand_neighbors(start);
        let room = Room::generate(graph.ensure_node(start), fseed);
        let player = Player::new(&tuning.player, room_center());

        let mut world = Self {
            tuning,
            seed,
            floor,
            floor_seed: fseed,
            graph,
            rooms: HashMap::new(),
            room,
            entities: hecs::World::new(),
            player,
            rng: StdRng::seed_from_u64(seed),
            message: None,
            shake: 0.0,
            stats: RunStats::default(),
            ticks: 0,
            state: RunState::Playing,
        };
        world.enter_room(start, &mut Feedback::default());
        world
    }

    /// Advance the simulation by `dt` seconds. Returns this tick's effects.
    ///
    /// `dt` is clamped to `[0, max_dt]` and NaN counts as zero. Once the run
    /// has ended this does nothing.
    pub fn advance(&mut self, dt: f32, intents: &Intents) -> Vec<Effect> {
        if self.is_over() {
            return Vec::new();
        }
        let dt = if dt.is_nan() {
            0.0
        } else {
            dt.clamp(0.0, self.tuning.world.max_dt)
        };
        let intents = intents.sanitized();
        let mut fb = Feedback::default();
        self.ticks += 1;
        self.stats.time += dt;

        // Door intent reads the player's own velocity, before collision
        steer_player(&mut self.player, &intents, &self.tuning.player, dt);
        let intent = check_door_intent(
            self.player.body.pos,
            self.player.body.vel,
            dt,
            self.player.body.radius,
            self.room.neighbors(),
            self.room.doors_open(),
        );
        match intent {
            DoorIntent::Locked(dir) => {
                if !self.message_is(MSG_DOOR_SEALED) {
                    fb.emit(Effect::DoorLocked(dir));
                }
                fb.say(MSG_DOOR_SEALED);
            }
            DoorIntent::Cross(dir) => self.cross(dir, &mut fb),
            DoorIntent::Blocked(_) => fb.say(MSG_NO_DOOR),
            DoorIntent::None => {}
        }

        let eff_depth = effective_depth(self.room.coord.depth(), self.floor);
        {
            let solids = self.room.solids();
            move_player(&mut self.player, &solids, dt);
            weapon_system(
                &mut self.player,
                &intents,
                &mut self.entities,
                &self.tuning,
                &mut self.rng,
                &mut fb,
            );
            enemy_ai_system(&mut self.entities, &self.player.body, &solids, &self.tuning, eff_depth, dt);
            projectile_system(
                &mut self.entities,
                &mut self.player,
                &solids,
                &self.tuning,
                dt,
                &mut self.rng,
                &mut fb,
            );
            contact_system(&mut self.entities, &mut self.player, &self.tuning, &mut fb);
            hazard_system(&mut self.player, &solids, &self.tuning, &mut fb);
        }
        pickup_system(&mut self.entities, &mut self.player, &self.tuning, dt, &mut fb);
        death_system(&mut self.entities, &self.player, &self.tuning, &mut self.rng, &mut fb);
        status_system(&mut self.entities, dt);
        self.player.tick_timers(dt, &self.tuning.player);

        self.check_clear(&mut fb);

        if intents.interact_pressed {
            let fixture = self.room.fixture();
            if let Some(node) = self.graph.node_mut(self.room.coord) {
                interaction_system(
                    &mut self.entities,
                    &mut self.player,
                    node,
                    fixture,
                    &self.tuning,
                    &mut self.rng,
                    &mut fb,
                );
            }
        }

        self.stats.kills += fb.kills;
        self.stats.score += fb.score;
        self.update_message(fb.message, dt);
        self.shake = (self.shake - SHAKE_DECAY * dt).max(0.0).max(fb.shake);

        if fb.portal && !self.player.is_dead() {
            self.advance_floor(&mut fb);
        }
        if self.player.is_dead() {
            self.end_run(&mut fb);
        }
        fb.effects
    }

    fn message_is(&self, text: &str) -> bool {
        self.message.as_ref().map_or(false, |m| m.text == text)
    }

    fn update_message(&mut self, said: Option<&'static str>, dt: f32) {
        match said {
            Some(text) => self.message = Some(Message::new(text, self.tuning.world.message_ttl)),
            None => {
                if let Some(m) = &mut self.message {
                    if !m.tick(dt) {
                        self.message = None;
                    }
                }
            }
        }
    }

    /// Committed crossing through an open door.
    fn cross(&mut self, dir: Direction, fb: &mut Feedback) {
        let target = self.room.coord.step(dir);
        let Some(node) = self.graph.node_mut(target) else {
            return;
        };
        if node.locked {
            if self.player.keys == 0 {
                if self.message.as_ref().map_or(true, |m| m.text != MSG_NEED_KEY) {
                    fb.emit(Effect::NeedKey);
                }
                fb.say(MSG_NEED_KEY);
                return;
            }
            self.player.keys -= 1;
            node.locked = false;
            fb.emit(Effect::KeyUsed);
            info!("Unlocked room ({}, {}) with a key", target.x, target.y);
        }

        self.room.cache = Some(RoomSnapshot::capture(&self.entities));
        let from = self.player.body.pos;
        let previous = self.enter_room(target, fb);
        self.rooms.insert(previous.coord, previous);

        self.player.body.pos = entry_position(dir, from, self.player.body.radius);
        self.player.knockback = Knockback::default();
        self.shake = 0.0;
    }

    /// Make `coord` the active room: expand the graph around it, restore or
    /// populate its entities and set its doors. Returns the room it replaced.
    fn enter_room(&mut self, coord: Coord, fb: &mut Feedback) -> Room {
        self.graph.expand_neighbors(coord);
        let node = self.graph.ensure_node(coord);
        node.visited = true;
        node.seen = true;
        let node = node.clone();

        let mut room = match self.rooms.remove(&coord) {
            Some(room) => room,
            None => Room::generate(&node, self.floor_seed),
        };

        self.entities = match room.cache.take() {
            Some(snapshot) => snapshot.restore(),
            None => {
                let mut entities = hecs::World::new();
                if !room.populated {
                    room.populate(&mut entities, node.depth, self.floor, &self.tuning, &mut self.rng);
                }
                entities
            }
        };

        let cleared = if room.kind.is_combat() {
            node.cleared
        } else {
            if let Some(n) = self.graph.node_mut(coord) {
                n.cleared = true;
            }
            true
        };
        room.set_all_doors(cleared);

        info!(
            "Entered {:?} room at ({}, {}) on floor {}",
            room.kind, coord.x, coord.y, self.floor
        );
        fb.emit(Effect::RoomEntered {
            coord,
            kind: room.kind,
        });
        std::mem::replace(&mut self.room, room)
    }

    /// A combat room with no enemies left is cleared: doors open and the
    /// reward drops at the center.
    fn check_clear(&mut self, fb: &mut Feedback) {
        let coord = self.room.coord;
        let kind = self.room.kind;
        if !kind.is_combat() {
            return;
        }
        let Some(node) = self.graph.node_mut(coord) else {
            return;
        };
        if node.cleared || enemy_count(&self.entities) > 0 {
            return;
        }
        node.cleared = true;
        self.room.set_all_doors(true);
        let reward = clear_reward(kind, &mut self.rng, &self.tuning.loot);
        drop_pickups(&mut self.entities, &reward, room_center());
        fb.score += CLEAR_SCORE;
        fb.emit(Effect::RoomCleared(coord));
        info!("Cleared {:?} room at ({}, {})", kind, coord.x, coord.y);
    }

    /// Portal taken: a fresh graph one floor deeper.
    fn advance_floor(&mut self, fb: &mut Feedback) {
        self.floor += 1;
        self.floor_seed = floor_seed(self.seed, self.floor);
        self.graph = RoomGraph::new(self.tuning.world.max_depth);
        self.rooms.clear();
        self.stats.score += FLOOR_SCORE * self.floor as u64;

        self.enter_room(Coord::new(0, 0), fb);
        self.player.body.pos = room_center();
        self.player.body.vel = delve_logic::math::Vec2::ZERO;
        self.player.knockback = Knockback::default();
        self.shake = 0.0;

        fb.emit(Effect::FloorAdvanced(self.floor));
        info!("Descended to floor {}", self.floor);
    }

    fn end_run(&mut self, fb: &mut Feedback) {
        let summary = self.summary();
        info!(
            "Run ended on floor {} with score {} ({} kills, {:.1}s)",
            summary.floor, summary.score, summary.kills, summary.time_survived
        );
        self.state = RunState::Ended(summary);
        fb.emit(Effect::RunEnded);
    }

    /// Totals so far, as they would be recorded at run end.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            floor: self.floor,
            score: self.stats.score,
            kills: self.stats.kills,
            time_survived: self.stats.time,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, RunState::Ended(_))
    }

    pub fn run_state(&self) -> &RunState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Live entities of the active room.
    pub fn entities(&self) -> &hecs::World {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut hecs::World {
        &mut self.entities
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    /// A materialized room by coordinate, active or cached.
    pub fn room_at(&self, coord: Coord) -> Option<&Room> {
        if self.room.coord == coord {
            Some(&self.room)
        } else {
            self.rooms.get(&coord)
        }
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    pub fn active_coord(&self) -> Coord {
        self.room.coord
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn score(&self) -> u64 {
        self.stats.score
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn shake(&self) -> f32 {
        self.shake
    }

    /// Save the run to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        crate::persistence::save_world(writer, self)
    }

    /// Load a run from a reader
    pub fn load<R: std::io::Read>(reader: R) -> Result<Self, SaveError> {
        crate::persistence::load_world(reader)
    }

    pub(crate) fn from_save(mut data: SaveData) -> Self {
        debug!("Restoring {} cached rooms", data.rooms.len());
        warn_repaired(&data.tuning.repair());
        let rooms = data.rooms.into_iter().map(|r| (r.coord, r)).collect();
        Self {
            rng: StdRng::seed_from_u64(data.seed ^ data.ticks.rotate_left(32)),
            entities: data.active.restore(),
            tuning: data.tuning,
            seed: data.seed,
            floor: data.floor,
            floor_seed: data.floor_seed,
            graph: data.graph,
            rooms,
            room: data.room,
            player: data.player,
            message: data.message,
            shake: data.shake,
            stats: data.stats,
            ticks: data.ticks,
            state: data.state,
        }
    }
}

fn warn_repaired(issues: &[TuningIssue]) {
    for issue in issues {
        warn!("Tuning repaired: {}", issue);
    }
}
