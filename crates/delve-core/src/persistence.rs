//! Save/Load for runs in progress, and the end-of-run summary.
//!
//! Mid-run saves use bincode for a compact binary image of the whole world:
//! the floor graph, every materialized room with its cache, the active
//! room's live entities (as a snapshot) and the player. Bullets are not
//! saved. Run summaries are small JSON documents for the leaderboard
//! collaborator.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use delve_logic::graph::RoomGraph;

use crate::config::Tuning;
use crate::engine::{RunState, RunStats, World};
use crate::events::Message;
use crate::player::Player;
use crate::room::{Room, RoomSnapshot};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Final record of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub floor: u32,
    pub score: u64,
    pub kills: u32,
    /// Seconds of simulated time.
    pub time_survived: f32,
}

/// Serializable image of a [`World`].
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub tuning: Tuning,
    pub seed: u64,
    pub floor: u32,
    pub floor_seed: u64,
    pub graph: RoomGraph,
    /// Inactive rooms, sorted by coordinate.
    pub rooms: Vec<Room>,
    pub room: Room,
    /// Live entities of the active room.
    pub active: RoomSnapshot,
    pub player: Player,
    pub message: Option<Message>,
    pub shake: f32,
    pub stats: RunStats,
    pub ticks: u64,
    pub state: RunState,
}

/// Write the complete world to a writer
pub fn save_world<W: Write>(writer: W, world: &World) -> Result<(), SaveError> {
    let mut rooms: Vec<Room> = world.rooms.values().cloned().collect();
    rooms.sort_by_key(|r| r.coord);

    let save_data = SaveData {
        version: SAVE_VERSION,
        tuning: world.tuning.clone(),
        seed: world.seed,
        floor: world.floor,
        floor_seed: world.floor_seed,
        graph: world.graph.clone(),
        rooms,
        room: world.room.clone(),
        active: RoomSnapshot::capture(&world.entities),
        player: world.player.clone(),
        message: world.message.clone(),
        shake: world.shake,
        stats: world.stats,
        ticks: world.ticks,
        state: world.state.clone(),
    };

    bincode::serialize_into(writer, &save_data)?;
    log::info!("Saved run at floor {} after {} ticks", world.floor, world.ticks);
    Ok(())
}

/// Read a world back. Saves from another format version are rejected.
pub fn load_world<R: Read>(reader: R) -> Result<World, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        log::warn!(
            "Rejected save with version {} (expected {})",
            save_data.version,
            SAVE_VERSION
        );
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let world = World::from_save(save_data);
    log::info!("Loaded run at floor {} after {} ticks", world.floor, world.ticks);
    Ok(world)
}

/// Write a run summary as pretty JSON.
pub fn write_summary<W: Write>(writer: W, summary: &RunSummary) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

pub fn read_summary<R: Read>(reader: R) -> Result<RunSummary, SaveError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Json(e) => write!(f, "Summary error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Intents;
    use delve_logic::math::Vec2;

    #[test]
    fn test_save_load_roundtrip() {
        let mut world = World::new(Tuning::default(), 42);
        let walk = Intents::walk(Vec2::new(1.0, 0.0));
        for _ in 0..30 {
            world.advance(1.0 / 60.0, &walk);
        }

        let mut buffer = Vec::new();
        world.save(&mut buffer).expect("Save failed");

        let loaded = World::load(&buffer[..]).expect("Load failed");
        assert_eq!(loaded.floor(), world.floor());
        assert_eq!(loaded.active_coord(), world.active_coord());
        assert_eq!(loaded.player(), world.player());
        assert_eq!(loaded.ticks(), world.ticks());
        assert_eq!(
            RoomSnapshot::capture(loaded.entities()),
            RoomSnapshot::capture(world.entities())
        );
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let world = World::new(Tuning::default(), 1);
        let mut buffer = Vec::new();
        world.save(&mut buffer).expect("Save failed");
        // The version is the leading little-endian u32
        buffer[0] = buffer[0].wrapping_add(1);

        match World::load(&buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("mismatched save was accepted"),
        }
    }

    #[test]
    fn test_truncated_save_fails() {
        let world = World::new(Tuning::default(), 1);
        let mut buffer = Vec::new();
        world.save(&mut buffer).expect("Save failed");
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(World::load(&buffer[..]), Err(SaveError::Bincode(_))));
    }

    #[test]
    fn test_summary_json_roundtrip() {
        let summary = RunSummary {
            floor: 2,
            score: 1234,
            kills: 17,
            time_survived: 95.5,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).expect("write failed");
        let text = String::from_utf8(out.clone()).expect("utf8");
        assert!(text.contains("\"time_survived\""));
        assert_eq!(read_summary(&out[..]).expect("read failed"), summary);
    }
}
