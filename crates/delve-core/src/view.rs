//! Read-only state view for renderers, HUDs and the harness.

use delve_logic::doors::{Direction, DoorState};
use delve_logic::graph::{Coord, RoomKind};
use delve_logic::math::Vec2;
use delve_logic::tiles::TileKind;
use serde::Serialize;

use crate::components::*;
use crate::engine::{RunState, World};
use crate::events::Message;
use crate::items::{ItemId, WeaponId};
use crate::room::Fixture;

#[derive(Debug, Clone, Serialize)]
pub struct WeaponView {
    pub id: WeaponId,
    pub name: &'static str,
    pub clip: u32,
    pub clip_size: u32,
    pub reloading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub aim: Vec2,
    pub hp: f32,
    pub hp_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub invulnerable: bool,
    pub dashing: bool,
    pub coins: u32,
    pub keys: u32,
    pub weapons: Vec<WeaponView>,
    pub current_weapon: usize,
    pub items: Vec<ItemId>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DoorView {
    pub dir: Direction,
    pub state: DoorState,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    pub coord: Coord,
    pub kind: RoomKind,
    pub depth: u32,
    /// Row-major, `tiles[y][x]`.
    pub tiles: Vec<Vec<TileKind>>,
    pub doors: Vec<DoorView>,
    pub fixture: Option<Fixture>,
    pub cleared: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub pos: Vec2,
    pub radius: f32,
    pub archetype: Archetype,
    pub elite: bool,
    pub minion: bool,
    pub hp: f32,
    pub hp_max: f32,
    pub phase: u8,
    pub frozen: bool,
    pub shocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulletView {
    pub pos: Vec2,
    pub radius: f32,
    pub owner: BulletOwner,
    pub crit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PickupKind,
    /// Shop slots only.
    pub price: Option<u32>,
    pub label: Option<String>,
}

/// One minimap cell.
#[derive(Debug, Clone, Serialize)]
pub struct MinimapCell {
    pub coord: Coord,
    pub kind: RoomKind,
    pub seen: bool,
    pub visited: bool,
    pub cleared: bool,
    pub locked: bool,
    pub current: bool,
}

/// Everything a presentation layer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub player: PlayerView,
    pub room: RoomView,
    pub enemies: Vec<EnemyView>,
    pub bullets: Vec<BulletView>,
    pub pickups: Vec<PickupView>,
    pub decals: Vec<Decal>,
    pub minimap: Vec<MinimapCell>,
    pub message: Option<Message>,
    pub floor: u32,
    pub score: u64,
    pub kills: u32,
    pub time: f32,
    pub run_state: RunState,
    pub shake: f32,
}

impl World {
    /// Build the read-only view of the current state.
    pub fn snapshot(&self) -> StateView {
        let p = self.player();
        let player = PlayerView {
            pos: p.body.pos,
            vel: p.body.vel,
            radius: p.body.radius,
            aim: p.aim,
            hp: p.hp,
            hp_max: p.hp_max,
            shield: p.shield,
            shield_max: p.shield_max,
            invulnerable: p.invuln > 0.0,
            dashing: p.is_dashing(),
            coins: p.coins,
            keys: p.keys,
            weapons: p
                .weapons
                .iter()
                .map(|w| WeaponView {
                    id: w.id,
                    name: w.id.name(),
                    clip: w.clip,
                    clip_size: w.id.spec().clip,
                    reloading: w.is_reloading(),
                })
                .collect(),
            current_weapon: p.current,
            items: p.items.clone(),
        };

        let r = self.room();
        let node = self.graph().node(r.coord);
        let room = RoomView {
            coord: r.coord,
            kind: r.kind,
            depth: r.coord.depth(),
            tiles: r.tiles.rows().map(|row| row.to_vec()).collect(),
            doors: Direction::ALL
                .iter()
                .map(|d| DoorView {
                    dir: *d,
                    state: r.door_state(*d),
                })
                .collect(),
            fixture: r.fixture(),
            cleared: node.map_or(false, |n| n.cleared),
        };

        let world = self.entities();
        let enemies = world
            .query::<(&Body, &Enemy, &StatusEffects)>()
            .iter()
            .map(|(_, (body, e, status))| EnemyView {
                pos: body.pos,
                radius: body.radius,
                archetype: e.archetype,
                elite: e.elite,
                minion: e.minion,
                hp: e.hp,
                hp_max: e.hp_max,
                phase: e.phase,
                frozen: status.is_frozen(),
                shocked: status.is_shocked(),
            })
            .collect();
        let bullets = world
            .query::<(&Body, &Bullet)>()
            .iter()
            .map(|(_, (body, b))| BulletView {
                pos: body.pos,
                radius: body.radius,
                owner: b.owner,
                crit: b.crit,
            })
            .collect();
        let pickups = world
            .query::<(&Body, &Pickup)>()
            .iter()
            .map(|(_, (body, pk))| {
                let (price, label) = match pk.kind {
                    PickupKind::ShopSlot(offer) => (Some(offer.price()), Some(offer.label())),
                    _ => (None, None),
                };
                PickupView {
                    pos: body.pos,
                    radius: body.radius,
                    kind: pk.kind,
                    price,
                    label,
                }
            })
            .collect();
        let mut decals: Vec<Decal> = world.query::<&Decal>().iter().map(|(_, d)| *d).collect();
        decals.sort_by_key(|d| d.serial);

        let active = self.active_coord();
        let minimap = self
            .graph()
            .nodes()
            .into_iter()
            .filter(|n| n.seen || n.visited)
            .map(|n| MinimapCell {
                coord: n.coord,
                kind: n.kind,
                seen: n.seen,
                visited: n.visited,
                cleared: n.cleared,
                locked: n.locked,
                current: n.coord == active,
            })
            .collect();

        let stats = self.stats();
        StateView {
            player,
            room,
            enemies,
            bullets,
            pickups,
            decals,
            minimap,
            message: self.message().cloned(),
            floor: self.floor(),
            score: stats.score,
            kills: stats.kills,
            time: stats.time,
            run_state: self.run_state().clone(),
            shake: self.shake(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Tuning;
    use crate::engine::World;
    use crate::spawn::spawn_pickup;
    use crate::components::PickupKind;
    use crate::items::ShopOffer;
    use delve_logic::doors::DoorState;
    use delve_logic::math::Vec2;

    #[test]
    fn view_reflects_start_room() {
        let world = World::new(Tuning::default(), 9);
        let view = world.snapshot();
        assert_eq!(view.room.tiles.len(), 11);
        assert!(view.room.tiles.iter().all(|row| row.len() == 15));
        assert!(view.room.doors.iter().all(|d| d.state == DoorState::Open));
        assert_eq!(view.minimap.len(), 5);
        assert_eq!(view.minimap.iter().filter(|c| c.current).count(), 1);
        assert_eq!(view.player.weapons.len(), 1);
        assert!(view.room.cleared);
    }

    #[test]
    fn shop_slots_carry_prices() {
        let mut world = World::new(Tuning::default(), 9);
        spawn_pickup(world.entities_mut(), PickupKind::ShopSlot(ShopOffer::Key), Vec2::new(100.0, 100.0));
        let view = world.snapshot();
        assert_eq!(view.pickups[0].price, Some(6));
        assert_eq!(view.pickups[0].label.as_deref(), Some("Key"));
    }

    #[test]
    fn view_serializes_to_json() {
        let world = World::new(Tuning::default(), 9);
        let json = serde_json::to_string(&world.snapshot()).expect("serialize");
        assert!(json.contains("\"run_state\":\"Playing\""));
    }
}
