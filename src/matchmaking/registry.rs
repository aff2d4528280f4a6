//! Registry of live rooms: lookup, creation, and reaping

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::entity::TankClass;
use crate::game::room::Room;
use crate::game::snapshot::build_game_state;
use crate::game::GameMode;
use crate::ws::protocol::{RoomInfo, ServerMsg};

/// Snapshot fan-out channel depth per room; laggy clients drop frames
/// instead of backing up the tick loop
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A live room paired with its snapshot broadcast channel
pub struct RoomEntry {
    pub room: Room,
    pub snapshots: broadcast::Sender<ServerMsg>,
}

impl RoomEntry {
    fn new(id: String, mode: GameMode, now: f64) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            room: Room::new(id, mode, rand::random::<u64>(), now),
            snapshots,
        }
    }
}

/// Registry of all live rooms. An explicit object threaded through the
/// gateway and the tick loop, so tests can run isolated instances.
pub struct Registry {
    rooms: Mutex<HashMap<String, RoomEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a room for the join and add the tank, under one lock so two
    /// joins can never race a room past capacity. Returns the room id and a
    /// subscription to its snapshot broadcast.
    pub fn join_room(
        &self,
        mode: GameMode,
        room_code: Option<String>,
        tank_id: Uuid,
        name: String,
        class: TankClass,
        now: f64,
    ) -> (String, broadcast::Receiver<ServerMsg>) {
        let mut rooms = self.rooms.lock();
        let room_id = resolve_room(&mut rooms, mode, room_code, now);

        // resolve_room always leaves the id present
        let entry = rooms
            .entry(room_id.clone())
            .or_insert_with(|| RoomEntry::new(room_id.clone(), mode, now));
        entry.room.add_tank(tank_id, name, class);
        let rx = entry.snapshots.subscribe();

        info!(room_id = %room_id, tank_id = %tank_id, mode = ?mode, "Tank joined room");
        (room_id, rx)
    }

    /// Run a closure against one room; `None` when the room is gone.
    /// Command handlers use this and run to completion under the lock.
    pub fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> Option<R> {
        let mut rooms = self.rooms.lock();
        rooms.get_mut(room_id).map(|entry| f(&mut entry.room))
    }

    /// Remove a tank from its room; stale room or tank ids are no-ops
    pub fn remove_tank(&self, room_id: &str, tank_id: Uuid) {
        let mut rooms = self.rooms.lock();
        if let Some(entry) = rooms.get_mut(room_id) {
            entry.room.remove_tank(tank_id);
            debug!(room_id = %room_id, tank_id = %tank_id, "Tank removed from room");
        }
    }

    /// Rooms of the requested mode with free capacity, for the browser
    pub fn list_rooms(&self, mode: GameMode) -> Vec<RoomInfo> {
        let rooms = self.rooms.lock();
        rooms
            .values()
            .filter(|e| e.room.mode == mode && e.room.has_capacity())
            .map(|e| RoomInfo {
                id: e.room.id.clone(),
                name: format!("Room {}", e.room.id),
                occupancy: e.room.occupancy(),
                max_players: e.room.config.max_players,
                mode: e.room.mode,
            })
            .collect()
    }

    /// Advance every live room one tick and broadcast its snapshot.
    /// Broadcast sends never block; a room with no listeners skips the
    /// serialization entirely.
    pub fn tick_all(&self, now: f64, dt: f32) {
        let mut rooms = self.rooms.lock();
        for entry in rooms.values_mut() {
            entry.room.advance(now, dt);
            if entry.snapshots.receiver_count() > 0 {
                let _ = entry.snapshots.send(build_game_state(&entry.room));
            }
        }
    }

    /// Drop rooms with zero occupants; called once per tick-loop iteration
    pub fn reap_empty_rooms(&self) {
        let mut rooms = self.rooms.lock();
        let before = rooms.len();
        rooms.retain(|_, entry| entry.room.occupancy() > 0);

        let reaped = before - rooms.len();
        if reaped > 0 {
            debug!(reaped, "Reaped empty rooms");
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.lock().values().map(|e| e.room.occupancy()).sum()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the room id for a join: an explicit code wins if that room has
/// capacity (and is created on demand when absent); otherwise the first
/// same-mode room with a free slot; otherwise a fresh random code.
fn resolve_room(
    rooms: &mut HashMap<String, RoomEntry>,
    mode: GameMode,
    room_code: Option<String>,
    now: f64,
) -> String {
    if let Some(code) = room_code {
        match rooms.get(&code) {
            Some(entry) if entry.room.has_capacity() => return code,
            Some(_) => {} // full: fall through to matchmaking
            None => {
                rooms.insert(code.clone(), RoomEntry::new(code.clone(), mode, now));
                return code;
            }
        }
    }

    if let Some(id) = rooms
        .iter()
        .find(|(_, e)| e.room.mode == mode && e.room.has_capacity())
        .map(|(id, _)| id.clone())
    {
        return id;
    }

    let id = generate_room_code(rooms);
    rooms.insert(id.clone(), RoomEntry::new(id.clone(), mode, now));
    id
}

fn generate_room_code(rooms: &HashMap<String, RoomEntry>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code: String = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_CHARSET[rng.gen_range(0..ROOM_CODE_CHARSET.len())] as char)
            .collect();
        if !rooms.contains_key(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::room::MAX_PLAYERS_PER_ROOM;

    const NOW: f64 = 100.0;

    fn join(registry: &Registry, mode: GameMode, code: Option<&str>) -> String {
        let (room_id, _rx) = registry.join_room(
            mode,
            code.map(String::from),
            Uuid::new_v4(),
            "tester".to_string(),
            TankClass::Medium,
            NOW,
        );
        room_id
    }

    #[test]
    fn test_join_creates_then_reuses_room() {
        let registry = Registry::new();

        let first = join(&registry, GameMode::Team, None);
        assert_eq!(registry.active_rooms(), 1);

        let second = join(&registry, GameMode::Team, None);
        assert_eq!(first, second);
        assert_eq!(registry.active_rooms(), 1);
        assert_eq!(registry.total_players(), 2);
    }

    #[test]
    fn test_mode_mismatch_creates_second_room() {
        let registry = Registry::new();
        let dm = join(&registry, GameMode::Deathmatch, None);
        let ctf = join(&registry, GameMode::Capture, None);

        assert_ne!(dm, ctf);
        assert_eq!(registry.active_rooms(), 2);
    }

    #[test]
    fn test_explicit_code_creates_room_under_that_id() {
        let registry = Registry::new();
        let id = join(&registry, GameMode::Deathmatch, Some("MYROOM"));
        assert_eq!(id, "MYROOM");

        let again = join(&registry, GameMode::Deathmatch, Some("MYROOM"));
        assert_eq!(again, "MYROOM");
        assert_eq!(registry.total_players(), 2);
    }

    #[test]
    fn test_full_room_overflows_to_new_room() {
        let registry = Registry::new();

        let first = join(&registry, GameMode::Deathmatch, None);
        for _ in 1..MAX_PLAYERS_PER_ROOM {
            assert_eq!(join(&registry, GameMode::Deathmatch, None), first);
        }

        let overflow = join(&registry, GameMode::Deathmatch, None);
        assert_ne!(overflow, first);
        assert_eq!(registry.active_rooms(), 2);
    }

    #[test]
    fn test_list_rooms_filters_mode_and_capacity() {
        let registry = Registry::new();
        let dm = join(&registry, GameMode::Deathmatch, None);
        join(&registry, GameMode::Team, None);

        let listed = registry.list_rooms(GameMode::Deathmatch);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, dm);
        assert_eq!(listed[0].occupancy, 1);
        assert_eq!(listed[0].max_players, MAX_PLAYERS_PER_ROOM);

        // Fill the deathmatch room; it drops out of the listing
        for _ in 1..MAX_PLAYERS_PER_ROOM {
            join(&registry, GameMode::Deathmatch, Some(&dm));
        }
        assert!(registry.list_rooms(GameMode::Deathmatch).is_empty());
    }

    #[test]
    fn test_reap_removes_only_empty_rooms() {
        let registry = Registry::new();
        let occupied = join(&registry, GameMode::Team, None);

        // An abandoned room: join then leave
        let abandoned = join(&registry, GameMode::Deathmatch, Some("GHOSTS"));
        let tank = registry
            .with_room(&abandoned, |room| *room.tanks.keys().next().unwrap())
            .unwrap();
        registry.remove_tank(&abandoned, tank);

        registry.reap_empty_rooms();
        assert_eq!(registry.active_rooms(), 1);
        assert!(registry.with_room(&occupied, |_| ()).is_some());
        assert!(registry.with_room(&abandoned, |_| ()).is_none());
    }

    #[test]
    fn test_tick_all_advances_rooms() {
        let registry = Registry::new();
        let id = join(&registry, GameMode::Deathmatch, None);

        registry.tick_all(NOW + 1.0, 1.0 / 60.0);
        let updated = registry.with_room(&id, |room| room.last_update).unwrap();
        assert_eq!(updated, NOW + 1.0);
    }

    #[tokio::test]
    async fn test_tick_all_broadcasts_snapshots_to_subscribers() {
        let registry = Registry::new();
        let (_, mut rx) = registry.join_room(
            GameMode::Deathmatch,
            None,
            Uuid::new_v4(),
            "watcher".to_string(),
            TankClass::Light,
            NOW,
        );

        registry.tick_all(NOW + 1.0, 1.0 / 60.0);

        let msg = rx.recv().await.unwrap();
        let ServerMsg::GameState { state, .. } = msg else {
            panic!("expected game_state");
        };
        assert_eq!(state.tanks.len(), 1);
    }
}
