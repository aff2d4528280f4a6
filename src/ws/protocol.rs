//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::game::entity::{PowerUpKind, TankClass, Team};
use crate::game::GameMode;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Join a room; matchmaking picks or creates one unless a code is given
    #[serde(rename_all = "camelCase")]
    Join {
        name: String,
        tank_class: TankClass,
        game_mode: GameMode,
        #[serde(default)]
        room_code: Option<String>,
    },

    /// Directional + fire flags, applied against the sender's tank
    Input {
        left: bool,
        right: bool,
        up: bool,
        down: bool,
        fire: bool,
    },

    /// Matchmaking-browser listing for one mode
    #[serde(rename_all = "camelCase")]
    GetRooms { game_mode: GameMode },

    /// Leave the current room, keeping the connection open
    LeaveGame,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Reply to a successful join
    #[serde(rename_all = "camelCase")]
    TankAssigned { tank_id: Uuid, room_id: String },

    /// Reply to get_rooms
    RoomList { rooms: Vec<RoomInfo> },

    /// Per-tick room snapshot, broadcast to every connection in the room
    #[serde(rename_all = "camelCase")]
    GameState {
        state: RoomState,
        leaderboard: Vec<LeaderboardEntry>,
        team_info: TeamInfo,
    },

    /// Request rejected; no state changed
    Error { message: String },
}

/// Room entry for the matchmaking browser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    pub occupancy: usize,
    pub max_players: usize,
    pub mode: GameMode,
}

/// Full room state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomState {
    pub tanks: Vec<TankView>,
    pub bullets: Vec<BulletView>,
    pub obstacles: Vec<ObstacleView>,
    pub powerups: Vec<PowerUpView>,
    pub flags: Vec<FlagView>,
    pub teams: BTreeMap<Team, Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub kills: u32,
    pub deaths: u32,
    pub alive: bool,
    pub team: Option<Team>,
    pub tank_class: TankClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub team: Team,
    pub captured: bool,
    pub carrier_id: Option<Uuid>,
}

/// Leaderboard row: top 10 by kills, ties broken by fewer deaths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub mode: GameMode,
    pub teams: BTreeMap<Team, Vec<Uuid>>,
    pub team_scores: BTreeMap<Team, u32>,
}
