//! Builds the per-tick game_state broadcast from room state

use crate::ws::protocol::{
    BulletView, FlagView, LeaderboardEntry, ObstacleView, PowerUpView, RoomState, ServerMsg,
    TankView, TeamInfo,
};

use super::entity::Tank;
use super::room::Room;

/// Serialize a room into the game_state message every connection in the room
/// receives. Pure read; the tick loop calls this right after `advance`.
pub fn build_game_state(room: &Room) -> ServerMsg {
    let state = RoomState {
        tanks: room.tanks.values().map(tank_view).collect(),
        bullets: room
            .bullets
            .iter()
            .map(|b| BulletView {
                id: b.id,
                x: b.position.x,
                y: b.position.y,
                owner_id: b.owner,
            })
            .collect(),
        obstacles: room
            .obstacles
            .iter()
            .map(|o| ObstacleView {
                x: o.rect.x,
                y: o.rect.y,
                width: o.rect.width,
                height: o.rect.height,
            })
            .collect(),
        powerups: room
            .power_ups
            .iter()
            .map(|p| PowerUpView {
                id: p.id,
                x: p.position.x,
                y: p.position.y,
                kind: p.kind,
                value: p.kind.value(),
            })
            .collect(),
        flags: room
            .flags
            .iter()
            .map(|f| FlagView {
                id: f.id,
                x: f.position.x,
                y: f.position.y,
                team: f.team,
                captured: f.captured,
                carrier_id: f.carrier,
            })
            .collect(),
        teams: room.teams.clone(),
    };

    let leaderboard = room
        .leaderboard()
        .into_iter()
        .map(|t| LeaderboardEntry {
            name: t.name.clone(),
            kills: t.kills,
            deaths: t.deaths,
            team: t.team,
        })
        .collect();

    let team_info = TeamInfo {
        mode: room.mode,
        teams: room.teams.clone(),
        team_scores: room.team_scores(),
    };

    ServerMsg::GameState {
        state,
        leaderboard,
        team_info,
    }
}

fn tank_view(tank: &Tank) -> TankView {
    TankView {
        id: tank.id,
        name: tank.name.clone(),
        x: tank.position.x,
        y: tank.position.y,
        angle: tank.angle,
        health: tank.health,
        max_health: tank.max_health,
        kills: tank.kills,
        deaths: tank.deaths,
        alive: tank.alive,
        team: tank.team,
        tank_class: tank.class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::TankClass;
    use crate::game::room::GameMode;
    use uuid::Uuid;

    #[test]
    fn test_snapshot_reflects_room_contents() {
        let mut room = Room::new("SNAP01".to_string(), GameMode::Capture, 3, 100.0);
        let id = Uuid::new_v4();
        room.add_tank(id, "scout".to_string(), TankClass::Light);

        let msg = build_game_state(&room);
        let ServerMsg::GameState {
            state,
            leaderboard,
            team_info,
        } = msg
        else {
            panic!("expected game_state");
        };

        assert_eq!(state.tanks.len(), 1);
        assert_eq!(state.tanks[0].id, id);
        assert_eq!(state.flags.len(), 2);
        assert!(!state.obstacles.is_empty());
        assert_eq!(leaderboard.len(), 1);
        assert_eq!(team_info.mode, GameMode::Capture);
        assert_eq!(team_info.team_scores.len(), 4);
    }

    #[test]
    fn test_snapshot_serializes_with_wire_keys() {
        let room = Room::new("SNAP02".to_string(), GameMode::Deathmatch, 3, 100.0);
        let json = serde_json::to_value(build_game_state(&room)).unwrap();

        assert_eq!(json["type"], "game_state");
        assert!(json["state"]["tanks"].is_array());
        assert!(json["state"]["powerups"].is_array());
        assert!(json["teamInfo"]["teamScores"].is_object());
        assert_eq!(json["teamInfo"]["mode"], "deathmatch");
    }
}
