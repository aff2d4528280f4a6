//! Room state and the authoritative per-tick update

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::util::time::INPUT_STEP;

use super::entity::{
    Bullet, Flag, Obstacle, PowerUp, PowerUpKind, Tank, TankClass, Team, FLAG_CAPTURE_RADIUS,
};
use super::geometry::Vec2;
use super::InputState;

pub const WORLD_WIDTH: f32 = 1000.0;
pub const WORLD_HEIGHT: f32 = 700.0;
pub const MAX_PLAYERS_PER_ROOM: usize = 8;

/// Spawn rejection sampling budget
const SPAWN_ATTEMPTS: usize = 50;
/// Obstacle safety margin around candidate spawn points
const SPAWN_OBSTACLE_MARGIN: f32 = 40.0;
/// Minimum spawn distance from any living tank
const SPAWN_CLEARANCE: f32 = 100.0;

const MAX_POWER_UPS: usize = 4;
const POWER_UP_SPAWN_INTERVAL: f64 = 8.0;

const LEADERBOARD_SIZE: usize = 10;

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Free for all
    Deathmatch,
    /// Team battle
    Team,
    /// Capture the flag
    Capture,
}

impl GameMode {
    pub fn team_based(&self) -> bool {
        matches!(self, GameMode::Team | GameMode::Capture)
    }
}

/// Per-mode room parameters, fixed at creation
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    pub max_players: usize,
    pub world: Vec2,
}

impl RoomConfig {
    pub fn for_mode(_mode: GameMode) -> Self {
        Self {
            max_players: MAX_PLAYERS_PER_ROOM,
            world: Vec2::new(WORLD_WIDTH, WORLD_HEIGHT),
        }
    }
}

/// One isolated simulation arena. The room exclusively owns every entity in
/// it; nothing here is shared across rooms.
pub struct Room {
    pub id: String,
    pub mode: GameMode,
    pub config: RoomConfig,
    /// BTreeMap so every sweep visits tanks lowest-id-first; collision
    /// tie-breaks are the same on every run
    pub tanks: BTreeMap<Uuid, Tank>,
    pub bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
    pub power_ups: Vec<PowerUp>,
    pub flags: Vec<Flag>,
    pub teams: BTreeMap<Team, Vec<Uuid>>,
    pub last_update: f64,
    last_power_up_spawn: f64,
    rng: ChaCha8Rng,
}

impl Room {
    pub fn new(id: String, mode: GameMode, seed: u64, now: f64) -> Self {
        let config = RoomConfig::for_mode(mode);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let obstacles = generate_obstacles(&mut rng, config.world);
        let flags = if mode == GameMode::Capture {
            generate_flags(config.world)
        } else {
            Vec::new()
        };

        Self {
            id,
            mode,
            config,
            tanks: BTreeMap::new(),
            bullets: Vec::new(),
            obstacles,
            power_ups: Vec::new(),
            flags,
            teams: Team::ALL.iter().map(|t| (*t, Vec::new())).collect(),
            last_update: now,
            last_power_up_spawn: now,
            rng,
        }
    }

    pub fn occupancy(&self) -> usize {
        self.tanks.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.tanks.len() < self.config.max_players
    }

    /// Round-robin team assignment to the currently smallest roster;
    /// deathmatch has no teams at all
    fn assign_team(&mut self, id: Uuid) -> Option<Team> {
        if self.mode == GameMode::Deathmatch {
            return None;
        }

        let team = *Team::ALL
            .iter()
            .min_by_key(|t| self.teams.get(*t).map_or(0, Vec::len))?;
        self.teams.entry(team).or_default().push(id);
        Some(team)
    }

    /// Rejection-sample a spawn point: up to SPAWN_ATTEMPTS random points in
    /// the team's spawn strip (whole arena without a team) that clear all
    /// obstacles with a margin and keep distance from living tanks. On
    /// exhaustion, one uncontested random point.
    fn find_spawn_position(&mut self, team: Option<Team>) -> Vec2 {
        let world = self.config.world;

        let (x_min, x_max, y_min, y_max) = match (team, self.mode.team_based()) {
            (Some(Team::Red), true) => (50.0, 150.0, 50.0, world.y - 50.0),
            (Some(Team::Blue), true) => (world.x - 150.0, world.x - 50.0, 50.0, world.y - 50.0),
            (Some(Team::Green), true) => (50.0, world.x - 50.0, 50.0, 150.0),
            (Some(Team::Yellow), true) => (50.0, world.x - 50.0, world.y - 150.0, world.y - 50.0),
            _ => (50.0, world.x - 50.0, 50.0, world.y - 50.0),
        };

        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = Vec2::new(
                self.rng.gen_range(x_min..=x_max),
                self.rng.gen_range(y_min..=y_max),
            );

            if self
                .obstacles
                .iter()
                .any(|o| o.blocks_tank(candidate, SPAWN_OBSTACLE_MARGIN))
            {
                continue;
            }
            if self
                .tanks
                .values()
                .any(|t| t.alive && t.position.distance(candidate) < SPAWN_CLEARANCE)
            {
                continue;
            }

            return candidate;
        }

        Vec2::new(
            self.rng.gen_range(100.0..=world.x - 100.0),
            self.rng.gen_range(100.0..=world.y - 100.0),
        )
    }

    /// Add a tank with team assignment and a collision-free spawn point
    pub fn add_tank(&mut self, id: Uuid, name: String, class: TankClass) -> &Tank {
        let team = self.assign_team(id);
        let position = self.find_spawn_position(team);

        let mut tank = Tank::new(id, name, class, team);
        tank.position = position;
        tank.angle = self.rng.gen_range(0.0..std::f32::consts::TAU);

        self.tanks.entry(id).or_insert(tank)
    }

    /// Remove a tank and its roster entry. Bullets and power-ups that
    /// reference the departed tank stay behind, ownerless. A flag it carried
    /// goes back to neutral. Unknown ids are a no-op.
    pub fn remove_tank(&mut self, id: Uuid) {
        let Some(tank) = self.tanks.remove(&id) else {
            return;
        };

        if let Some(team) = tank.team {
            if let Some(roster) = self.teams.get_mut(&team) {
                roster.retain(|member| *member != id);
            }
        }

        for flag in &mut self.flags {
            if flag.carrier == Some(id) {
                flag.release();
            }
        }
    }

    /// Apply one decoded input command against a tank: a fixed movement step
    /// plus an optional shot. Commands for departed tanks are silent no-ops;
    /// that race with disconnects is expected.
    pub fn apply_input(&mut self, id: Uuid, input: &InputState, now: f64) {
        let world = self.config.world;
        let Some(tank) = self.tanks.get_mut(&id) else {
            return;
        };

        tank.update(now, INPUT_STEP, input, world, &self.obstacles);

        if input.fire {
            self.fire_from(id, now);
        }
    }

    /// Fire a bullet from the given tank, if it can
    pub fn fire_from(&mut self, id: Uuid, now: f64) -> Option<Uuid> {
        let bullet = self.tanks.get_mut(&id)?.fire(now)?;
        let bullet_id = bullet.id;
        self.bullets.push(bullet);
        Some(bullet_id)
    }

    /// The fixed-tick step. Order matters for determinism: respawns, then
    /// bullets, then power-up consumption, then power-up spawning, then
    /// flags.
    pub fn advance(&mut self, now: f64, dt: f32) {
        self.sweep_respawns(now);
        self.sweep_bullets(now, dt);
        self.sweep_power_ups(now);
        self.maybe_spawn_power_up(now);
        if self.mode == GameMode::Capture {
            self.update_flags();
        }
        self.last_update = now;
    }

    fn sweep_respawns(&mut self, now: f64) {
        let due: Vec<(Uuid, Option<Team>)> = self
            .tanks
            .values()
            .filter(|t| !t.alive && t.respawn_at.is_some_and(|at| at <= now))
            .map(|t| (t.id, t.team))
            .collect();

        for (id, team) in due {
            let position = self.find_spawn_position(team);
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            if let Some(tank) = self.tanks.get_mut(&id) {
                tank.respawn(position, angle);
            }
        }
    }

    /// Mark-and-sweep over bullets: integrate, then remove on lifetime
    /// expiry, obstacle contact, first qualifying tank hit, or world exit.
    /// A bullet resolves at most one collision per tick.
    fn sweep_bullets(&mut self, now: f64, dt: f32) {
        let world = self.config.world;
        let team_based = self.mode.team_based();
        let mut removed = vec![false; self.bullets.len()];

        for i in 0..self.bullets.len() {
            self.bullets[i].update(dt);

            if self.bullets[i].expired(now) {
                removed[i] = true;
                continue;
            }

            let position = self.bullets[i].position;
            if self.obstacles.iter().any(|o| o.blocks_bullet(position)) {
                removed[i] = true;
                continue;
            }

            let owner = self.bullets[i].owner;
            let damage = self.bullets[i].damage;
            // An ownerless bullet (owner already left) has no team and hits
            // anyone
            let owner_team = self.tanks.get(&owner).and_then(|t| t.team);

            let victim = self
                .tanks
                .values()
                .find(|t| {
                    t.alive
                        && t.id != owner
                        && !(team_based && t.team.is_some() && t.team == owner_team)
                        && t.position.distance(position) < t.radius()
                })
                .map(|t| t.id);

            if let Some(victim_id) = victim {
                removed[i] = true;

                let mut killed = false;
                if let Some(victim) = self.tanks.get_mut(&victim_id) {
                    victim.take_damage(now, damage);
                    killed = !victim.alive;
                }
                // Kill credit only while the owner is still in the room
                if killed {
                    if let Some(owner) = self.tanks.get_mut(&owner) {
                        owner.kills += 1;
                    }
                }
                continue;
            }

            if position.x < 0.0 || position.x > world.x || position.y < 0.0 || position.y > world.y
            {
                removed[i] = true;
            }
        }

        let mut flags = removed.iter();
        self.bullets.retain(|_| !flags.next().copied().unwrap_or(false));
    }

    fn sweep_power_ups(&mut self, now: f64) {
        let mut removed = vec![false; self.power_ups.len()];

        for i in 0..self.power_ups.len() {
            if self.power_ups[i].is_expired(now) {
                removed[i] = true;
                continue;
            }

            let taker = self
                .tanks
                .values()
                .find(|t| t.alive && self.power_ups[i].overlaps_tank(t))
                .map(|t| t.id);

            if let Some(taker_id) = taker {
                let kind = self.power_ups[i].kind;
                if let Some(tank) = self.tanks.get_mut(&taker_id) {
                    tank.apply_power_up(now, kind);
                }
                removed[i] = true;
            }
        }

        let mut flags = removed.iter();
        self.power_ups
            .retain(|_| !flags.next().copied().unwrap_or(false));
    }

    fn maybe_spawn_power_up(&mut self, now: f64) {
        if self.power_ups.len() >= MAX_POWER_UPS
            || now - self.last_power_up_spawn <= POWER_UP_SPAWN_INTERVAL
        {
            return;
        }

        let position = self.find_spawn_position(None);
        let kind = *PowerUpKind::ALL.choose(&mut self.rng).unwrap_or(&PowerUpKind::Health);
        self.power_ups.push(PowerUp::new(position, kind, now));
        self.last_power_up_spawn = now;
    }

    /// Capture-the-flag bookkeeping: an uncaptured flag is grabbed by the
    /// first living enemy tank in range; a captured flag rides its carrier
    /// and reverts to neutral when the carrier dies or leaves.
    fn update_flags(&mut self) {
        for flag in &mut self.flags {
            if !flag.captured {
                let grabber = self
                    .tanks
                    .values()
                    .find(|t| {
                        t.alive
                            && t.team != Some(flag.team)
                            && flag.position.distance(t.position) < FLAG_CAPTURE_RADIUS
                    })
                    .map(|t| t.id);

                if let Some(id) = grabber {
                    flag.captured = true;
                    flag.carrier = Some(id);
                }
            } else {
                match flag.carrier.and_then(|id| self.tanks.get(&id)) {
                    Some(carrier) if carrier.alive => flag.position = carrier.position,
                    _ => flag.release(),
                }
            }
        }
    }

    /// Top tanks by kills, ties broken by fewer deaths, then stable order
    pub fn leaderboard(&self) -> Vec<&Tank> {
        let mut ranked: Vec<&Tank> = self.tanks.values().collect();
        ranked.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.deaths.cmp(&b.deaths)));
        ranked.truncate(LEADERBOARD_SIZE);
        ranked
    }

    /// A team's score is the sum of its members' kill counts
    pub fn team_scores(&self) -> BTreeMap<Team, u32> {
        self.teams
            .iter()
            .map(|(team, roster)| {
                let score = roster
                    .iter()
                    .filter_map(|id| self.tanks.get(id))
                    .map(|t| t.kills)
                    .sum();
                (*team, score)
            })
            .collect()
    }
}

fn generate_obstacles(rng: &mut ChaCha8Rng, world: Vec2) -> Vec<Obstacle> {
    let count = rng.gen_range(8..=15);
    (0..count)
        .map(|_| {
            let width = rng.gen_range(30.0..=80.0);
            let height = rng.gen_range(30.0..=80.0);
            let x = rng.gen_range(50.0..=world.x - width - 50.0);
            let y = rng.gen_range(50.0..=world.y - height - 50.0);
            Obstacle::new(x, y, width, height)
        })
        .collect()
}

fn generate_flags(world: Vec2) -> Vec<Flag> {
    vec![
        Flag::new(Vec2::new(100.0, world.y / 2.0), Team::Red),
        Flag::new(Vec2::new(world.x - 100.0, world.y / 2.0), Team::Blue),
    ]
}
