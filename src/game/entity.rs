//! Entity model: tanks, bullets, obstacles, power-ups, flags

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{Rect, Vec2};
use super::InputState;

/// Seconds between death and respawn
pub const RESPAWN_DELAY: f64 = 3.0;
/// Duration of a speed or damage boost; re-collecting refreshes, never extends
pub const BOOST_DURATION: f64 = 10.0;
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
pub const DAMAGE_BOOST_MULTIPLIER: f32 = 1.5;
/// Reverse gear moves at half rate
const BACKWARD_FACTOR: f32 = 0.5;
/// Hull rotation rate in radians per second
pub const ROTATION_RATE: f32 = 3.0;

pub const BULLET_SPEED: f32 = 400.0;
pub const BULLET_LIFETIME: f64 = 3.0;
pub const BULLET_RADIUS: f32 = 3.0;

pub const HEALTH_PACK_VALUE: u32 = 50;
pub const POWER_UP_LIFETIME: f64 = 30.0;
pub const POWER_UP_PICKUP_RADIUS: f32 = 25.0;

pub const FLAG_CAPTURE_RADIUS: f32 = 30.0;

/// Tank chassis classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankClass {
    /// Fast and fragile
    Light,
    /// Balanced stats
    Medium,
    /// Slow and armored
    Heavy,
    /// High damage, minimal mobility
    Artillery,
}

/// Static stat bundle per tank class
#[derive(Debug, Clone, Copy)]
pub struct TankStats {
    /// Forward speed in units per second
    pub move_speed: f32,
    pub max_health: f32,
    /// Incoming damage multiplier, 0-1 (lower is tougher)
    pub armor: f32,
    /// Seconds between shots
    pub fire_cooldown: f64,
    pub damage: f32,
    /// Hull collision radius
    pub radius: f32,
}

impl TankStats {
    pub fn for_class(class: TankClass) -> Self {
        match class {
            TankClass::Light => Self {
                move_speed: 120.0,
                max_health: 75.0,
                armor: 0.8,
                fire_cooldown: 0.2,
                damage: 20.0,
                radius: 12.0,
            },
            TankClass::Medium => Self {
                move_speed: 80.0,
                max_health: 100.0,
                armor: 0.6,
                fire_cooldown: 0.4,
                damage: 30.0,
                radius: 15.0,
            },
            TankClass::Heavy => Self {
                move_speed: 50.0,
                max_health: 150.0,
                armor: 0.4,
                fire_cooldown: 0.6,
                damage: 35.0,
                radius: 18.0,
            },
            TankClass::Artillery => Self {
                move_speed: 30.0,
                max_health: 80.0,
                armor: 0.7,
                fire_cooldown: 1.0,
                damage: 60.0,
                radius: 16.0,
            },
        }
    }
}

/// Closed team tag set; free-form team strings would let a typo create a
/// phantom roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Team {
    pub const ALL: [Team; 4] = [Team::Red, Team::Blue, Team::Green, Team::Yellow];
}

/// A player-controlled tank (authoritative state)
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: Uuid,
    pub name: String,
    pub class: TankClass,
    pub team: Option<Team>,
    pub position: Vec2,
    /// Facing angle in radians
    pub angle: f32,
    pub health: f32,
    pub max_health: f32,
    pub last_fire_time: f64,
    pub kills: u32,
    pub deaths: u32,
    pub alive: bool,
    /// Set while dead and waiting to respawn
    pub respawn_at: Option<f64>,
    pub speed_boost_until: f64,
    pub damage_boost_until: f64,
}

impl Tank {
    pub fn new(id: Uuid, name: String, class: TankClass, team: Option<Team>) -> Self {
        let stats = TankStats::for_class(class);
        Self {
            id,
            name,
            class,
            team,
            position: Vec2::ZERO,
            angle: 0.0,
            health: stats.max_health,
            max_health: stats.max_health,
            last_fire_time: 0.0,
            kills: 0,
            deaths: 0,
            alive: true,
            respawn_at: None,
            speed_boost_until: 0.0,
            damage_boost_until: 0.0,
        }
    }

    pub fn stats(&self) -> TankStats {
        TankStats::for_class(self.class)
    }

    pub fn radius(&self) -> f32 {
        self.stats().radius
    }

    /// Apply one movement step. The whole displacement is rejected if the
    /// candidate position would overlap an obstacle; otherwise the position
    /// is clamped to the world bounds minus the hull radius. Dead tanks
    /// ignore input entirely.
    pub fn update(
        &mut self,
        now: f64,
        dt: f32,
        input: &InputState,
        world: Vec2,
        obstacles: &[Obstacle],
    ) {
        if !self.alive {
            return;
        }

        if input.left {
            self.angle -= ROTATION_RATE * dt;
        }
        if input.right {
            self.angle += ROTATION_RATE * dt;
        }

        let mut speed = self.stats().move_speed;
        if now < self.speed_boost_until {
            speed *= SPEED_BOOST_MULTIPLIER;
        }

        let forward = Vec2::from_angle(self.angle);
        let mut movement = Vec2::ZERO;
        if input.up {
            movement = movement + forward * (speed * dt);
        }
        if input.down {
            movement = movement - forward * (speed * dt * BACKWARD_FACTOR);
        }

        let candidate = self.position + movement;
        let radius = self.radius();

        if obstacles.iter().any(|o| o.blocks_tank(candidate, radius)) {
            return;
        }

        self.position = Vec2::new(
            candidate.x.clamp(radius, world.x - radius),
            candidate.y.clamp(radius, world.y - radius),
        );
    }

    pub fn can_fire(&self, now: f64) -> bool {
        self.alive && now - self.last_fire_time >= self.stats().fire_cooldown
    }

    /// Fire a bullet from the barrel tip (two hull radii along the facing).
    /// Returns `None` while on cooldown or dead.
    pub fn fire(&mut self, now: f64) -> Option<Bullet> {
        if !self.can_fire(now) {
            return None;
        }
        self.last_fire_time = now;

        let barrel_length = self.radius() * 2.0;
        let muzzle = self.position + Vec2::from_angle(self.angle) * barrel_length;

        let mut damage = self.stats().damage;
        if now < self.damage_boost_until {
            damage *= DAMAGE_BOOST_MULTIPLIER;
        }

        Some(Bullet::new(muzzle, self.angle, self.id, damage, now))
    }

    /// Apply armor-scaled damage. A tank that reaches zero health dies and
    /// schedules its respawn; further damage is a no-op.
    pub fn take_damage(&mut self, now: f64, amount: f32) {
        if !self.alive {
            return;
        }

        self.health -= amount * self.stats().armor;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
            self.deaths += 1;
            self.respawn_at = Some(now + RESPAWN_DELAY);
        }
    }

    /// Reset to fighting state at a new position with a fresh facing angle
    pub fn respawn(&mut self, position: Vec2, angle: f32) {
        self.position = position;
        self.health = self.max_health;
        self.alive = true;
        self.angle = angle;
        self.respawn_at = None;
        self.speed_boost_until = 0.0;
        self.damage_boost_until = 0.0;
    }

    pub fn apply_power_up(&mut self, now: f64, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Health => {
                self.health = (self.health + HEALTH_PACK_VALUE as f32).min(self.max_health);
            }
            PowerUpKind::Speed => {
                self.speed_boost_until = now + BOOST_DURATION;
            }
            PowerUpKind::Damage => {
                self.damage_boost_until = now + BOOST_DURATION;
            }
        }
    }
}

/// A live bullet. Lifetime expiry and world-bounds exit are the room's call,
/// so one bullet type works for any arena size.
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    pub position: Vec2,
    pub velocity: Vec2,
    pub owner: Uuid,
    pub damage: f32,
    pub created_at: f64,
}

impl Bullet {
    pub fn new(position: Vec2, angle: f32, owner: Uuid, damage: f32, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            velocity: Vec2::from_angle(angle) * BULLET_SPEED,
            owner,
            damage,
            created_at: now,
        }
    }

    /// Integrate position only; no lifetime bookkeeping here
    pub fn update(&mut self, dt: f32) {
        self.position = self.position + self.velocity * dt;
    }

    pub fn expired(&self, now: f64) -> bool {
        now - self.created_at >= BULLET_LIFETIME
    }
}

/// Static axis-aligned obstacle; blocks tank movement, destroys bullets
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub rect: Rect,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
        }
    }

    pub fn blocks_tank(&self, center: Vec2, radius: f32) -> bool {
        self.rect.overlaps_circle(center, radius)
    }

    pub fn blocks_bullet(&self, position: Vec2) -> bool {
        self.rect.overlaps_circle(position, BULLET_RADIUS)
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Health,
    Speed,
    Damage,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Health, PowerUpKind::Speed, PowerUpKind::Damage];

    /// Wire value; only health packs carry a magnitude
    pub fn value(&self) -> u32 {
        match self {
            PowerUpKind::Health => HEALTH_PACK_VALUE,
            PowerUpKind::Speed | PowerUpKind::Damage => 0,
        }
    }
}

/// Timed pickup, consumed on first contact with any living tank
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: Uuid,
    pub position: Vec2,
    pub kind: PowerUpKind,
    pub created_at: f64,
}

impl PowerUp {
    pub fn new(position: Vec2, kind: PowerUpKind, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            kind,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at > POWER_UP_LIFETIME
    }

    pub fn overlaps_tank(&self, tank: &Tank) -> bool {
        self.position.distance(tank.position) < POWER_UP_PICKUP_RADIUS
    }
}

/// Capturable team flag for capture mode
#[derive(Debug, Clone)]
pub struct Flag {
    pub id: Uuid,
    pub position: Vec2,
    pub team: Team,
    pub captured: bool,
    pub carrier: Option<Uuid>,
}

impl Flag {
    pub fn new(position: Vec2, team: Team) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            team,
            captured: false,
            carrier: None,
        }
    }

    pub fn release(&mut self) {
        self.captured = false;
        self.carrier = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn tank(class: TankClass) -> Tank {
        Tank::new(Uuid::new_v4(), "test".to_string(), class, None)
    }

    const WORLD: Vec2 = Vec2 { x: 1000.0, y: 700.0 };

    #[test]
    fn test_class_stats() {
        let light = TankStats::for_class(TankClass::Light);
        assert_approx_eq!(light.move_speed, 120.0);
        assert_approx_eq!(light.armor, 0.8);

        let artillery = TankStats::for_class(TankClass::Artillery);
        assert_approx_eq!(artillery.damage, 60.0);
        assert_approx_eq!(artillery.fire_cooldown as f32, 1.0);
    }

    #[test]
    fn test_forward_movement_along_facing() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(500.0, 350.0);
        t.angle = 0.0;

        let input = InputState {
            up: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[]);

        assert_approx_eq!(t.position.x, 620.0);
        assert_approx_eq!(t.position.y, 350.0);
    }

    #[test]
    fn test_backward_movement_at_half_rate() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(500.0, 350.0);
        t.angle = 0.0;

        let input = InputState {
            down: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[]);

        assert_approx_eq!(t.position.x, 440.0);
    }

    #[test]
    fn test_rotation_inputs() {
        let mut t = tank(TankClass::Medium);
        t.position = Vec2::new(500.0, 350.0);

        let input = InputState {
            right: true,
            ..Default::default()
        };
        t.update(100.0, 0.5, &input, WORLD, &[]);
        assert_approx_eq!(t.angle, ROTATION_RATE * 0.5);

        let input = InputState {
            left: true,
            ..Default::default()
        };
        t.update(100.0, 0.5, &input, WORLD, &[]);
        assert_approx_eq!(t.angle, 0.0);
    }

    #[test]
    fn test_speed_boost_multiplies_movement() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(500.0, 350.0);
        t.angle = 0.0;
        t.speed_boost_until = 200.0;

        let input = InputState {
            up: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[]);

        assert_approx_eq!(t.position.x, 500.0 + 120.0 * 1.5);
    }

    #[test]
    fn test_dead_tank_ignores_input() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(500.0, 350.0);
        t.take_damage(100.0, 1000.0);
        assert!(!t.alive);

        let input = InputState {
            up: true,
            right: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[]);

        assert_eq!(t.position, Vec2::new(500.0, 350.0));
        assert_approx_eq!(t.angle, 0.0);
    }

    #[test]
    fn test_obstacle_rejects_whole_displacement() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(100.0, 100.0);
        t.angle = 0.0;

        let wall = Obstacle::new(180.0, 50.0, 40.0, 100.0);
        let input = InputState {
            up: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[wall]);

        // Candidate (220, 100) overlaps the wall, so no movement at all
        assert_eq!(t.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_position_clamped_to_world_bounds() {
        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(990.0, 350.0);
        t.angle = 0.0;

        let input = InputState {
            up: true,
            ..Default::default()
        };
        t.update(100.0, 1.0, &input, WORLD, &[]);

        assert_approx_eq!(t.position.x, WORLD.x - t.radius());
    }

    #[test]
    fn test_fire_cooldown_window() {
        let mut t = tank(TankClass::Medium); // 0.4s cooldown
        assert!(t.can_fire(100.0));
        assert!(t.fire(100.0).is_some());

        assert!(!t.can_fire(100.39));
        assert!(t.fire(100.39).is_none());
        assert!(t.can_fire(100.4));
    }

    #[test]
    fn test_fire_spawns_at_barrel_tip() {
        let mut t = tank(TankClass::Medium);
        t.position = Vec2::new(500.0, 350.0);
        t.angle = 0.0;

        let b = t.fire(100.0).unwrap();
        assert_approx_eq!(b.position.x, 500.0 + 2.0 * t.radius());
        assert_approx_eq!(b.position.y, 350.0);
        assert_approx_eq!(b.velocity.x, BULLET_SPEED);
        assert_approx_eq!(b.damage, 30.0);
        assert_eq!(b.owner, t.id);
    }

    #[test]
    fn test_damage_boost_multiplies_bullet_damage() {
        let mut t = tank(TankClass::Medium);
        t.damage_boost_until = 200.0;

        let b = t.fire(100.0).unwrap();
        assert_approx_eq!(b.damage, 45.0);
    }

    #[test]
    fn test_dead_tank_cannot_fire() {
        let mut t = tank(TankClass::Light);
        t.take_damage(100.0, 1000.0);
        assert!(t.fire(200.0).is_none());
    }

    #[test]
    fn test_armor_scales_damage() {
        let mut t = tank(TankClass::Medium);
        t.health = 100.0;
        // armor 0.6: 30 damage lands as 18
        t.take_damage(100.0, 30.0);
        assert_approx_eq!(t.health, 82.0);
        assert!(t.alive);
    }

    #[test]
    fn test_lethal_damage_schedules_respawn() {
        let mut t = tank(TankClass::Light);
        t.health = 10.0;

        t.take_damage(100.0, 100.0);
        assert_approx_eq!(t.health, 0.0);
        assert!(!t.alive);
        assert_eq!(t.deaths, 1);
        assert_eq!(t.respawn_at, Some(100.0 + RESPAWN_DELAY));
    }

    #[test]
    fn test_damage_idempotent_once_dead() {
        let mut t = tank(TankClass::Light);
        t.take_damage(100.0, 1000.0);
        let deaths = t.deaths;

        t.take_damage(101.0, 50.0);
        assert_approx_eq!(t.health, 0.0);
        assert_eq!(t.deaths, deaths);
        assert_eq!(t.respawn_at, Some(100.0 + RESPAWN_DELAY));
    }

    #[test]
    fn test_respawn_resets_state() {
        let mut t = tank(TankClass::Heavy);
        t.take_damage(100.0, 1000.0);
        t.speed_boost_until = 500.0;
        t.damage_boost_until = 500.0;

        t.respawn(Vec2::new(42.0, 42.0), 1.0);
        assert!(t.alive);
        assert_approx_eq!(t.health, t.max_health);
        assert_eq!(t.position, Vec2::new(42.0, 42.0));
        assert_eq!(t.respawn_at, None);
        assert_approx_eq!(t.speed_boost_until as f32, 0.0);
        assert_approx_eq!(t.damage_boost_until as f32, 0.0);
    }

    #[test]
    fn test_health_pack_heals_up_to_max() {
        let mut t = tank(TankClass::Medium);
        t.health = 30.0;
        t.apply_power_up(100.0, PowerUpKind::Health);
        assert_approx_eq!(t.health, 80.0);

        t.apply_power_up(100.0, PowerUpKind::Health);
        assert_approx_eq!(t.health, t.max_health);
    }

    #[test]
    fn test_boost_refreshes_instead_of_stacking() {
        let mut t = tank(TankClass::Light);

        t.apply_power_up(100.0, PowerUpKind::Speed);
        assert_eq!(t.speed_boost_until, 110.0);

        // Collecting again 2 seconds later resets to now+10, not +12
        t.apply_power_up(102.0, PowerUpKind::Speed);
        assert_eq!(t.speed_boost_until, 112.0);
    }

    #[test]
    fn test_bullet_integration_and_lifetime() {
        let mut b = Bullet::new(Vec2::ZERO, 0.0, Uuid::new_v4(), 25.0, 100.0);
        b.update(0.5);
        assert_approx_eq!(b.position.x, 200.0);

        assert!(!b.expired(100.0 + BULLET_LIFETIME - 0.01));
        assert!(b.expired(100.0 + BULLET_LIFETIME));
    }

    #[test]
    fn test_power_up_expiry_and_pickup_radius() {
        let p = PowerUp::new(Vec2::new(100.0, 100.0), PowerUpKind::Damage, 100.0);
        assert!(!p.is_expired(100.0 + POWER_UP_LIFETIME));
        assert!(p.is_expired(100.0 + POWER_UP_LIFETIME + 0.1));

        let mut t = tank(TankClass::Light);
        t.position = Vec2::new(120.0, 100.0);
        assert!(p.overlaps_tank(&t));
        t.position = Vec2::new(126.0, 100.0);
        assert!(!p.overlaps_tank(&t));
    }
}
