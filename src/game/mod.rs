//! Game simulation modules

pub mod entity;
pub mod geometry;
pub mod room;
pub mod snapshot;
pub mod tick;

pub use room::{GameMode, Room, RoomConfig};

/// Directional + fire flags decoded from a single input command
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
}
