//! Matchmaking and room registry

pub mod registry;

pub use registry::Registry;
