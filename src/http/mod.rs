//! HTTP surface of the server

pub mod routes;

pub use routes::build_router;
