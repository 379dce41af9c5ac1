//! FerryLight proxy: a resilient fetch layer in front of the ferry status
//! and weather station upstreams.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod retry;
pub mod server;
pub mod session;
pub mod upstream;
pub mod verify;
