//! Battery outage playback: a facility battery, its operating mode, and the
//! stations it feeds, stepped tick by tick over a load trajectory.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
/// Station details roster.
pub mod roster;
pub mod runner;
/// Mode controller, battery dynamics, station allocation, and playback.
pub mod sim;
pub mod trajectory;

pub use error::{Error, Result};
