//! Core data models for battle statistics.

mod battle;
mod player;
mod ranking;
mod stats;

pub use battle::*;
pub use player::*;
pub use ranking::*;
pub use stats::*;
