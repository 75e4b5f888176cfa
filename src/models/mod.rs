//! Core data models for situational hockey stats.

mod entity;
mod payload;
mod record;
mod strength;

pub use entity::*;
pub use payload::*;
pub use record::*;
pub use strength::*;
