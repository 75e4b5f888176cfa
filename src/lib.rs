//! # Rink Stats
//!
//! Aggregated ice-hockey statistics for players and teams, built from
//! per-situation counting records.
//!
//! ## Architecture
//!
//! - **models**: Situational records, aggregated entities, wire payloads
//! - **calculate**: Normalization, score adjustment, aggregation, derived metrics, ranking
//! - **fetch**: Upstream data retrieval (players and teams endpoints)
//! - **table**: Ranked table assembly and text rendering
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod table;

pub use models::*;
