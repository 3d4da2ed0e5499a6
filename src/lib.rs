//! fgc_notes: per-character strategy notebooks for fighting games
//!
//! Core layers exposed by this lib:
//! - Credential Store: accounts keyed by lowercase username (Sled tree `users`)
//! - Notes Store: one JSON document per (user, game) (Sled tree `notes`)
//! - Catalog: built-in game rosters used to validate routes

pub mod auth;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod notes;
// REST API module: Axum HTTP handlers guarded by session tokens
pub mod rest;
pub mod storage;
pub mod telemetry;
