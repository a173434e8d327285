//! tagquest-core library.
//!
//! Decides, for every user interaction with a quest (answer, hide, split,
//! delete, create note, replace, undo), whether the action is legal, turns the
//! answer into a minimal tag diff, and keeps the cached element data
//! consistent afterwards.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the library seams, `anyhow::Result`
//!   for config and database bootstrap.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod model;
pub mod quest_type;
pub mod store;
pub mod tags;

pub use controller::{Answer, QuestController};
pub use error::{ErrorCode, QuestError, StoreError};
