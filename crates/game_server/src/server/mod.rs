//! Core server implementation and connection handling.
//!
//! This module contains the main game server structure, the logic for
//! handling client connections and the task that owns the world.

pub mod core;
pub mod handlers;
pub mod world_task;

pub use core::GameServer;
pub use world_task::{run_world, WorldInput};
