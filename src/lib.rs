//! Library crate for game-chapters-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Persistence: models, the storage trait and its backends.
pub mod dao;
mod dto;
mod error;
/// HTTP route trees.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
