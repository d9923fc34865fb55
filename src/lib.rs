//! Library crate for connect-five-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence layer: game stores and their errors.
pub mod dao;
/// Wire types exchanged over HTTP.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers.
pub mod routes;
/// Game, matchmaking and storage supervision logic.
pub mod services;
/// Shared application state and the game rules.
pub mod state;
