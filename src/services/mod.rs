/// OpenAPI documentation generation.
pub mod documentation;
/// Atomic join-by-search over open games.
pub mod game_finder;
/// Game lifecycle: create, join, move, finish.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Background reconnection and degraded-mode tracking for the storage backend.
pub mod storage_supervisor;
