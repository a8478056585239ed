// Instagram-style sharding - logical shards, physical databases and shard-tagged row ids

// Core types and primitives
pub mod core;

// Sharding infrastructure - codec, routing, connections, provisioning
pub mod infrastructure;

// HTTP routing inspection surface
pub mod shard_interface;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
