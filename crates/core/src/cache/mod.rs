//! SQLite-backed cache of response snapshots, organised into generations.
//!
//! This module provides a persistent key→response store with async access
//! via tokio-rusqlite. It supports:
//!
//! - Content-addressed keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Named generations, swept wholesale on activation

pub mod connection;
pub mod entries;
pub mod generations;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheStore;
pub use entries::CacheEntry;
pub use generations::GenerationStats;
