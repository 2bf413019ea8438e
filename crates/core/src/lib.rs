//! Core types and shared functionality for lantern.
//!
//! This crate provides:
//! - Generation-organised cache store with SQLite backend
//! - Unified error types
//! - Layered application configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, CacheStore};
pub use config::AppConfig;
pub use error::Error;
