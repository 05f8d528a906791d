#![forbid(unsafe_code)]

//! Core domain model and business logic for PPGym.
//!
//! This crate provides:
//! - Domain types (programs, templates, sessions, weights)
//! - The built-in template catalog and program rotations
//! - The session lifecycle manager and its key-value persistence port
//! - Statistics and CSV export over the workout history

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod rotation;
pub mod store;
pub mod snapshot;
pub mod manager;
pub mod stats;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog};
pub use config::Config;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use manager::SessionManager;
pub use stats::{compute_statistics, DailyProgress, WorkoutStats};
pub use export::write_history_csv;
