//! # Tagmark Common Library
//!
//! Shared code for the Tagmark attendance kiosk:
//! - Database initialization and the registry / attendance log stores
//! - Shared event and model types
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::AttendanceAction;
