//! # Tagmark Kiosk
//!
//! The attendance kiosk binary: serial tag reader, ingestion loop, email
//! notifier and the display command bus.

pub mod display;
pub mod ingest;
pub mod notifier;
pub mod reader;
