//! Core shared types and logic for FishTracker
//! 
//! This crate contains:
//! - Data models shared between the desktop and WASM hosts
//! - The per-user local sighting store and its storage backend trait
//! - Catalog reconciliation, filtering and progress
//! - Sighting validation and recording
//! - Remote source traits and wire types
//! - Error types

pub mod models;
pub mod messages;
pub mod error;
pub mod store;
pub mod catalog;
pub mod sighting;
pub mod custom;
pub mod source;
pub mod tracker;

pub use models::*;
pub use messages::*;
pub use error::*;
pub use store::*;
pub use catalog::*;
pub use sighting::*;
pub use custom::*;
pub use source::*;
pub use tracker::*;
