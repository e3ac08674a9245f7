//! Frost / no-frost classification for an airport from five surface
//! readings, one record at a time or a whole uploaded sheet at once.

pub mod batch;
pub mod classifier;
pub mod config;
pub mod decision;
pub mod error;
pub mod features;
pub mod model;
pub mod server;
pub mod single;
pub mod table;
pub mod types;

pub use classifier::Classifier;
pub use error::{FrostError, Result};
