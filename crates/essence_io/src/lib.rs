//! # Essence IO
//!
//! I/O and persistence layer for the Essence trail simulation.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - Serialization/deserialization (JSON, gzip JSON, rkyv)
//! - Save-state files and lenient per-channel decoding

/// Error types and result aliases for I/O operations
pub mod error;
/// Save-state files and trail snapshot restore
pub mod persistence;
/// Validated serialization helpers for JSON
pub mod serialization;

pub use error::{IoError, Result};
pub use persistence::{
    decode_state, load_state, new_save_state, restore_into, save_state, ChannelFaults, LoadedState,
    SaveFormat,
};
pub use serialization::{from_json, read_json_file, to_json, to_json_pretty, write_json_file};
