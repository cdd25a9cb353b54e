//! Plain data shared by the Essence Engine crates.
//!
//! Nothing in here knows how the trail field evolves; these are the shapes
//! that cross crate boundaries and hit the disk.

pub mod data;

pub use data::color::Rgb;
pub use data::save::{SaveMetadata, SaveState, SAVE_FORMAT_VERSION};
pub use data::trail::{Tick, TrailSample, TrailSnapshot};
