//! # Essence Core
//!
//! The trail field engine behind Essence: a coarse grid laid over the
//! viewport where agents leave fading, spreading marks that other agents can
//! sense and that render as a soft glow.
//!
//! This crate contains:
//! - The trail field itself (deposit, sample, evaporation, diffusion, resize)
//! - Snapshot capture and per-channel restore
//! - Rasterization and the three-pass glow composition plan
//! - Agent-facing sensing helpers
//! - Configuration, metrics and structured logging
//!
//! ## Architecture
//!
//! Every cell keeps three channels (amount, author, deposit tick) in a live
//! buffer and a snapshot buffer. Writes go to the live buffer; reads come
//! from the snapshot captured at the start of the tick, so agents sensing
//! the field within one tick all see the same state regardless of order.
//! Diffusion is double-buffered and, with the `std` feature, row-parallel.
//!
//! ## Example
//!
//! ```
//! use essence_core::config::TrailConfig;
//! use essence_core::trail::TrailField;
//!
//! let mut field = TrailField::with_viewport(TrailConfig::default(), 700.0, 350.0);
//! field.capture_snapshot();
//! field.deposit(20.0, 20.0, 0.5, 1, 3);
//! field.capture_snapshot();
//!
//! let sample = field.sample(20.0, 20.0, 10);
//! assert_eq!(sample.author_id, 1);
//! assert_eq!(sample.age, 7.0);
//! ```

/// Glow composition plan and compositor backends
pub mod composite;
/// Configuration management for trail and simulation parameters
pub mod config;
/// Field statistics, metrics collection and logging
pub mod metrics;
/// Author color assignment
pub mod palette;
/// Per-cell RGBA rasterization
pub mod raster;
/// Stamping, trail following and contact classification for agents
pub mod sensing;
/// The trail field grid
pub mod trail;

pub use composite::{GlowCompositor, GlowPass, GlowPlan, NullCompositor, SoftwareCompositor};
pub use config::{AppConfig, SimulationConfig, TrailConfig, ViewportConfig};
pub use metrics::{init_logging, FieldStats, Metrics};
pub use raster::TrailRaster;
pub use sensing::{FollowPull, TrailContact};
pub use trail::{ChannelRestore, Channels, RestoreReport, TrailField};
