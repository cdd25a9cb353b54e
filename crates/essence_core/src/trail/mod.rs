//! Trail field: a decaying, diffusing scalar grid laid over the viewport.
//!
//! Agents write into the live buffers through [`TrailField::deposit`]; every
//! read through [`TrailField::sample`] goes to the snapshot buffers, which only
//! move forward on [`TrailField::capture_snapshot`]. Sensing within a tick is
//! therefore independent of the order in which agents deposit.

pub mod channels;
pub mod diffusion;

pub use channels::{ChannelRestore, Channels, RestoreReport};

use crate::composite::{GlowCompositor, GlowPlan};
use crate::config::TrailConfig;
use crate::metrics::FieldStats;
use crate::palette;
use crate::raster::TrailRaster;
use channels::{check_amounts, check_len};
use essence_data::{Rgb, Tick, TrailSample, TrailSnapshot};
use std::collections::HashSet;

/// Smallest cell edge a grid is built with, in pixels.
pub const MIN_CELL_SIZE: f32 = 1.0;

/// Cell size actually used for `requested`; non-finite or sub-pixel sizes fall back to the minimum.
fn usable_cell_size(requested: f32) -> f32 {
    if requested.is_finite() {
        requested.max(MIN_CELL_SIZE)
    } else {
        MIN_CELL_SIZE
    }
}

#[derive(Debug, Clone)]
pub struct TrailField {
    config: TrailConfig,
    width: usize,
    height: usize,
    cell_size: f32,
    live: Channels,
    snapshot: Channels,
    scratch: Vec<f32>,
    raster: TrailRaster,
}

impl TrailField {
    /// Creates an unallocated field. Nothing is stored until the first [`resize`](Self::resize).
    #[must_use]
    pub fn new(config: TrailConfig) -> Self {
        let cell_size = usable_cell_size(config.cell_size);
        Self {
            config,
            width: 0,
            height: 0,
            cell_size,
            live: Channels::default(),
            snapshot: Channels::default(),
            scratch: Vec::new(),
            raster: TrailRaster::default(),
        }
    }

    /// Creates a field already sized for the given viewport.
    #[must_use]
    pub fn with_viewport(config: TrailConfig, viewport_width: f32, viewport_height: f32) -> Self {
        let mut field = Self::new(config);
        field.resize(viewport_width, viewport_height);
        field
    }

    #[must_use]
    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    /// Replaces the rules. A new cell size only takes effect on the next resize.
    pub fn set_config(&mut self, config: TrailConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell size the current grid was built with.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub fn is_allocated(&self) -> bool {
        !self.live.is_empty()
    }

    /// Live channels, as mutated by deposits and steps.
    #[must_use]
    pub fn live(&self) -> &Channels {
        &self.live
    }

    /// Channels as of the last capture; what `sample` reads.
    #[must_use]
    pub fn snapshot(&self) -> &Channels {
        &self.snapshot
    }

    #[inline(always)]
    fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.width + ix
    }

    /// Maps a position in pixels to a cell index, or `None` outside the grid.
    #[must_use]
    pub fn cell_index(&self, x: f32, y: f32) -> Option<usize> {
        let fx = (x / self.cell_size).floor();
        let fy = (y / self.cell_size).floor();
        if !(fx >= 0.0 && fy >= 0.0 && fx < self.width as f32 && fy < self.height as f32) {
            return None;
        }
        Some(self.index(fx as usize, fy as usize))
    }

    /// Reallocates the grid for a new viewport, keeping the overlapping cells.
    pub fn resize(&mut self, viewport_width: f32, viewport_height: f32) {
        let old_w = self.width;
        let old_h = self.height;

        self.cell_size = usable_cell_size(self.config.cell_size);
        self.width = ((viewport_width / self.cell_size).floor() as usize).max(1);
        self.height = ((viewport_height / self.cell_size).floor() as usize).max(1);
        let len = self.width * self.height;

        let old_live = std::mem::replace(&mut self.live, Channels::zeroed(len));
        let old_snapshot = std::mem::replace(&mut self.snapshot, Channels::zeroed(len));
        self.scratch = vec![0.0; len];
        self.raster = TrailRaster::new(self.width, self.height);

        if !old_live.is_empty() && old_w > 0 && old_h > 0 {
            let copy_w = old_w.min(self.width);
            let copy_h = old_h.min(self.height);
            self.live
                .copy_overlap(self.width, &old_live, old_w, copy_w, copy_h);
            self.snapshot
                .copy_overlap(self.width, &old_snapshot, old_w, copy_w, copy_h);
        }

        tracing::debug!(
            old_width = old_w,
            old_height = old_h,
            width = self.width,
            height = self.height,
            cell_size = self.cell_size,
            "Trail grid resized"
        );
    }

    /// Zeroes every live channel.
    pub fn clear(&mut self) {
        self.live.fill_zero();
    }

    /// Adds scent at a pixel position. Positions outside the grid are dropped.
    pub fn deposit(&mut self, x: f32, y: f32, amount: f32, author_id: u32, tick: Tick) {
        let Some(i) = self.cell_index(x, y) else {
            return;
        };
        self.live.amount[i] = (self.live.amount[i] + amount.max(0.0)).min(1.0);
        self.live.author[i] = author_id;
        self.live.deposit_tick[i] = tick;
    }

    /// Reads the captured snapshot at a pixel position.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32, tick: Tick) -> TrailSample {
        match self.cell_index(x, y) {
            Some(i) => TrailSample {
                value: self.snapshot.amount[i],
                author_id: self.snapshot.author[i],
                age: f64::from(tick) - f64::from(self.snapshot.deposit_tick[i]),
            },
            None => TrailSample::UNOBSERVED,
        }
    }

    /// Publishes the live channels to readers.
    pub fn capture_snapshot(&mut self) {
        if self.is_allocated() {
            self.snapshot.copy_from(&self.live);
        }
    }

    /// Restores persisted channels, each one independently.
    ///
    /// A channel that is missing is skipped; one that does not fit the grid is
    /// logged and skipped without touching the others. Applied channels are
    /// published to the snapshot immediately.
    pub fn apply_snapshot(&mut self, external: Option<&TrailSnapshot>) -> RestoreReport {
        let mut report = RestoreReport::default();
        let Some(external) = external else {
            return report;
        };
        let len = self.cell_count();
        let allocated = self.is_allocated();

        if let Some(amount) = &external.amount {
            report.amount = restore_channel("amount", allocated, || check_amounts(amount, len), || {
                self.live.amount.copy_from_slice(amount);
                self.snapshot.amount.copy_from_slice(&self.live.amount);
            });
        }
        if let Some(author) = &external.author_id {
            report.author_id = restore_channel("authorId", allocated, || check_len(author.len(), len), || {
                self.live.author.copy_from_slice(author);
                self.snapshot.author.copy_from_slice(&self.live.author);
            });
        }
        if let Some(ticks) = &external.deposit_tick {
            report.deposit_tick = restore_channel("depositTick", allocated, || check_len(ticks.len(), len), || {
                self.live.deposit_tick.copy_from_slice(ticks);
                self.snapshot.deposit_tick.copy_from_slice(&self.live.deposit_tick);
            });
        }
        report
    }

    /// Exports the snapshot channels in the persisted layout.
    #[must_use]
    pub fn export_snapshot(&self) -> TrailSnapshot {
        TrailSnapshot {
            amount: Some(self.snapshot.amount.clone()),
            author_id: Some(self.snapshot.author.clone()),
            deposit_tick: Some(self.snapshot.deposit_tick.clone()),
            width: self.width as u32,
            height: self.height as u32,
            cell_size: self.cell_size,
        }
    }

    /// Advances the live amount channel by `dt` seconds: evaporation, then diffusion.
    pub fn step(&mut self, dt: f32) {
        if !self.is_allocated() {
            return;
        }

        let k = self.config.evaporation_per_sec * dt;
        diffusion::evaporate(&mut self.live.amount, k);

        if self.config.diffusion_enabled {
            let alpha = self.config.diffusion_per_sec * dt;
            if alpha > 0.0 {
                diffusion::diffuse_into(
                    &self.live.amount,
                    &mut self.scratch,
                    self.width,
                    self.height,
                    alpha,
                );
                std::mem::swap(&mut self.live.amount, &mut self.scratch);
            }
        }
    }

    /// Renders the live field with the default author palette.
    pub fn draw(&mut self, compositor: &mut dyn GlowCompositor) {
        self.draw_with(compositor, palette::author_color);
    }

    /// Renders the live field, looking author colors up through `color`.
    pub fn draw_with<F>(&mut self, compositor: &mut dyn GlowCompositor, color: F)
    where
        F: Fn(u32) -> Rgb,
    {
        if !self.config.render_enabled || !self.is_allocated() {
            return;
        }
        self.raster
            .paint(&self.live.amount, &self.live.author, color);
        let plan = GlowPlan::for_raster(&self.raster, self.cell_size);
        compositor.composite(&self.raster, &plan);
    }

    /// Aggregates over the live buffer.
    #[must_use]
    pub fn stats(&self) -> FieldStats {
        let mut stats = FieldStats::default();
        let mut authors = HashSet::new();
        for (v, author) in self.live.amount.iter().zip(&self.live.author) {
            stats.total_mass += f64::from(*v);
            stats.peak = stats.peak.max(*v);
            if *v > 0.0 {
                stats.occupied_cells += 1;
                if *author != 0 {
                    authors.insert(*author);
                }
            }
        }
        stats.distinct_authors = authors.len();
        stats
    }
}

fn restore_channel<C, A>(name: &str, allocated: bool, check: C, apply: A) -> ChannelRestore
where
    C: FnOnce() -> Result<(), String>,
    A: FnOnce(),
{
    let verdict = if allocated {
        check()
    } else {
        Err("trail grid is not allocated".to_string())
    };
    match verdict {
        Ok(()) => {
            apply();
            ChannelRestore::Applied
        }
        Err(reason) => {
            tracing::warn!(channel = name, reason = %reason, "Failed to apply trail snapshot channel");
            ChannelRestore::Rejected(reason)
        }
    }
}
