//! Headless driver: a fixed population of walkers over one trail field.
//!
//! Each tick publishes the previous tick's field, lets every walker sense
//! and deposit, then advances evaporation and diffusion.

pub mod state;
pub mod walker;

pub use state::{App, DEFAULT_SEED};
pub use walker::Walker;

use essence_core::composite::GlowCompositor;
use essence_core::sensing::TrailContact;

impl App {
    /// Advances the simulation by one frame of `dt` seconds.
    ///
    /// `dt` is clamped to `[0, max_dt]`; non-finite deltas count as zero.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.simulation.max_dt)
        } else {
            0.0
        };
        self.tick = self.tick.wrapping_add(1);

        self.field.capture_snapshot();

        let bounds = (self.config.viewport.width, self.config.viewport.height);
        for walker in &mut self.walkers {
            walker.update(
                &mut self.field,
                &mut self.rng,
                &self.config.simulation,
                &self.config.trail,
                bounds,
                self.tick,
                dt,
            );
            if let TrailContact::Foreign { .. } = walker.contact {
                self.metrics.increment_counter("foreign_contacts");
            }
        }

        self.field.step(dt);
        self.metrics.record_tick(self.field.stats());
    }

    /// Runs `ticks` frames at the configured fixed delta.
    pub fn run(&mut self, ticks: u64) {
        let dt = self.config.simulation.fixed_dt;
        for _ in 0..ticks {
            self.tick(dt);
        }
    }

    pub fn render(&mut self, compositor: &mut dyn GlowCompositor) {
        self.field.draw(compositor);
    }

    /// Resizes the viewport, keeping overlapping trail and walkers inside it.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            tracing::warn!(width, height, "Ignoring invalid viewport size");
            return;
        }
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        self.field.resize(width, height);
        for walker in &mut self.walkers {
            walker.bounce((width, height));
        }
    }
}
