use super::walker::Walker;
use essence_core::config::AppConfig;
use essence_core::metrics::Metrics;
use essence_core::trail::{RestoreReport, TrailField};
use essence_data::{SaveState, Tick};
use essence_io::LoadedState;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seed used when the configuration does not name one.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Owns the trail field and the agents that write to it.
pub struct App {
    pub(super) config: AppConfig,
    pub(super) field: TrailField,
    pub(super) walkers: Vec<Walker>,
    pub(super) rng: ChaCha8Rng,
    pub(super) tick: Tick,
    pub(super) seed: u64,
    pub(super) metrics: Metrics,
}

impl App {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let seed = config.simulation.seed.unwrap_or(DEFAULT_SEED);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let (w, h) = (config.viewport.width, config.viewport.height);
        let field = TrailField::with_viewport(config.trail.clone(), w, h);
        let walkers = (1..=config.simulation.agents as u32)
            .map(|id| Walker::spawn(id, w, h, &mut rng))
            .collect();
        let metrics = Metrics::new(config.simulation.log_interval);

        tracing::info!(
            seed = seed,
            agents = config.simulation.agents,
            grid_width = field.width(),
            grid_height = field.height(),
            "Simulation created"
        );

        Ok(Self {
            config,
            field,
            walkers,
            rng,
            tick: 0,
            seed,
            metrics,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn field(&self) -> &TrailField {
        &self.field
    }

    #[must_use]
    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    #[must_use]
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Captures the published trail state with the current tick.
    #[must_use]
    pub fn export_state(&self) -> SaveState {
        essence_io::new_save_state(
            self.tick,
            self.field.export_snapshot(),
            Some(self.config.fingerprint()),
        )
    }

    /// Restores tick and trail from a save. Channels that do not fit are skipped.
    pub fn import_state(&mut self, loaded: &LoadedState) -> RestoreReport {
        let state = &loaded.state;
        let fingerprint = self.config.fingerprint();
        if let Some(saved) = &state.metadata.config_fingerprint {
            if *saved != fingerprint {
                tracing::warn!(
                    saved = %saved,
                    running = %fingerprint,
                    "Save was made under different trail rules"
                );
            }
        }

        self.tick = state.tick;
        let report = essence_io::restore_into(&mut self.field, loaded);
        if report.rejected_count() > 0 {
            self.metrics.increment_counter("restore_rejected");
        }
        tracing::info!(
            tick = self.tick,
            applied = report.applied_count(),
            rejected = report.rejected_count(),
            "Imported state"
        );
        report
    }
}
