//! Configuration management for the trail field and its driver.
//!
//! This module provides strongly-typed configuration structures that map to
//! the `config.toml` file. Every field has a default, so a partial file only
//! overrides what it names.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [trail]
//! cell_size = 7.0
//! evaporation_per_sec = 0.05
//! diffusion_enabled = true
//! diffusion_per_sec = 0.08
//!
//! [viewport]
//! width = 1280.0
//! height = 720.0
//!
//! [simulation]
//! agents = 4
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};

/// Rules of the trail field itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrailConfig {
    /// Edge length of one grid cell in pixels.
    pub cell_size: f32,
    /// Trail strength an agent lays per second of movement.
    pub deposit_per_sec: f32,
    /// Fraction of the current amount lost per second.
    pub evaporation_per_sec: f32,
    pub diffusion_enabled: bool,
    /// Fraction of the gap to the neighbour mean closed per second.
    pub diffusion_per_sec: f32,
    pub render_enabled: bool,
    /// Minimum age before another author's trail is worth following.
    pub cooldown_ticks: u32,
    /// Age under which an agent's own trail counts as fresh.
    pub own_trail_grace_age: u32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            cell_size: 7.0,
            deposit_per_sec: 2.5,
            evaporation_per_sec: 0.05,
            diffusion_enabled: true,
            diffusion_per_sec: 0.08,
            render_enabled: true,
            cooldown_ticks: 8,
            own_trail_grace_age: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Parameters of the headless driver that feeds the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub agents: usize,
    pub seed: Option<u64>,
    /// Upper bound applied to every frame delta before it reaches the field.
    pub max_dt: f32,
    /// Delta used when the driver runs without a wall clock.
    pub fixed_dt: f32,
    /// Agent speed in pixels per second.
    pub agent_speed: f32,
    /// Agent diameter in pixels.
    pub agent_size: f32,
    /// Radius of the ring sampled when following trails.
    pub sample_distance: f32,
    pub trail_following: f32,
    /// Ticks between metric log lines.
    pub log_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 4,
            seed: None,
            max_dt: 0.1,
            fixed_dt: 1.0 / 60.0,
            agent_speed: 80.0,
            agent_size: 15.0,
            sample_distance: 30.0,
            trail_following: 2.6,
            log_interval: 600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub trail: TrailConfig,
    pub viewport: ViewportConfig,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.trail;
        anyhow::ensure!(
            t.cell_size.is_finite() && (1.0..=40.0).contains(&t.cell_size),
            "Trail cell size must be in [1, 40] px"
        );
        anyhow::ensure!(
            t.deposit_per_sec.is_finite() && t.deposit_per_sec >= 0.0,
            "Deposit rate must be non-negative"
        );
        anyhow::ensure!(
            t.evaporation_per_sec.is_finite() && t.evaporation_per_sec >= 0.0,
            "Evaporation rate must be non-negative"
        );
        anyhow::ensure!(
            t.diffusion_per_sec.is_finite() && t.diffusion_per_sec >= 0.0,
            "Diffusion rate must be non-negative"
        );

        let v = &self.viewport;
        anyhow::ensure!(
            v.width.is_finite() && v.width > 0.0,
            "Viewport width must be positive"
        );
        anyhow::ensure!(
            v.height.is_finite() && v.height > 0.0,
            "Viewport height must be positive"
        );

        let s = &self.simulation;
        anyhow::ensure!(
            s.max_dt > 0.0 && s.max_dt <= 1.0,
            "Max dt must be in (0, 1] seconds"
        );
        anyhow::ensure!(
            s.fixed_dt > 0.0 && s.fixed_dt <= s.max_dt,
            "Fixed dt must be in (0, max_dt]"
        );
        anyhow::ensure!(
            s.agent_speed.is_finite() && s.agent_speed >= 0.0,
            "Agent speed must be non-negative"
        );
        anyhow::ensure!(
            s.agent_size.is_finite() && s.agent_size > 0.0,
            "Agent size must be positive"
        );
        anyhow::ensure!(s.log_interval > 0, "Log interval must be positive");

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of the trail rules, stamped into save files.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.trail).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_cell_size() {
        let config = AppConfig {
            trail: TrailConfig {
                cell_size: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_evaporation() {
        let config = AppConfig {
            trail: TrailConfig {
                evaporation_per_sec: -0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_dt_above_cap() {
        let config = AppConfig {
            simulation: SimulationConfig {
                fixed_dt: 0.5,
                max_dt: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml("[trail]\ncell_size = 10.0\n").unwrap();
        assert_eq!(config.trail.cell_size, 10.0);
        assert_eq!(config.trail.evaporation_per_sec, 0.05);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(AppConfig::from_toml("[trail]\ncell_size = 100.0\n").is_err());
        assert!(AppConfig::from_toml("[trail\n").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_trail_rules() {
        let a = AppConfig::default();
        let mut b = AppConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.trail.diffusion_per_sec = 0.2;
        assert_ne!(a.fingerprint(), b.fingerprint());
        // Driver settings do not change the trail rules.
        let mut c = AppConfig::default();
        c.simulation.agents = 40;
        assert_eq!(a.fingerprint(), c.fingerprint());
    }
}
