use essence_core::config::{SimulationConfig, TrailConfig};
use essence_core::sensing::{self, TrailContact};
use essence_core::trail::TrailField;
use essence_data::Tick;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Random heading change per second, in radians.
const WANDER_RATE: f32 = 3.0;

/// A wandering agent that lays trail as it moves and bends toward other
/// agents' settled trails.
#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Heading in radians.
    pub heading: f32,
    /// What the walker stood on at the start of its last update.
    pub contact: TrailContact,
}

impl Walker {
    pub fn spawn<R: Rng>(id: u32, width: f32, height: f32, rng: &mut R) -> Self {
        Self {
            id,
            x: rng.gen_range(0.0..width.max(1.0)),
            y: rng.gen_range(0.0..height.max(1.0)),
            heading: rng.gen_range(0.0..TAU),
            contact: TrailContact::Neutral,
        }
    }

    /// Senses, steers, moves and stamps for one tick.
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        field: &mut TrailField,
        rng: &mut R,
        sim: &SimulationConfig,
        trail: &TrailConfig,
        bounds: (f32, f32),
        tick: Tick,
        dt: f32,
    ) {
        let here = field.sample(self.x, self.y, tick);
        self.contact = TrailContact::classify(&here, self.id, trail.cooldown_ticks, trail.own_trail_grace_age);

        self.heading += rng.gen_range(-1.0f32..=1.0) * WANDER_RATE * dt;

        if let Some(pull) = sensing::follow_vector(
            field,
            self.x,
            self.y,
            self.id,
            sim.sample_distance,
            trail.cooldown_ticks,
            tick,
        ) {
            let desired = pull.dy.atan2(pull.dx);
            let steer = (sim.trail_following * dt).min(1.0) * pull.weight.sqrt().min(1.0);
            self.heading += wrap_angle(desired - self.heading) * steer;
        }
        self.heading = self.heading.rem_euclid(TAU);

        let step = sim.agent_speed * dt;
        if step <= 0.0 {
            return;
        }
        self.x += self.heading.cos() * step;
        self.y += self.heading.sin() * step;
        self.bounce(bounds);

        sensing::stamp(
            field,
            self.x,
            self.y,
            trail.deposit_per_sec * dt,
            self.id,
            sim.agent_size * 0.5,
            tick,
        );
    }

    /// Keeps the walker inside `[0, width) × [0, height)`, reflecting its heading off walls.
    pub fn bounce(&mut self, (width, height): (f32, f32)) {
        if self.x < 0.0 {
            self.x = -self.x;
            self.heading = PI - self.heading;
        } else if self.x >= width {
            self.x = 2.0 * width - self.x;
            self.heading = PI - self.heading;
        }
        if self.y < 0.0 {
            self.y = -self.y;
            self.heading = -self.heading;
        } else if self.y >= height {
            self.y = 2.0 * height - self.y;
            self.heading = -self.heading;
        }
        self.x = self.x.clamp(0.0, (width - 0.001).max(0.0));
        self.y = self.y.clamp(0.0, (height - 0.001).max(0.0));
        self.heading = self.heading.rem_euclid(TAU);
    }
}

/// Maps an angle difference into `(-PI, PI]`.
fn wrap_angle(a: f32) -> f32 {
    let a = (a + PI).rem_euclid(TAU) - PI;
    if a <= -PI {
        a + TAU
    } else {
        a
    }
}
