//! How agents read and write the trail field.
//!
//! These helpers only go through [`TrailField::deposit`] and
//! [`TrailField::sample`], so they see the same snapshot semantics as any
//! other caller.

use crate::trail::TrailField;
use essence_data::{Tick, TrailSample};
use std::f32::consts::{FRAC_PI_2, PI};

/// Ring deposits sit at this fraction of the agent radius.
pub const RING_FRACTION: f32 = 0.7;
/// Strength of each ring deposit relative to the center one.
pub const RING_SHARE: f32 = 0.25;
/// Directions sampled around an agent when following trails.
pub const FOLLOW_DIRECTIONS: usize = 16;
/// Own trail weaker than this is never considered fresh.
pub const OWN_TRAIL_MIN_VALUE: f32 = 0.1;

/// Lays a full deposit at `(x, y)` and four quarter deposits around it.
pub fn stamp(field: &mut TrailField, x: f32, y: f32, amount: f32, author_id: u32, radius: f32, tick: Tick) {
    field.deposit(x, y, amount, author_id, tick);
    let ring = radius * RING_FRACTION;
    for k in 0..4 {
        let angle = k as f32 * FRAC_PI_2;
        field.deposit(
            x + angle.cos() * ring,
            y + angle.sin() * ring,
            amount * RING_SHARE,
            author_id,
            tick,
        );
    }
}

/// Direction and strength of the pull toward other agents' trails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowPull {
    /// Unit vector toward the weighted trail mass.
    pub dx: f32,
    pub dy: f32,
    /// Mean squared trail value over all sampled directions.
    pub weight: f32,
}

/// Samples a ring of `distance` around `(x, y)` for trails worth following.
///
/// A direction counts only if it carries another agent's trail that is at
/// least `cooldown` ticks old; it then weighs `value²`. Returns `None` when no
/// direction qualifies or the contributions cancel out.
#[must_use]
pub fn follow_vector(
    field: &TrailField,
    x: f32,
    y: f32,
    self_id: u32,
    distance: f32,
    cooldown: u32,
    tick: Tick,
) -> Option<FollowPull> {
    let mut sum_x = 0.0f32;
    let mut sum_y = 0.0f32;
    let mut wsum = 0.0f32;

    for i in 0..FOLLOW_DIRECTIONS {
        let angle = i as f32 * (2.0 * PI / FOLLOW_DIRECTIONS as f32);
        let (sy, cx) = angle.sin_cos();
        let s = field.sample(x + cx * distance, y + sy * distance, tick);
        if s.author_id != 0 && s.author_id != self_id && s.age >= f64::from(cooldown) {
            let w = s.value * s.value;
            sum_x += cx * w;
            sum_y += sy * w;
            wsum += w;
        }
    }

    if wsum <= 0.0 {
        return None;
    }
    let len = sum_x.hypot(sum_y);
    if len <= 0.0 {
        return None;
    }
    Some(FollowPull {
        dx: sum_x / len,
        dy: sum_y / len,
        weight: wsum / FOLLOW_DIRECTIONS as f32,
    })
}

/// What an agent is standing on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrailContact {
    /// Another agent's settled trail. `strength` is the square root of its value.
    Foreign { author_id: u32, strength: f32 },
    /// The agent's own trail, still fresh.
    OwnFresh,
    Neutral,
}

impl TrailContact {
    #[must_use]
    pub fn classify(sample: &TrailSample, self_id: u32, cooldown: u32, grace_age: u32) -> Self {
        let author = sample.author_id;
        if author != 0 && author != self_id && sample.age >= f64::from(cooldown) {
            return TrailContact::Foreign {
                author_id: author,
                strength: sample.value.max(0.0).sqrt(),
            };
        }
        if author == self_id
            && author != 0
            && sample.age < f64::from(grace_age)
            && sample.value > OWN_TRAIL_MIN_VALUE
        {
            return TrailContact::OwnFresh;
        }
        TrailContact::Neutral
    }
}
