use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Simulation tick as stored in the recency channel.
pub type Tick = u32;

/// Result of a point query against the trail field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrailSample {
    /// Scent intensity in `[0, 1]`.
    pub value: f32,
    /// Most recent depositor, `0` when nobody has written the cell.
    pub author_id: u32,
    /// Ticks since the last deposit. Infinite outside the grid.
    pub age: f64,
}

impl TrailSample {
    /// Returned for coordinates that fall outside the grid.
    pub const UNOBSERVED: TrailSample = TrailSample {
        value: 0.0,
        author_id: 0,
        age: f64::INFINITY,
    };

    #[must_use]
    pub fn is_unobserved(&self) -> bool {
        self.age.is_infinite()
    }
}

impl Default for TrailSample {
    fn default() -> Self {
        Self::UNOBSERVED
    }
}

/// Persisted trail channels, row-major (`index = y * width + x`).
///
/// Every channel is optional so a save can carry any subset of them and a
/// restore can apply each one independently.
#[derive(
    Serialize, Deserialize, Debug, Clone, PartialEq, Default, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
#[serde(rename_all = "camelCase")]
pub struct TrailSnapshot {
    #[serde(default)]
    pub amount: Option<Vec<f32>>,
    #[serde(default)]
    pub author_id: Option<Vec<u32>>,
    #[serde(default)]
    pub deposit_tick: Option<Vec<u32>>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub cell_size: f32,
}

impl TrailSnapshot {
    /// Number of cells described by the width/height metadata.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
