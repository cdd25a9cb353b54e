//! Struct-of-arrays storage for the three per-cell channels.

use essence_data::Tick;

/// Amount, author and recency for every cell, indexed by `y * width + x`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels {
    pub amount: Vec<f32>,
    pub author: Vec<u32>,
    pub deposit_tick: Vec<Tick>,
}

impl Channels {
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            amount: vec![0.0; len],
            author: vec![0; len],
            deposit_tick: vec![0; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.amount.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_empty()
    }

    pub fn fill_zero(&mut self) {
        self.amount.fill(0.0);
        self.author.fill(0);
        self.deposit_tick.fill(0);
    }

    /// Copies every channel from `other`. Both sides must have the same length.
    pub fn copy_from(&mut self, other: &Channels) {
        self.amount.copy_from_slice(&other.amount);
        self.author.copy_from_slice(&other.author);
        self.deposit_tick.copy_from_slice(&other.deposit_tick);
    }

    /// Copies the top-left `copy_w × copy_h` block of `old` (row stride `old_w`)
    /// into `self` (row stride `new_w`).
    pub fn copy_overlap(&mut self, new_w: usize, old: &Channels, old_w: usize, copy_w: usize, copy_h: usize) {
        for y in 0..copy_h {
            let src = y * old_w..y * old_w + copy_w;
            let dst = y * new_w..y * new_w + copy_w;
            self.amount[dst.clone()].copy_from_slice(&old.amount[src.clone()]);
            self.author[dst.clone()].copy_from_slice(&old.author[src.clone()]);
            self.deposit_tick[dst].copy_from_slice(&old.deposit_tick[src]);
        }
    }
}

/// Outcome of restoring one channel from persisted data.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRestore {
    /// The snapshot did not carry this channel.
    Absent,
    Applied,
    /// The channel was present but unusable; the live data was left alone.
    Rejected(String),
}

impl ChannelRestore {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, ChannelRestore::Applied)
    }
}

/// Per-channel result of [`super::TrailField::apply_snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub amount: ChannelRestore,
    pub author_id: ChannelRestore,
    pub deposit_tick: ChannelRestore,
}

impl Default for RestoreReport {
    fn default() -> Self {
        Self {
            amount: ChannelRestore::Absent,
            author_id: ChannelRestore::Absent,
            deposit_tick: ChannelRestore::Absent,
        }
    }
}

impl RestoreReport {
    #[must_use]
    pub fn applied_count(&self) -> usize {
        [&self.amount, &self.author_id, &self.deposit_tick]
            .iter()
            .filter(|c| c.is_applied())
            .count()
    }

    #[must_use]
    pub fn rejected_count(&self) -> usize {
        [&self.amount, &self.author_id, &self.deposit_tick]
            .iter()
            .filter(|c| matches!(c, ChannelRestore::Rejected(_)))
            .count()
    }
}

pub(crate) fn check_len(found: usize, expected: usize) -> Result<(), String> {
    if found == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} cells, found {found}"))
    }
}

pub(crate) fn check_amounts(values: &[f32], expected: usize) -> Result<(), String> {
    check_len(values.len(), expected)?;
    match values
        .iter()
        .position(|v| !v.is_finite() || *v < 0.0 || *v > 1.0)
    {
        Some(i) => Err(format!("amount {} at cell {i} is outside [0, 1]", values[i])),
        None => Ok(()),
    }
}
