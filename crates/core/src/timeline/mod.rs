use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{BodyState, Wavefront};

/// Whether the engine advances automatically on each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    #[default]
    Playing,
    Paused,
}

/// Model-time clock driven by real frame deltas.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    pub time_seconds: f64,
    /// Model seconds per real second.
    pub time_scale: f64,
    /// Signed speed multiplier; negative values request a rewind.
    pub time_speed: f64,
    pub state: PlayState,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            time_seconds: 0.0,
            time_scale: 1.0,
            time_speed: 1.0,
            state: PlayState::Playing,
        }
    }
}

impl SimulationClock {
    pub fn new(time_scale: f64, time_speed: f64) -> Self {
        Self {
            time_scale,
            time_speed,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn is_reversed(&self) -> bool {
        self.time_speed < 0.0
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            PlayState::Playing => PlayState::Paused,
            PlayState::Paused => PlayState::Playing,
        };
    }

    /// Converts an elapsed real-time delta into a signed model-time delta.
    pub fn model_delta(&self, real_dt: f64) -> f64 {
        real_dt * self.time_scale * self.time_speed
    }
}

/// Immutable copy of the physical state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub time: f64,
    pub source: BodyState,
    pub observer: BodyState,
    pub wavefronts: Vec<Wavefront>,
}

/// Bounded ring of snapshots used to rewind the simulation.
///
/// Snapshots are kept in ascending time order; the oldest entry is dropped
/// once the capacity is reached.
#[derive(Debug, Clone)]
pub struct StateHistory {
    snapshots: VecDeque<SimulationSnapshot>,
    capacity: usize,
}

impl StateHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn oldest_time(&self) -> Option<f64> {
        self.snapshots.front().map(|snapshot| snapshot.time)
    }

    pub fn latest(&self) -> Option<&SimulationSnapshot> {
        self.snapshots.back()
    }

    pub fn record(&mut self, snapshot: SimulationSnapshot) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Drops every snapshot later than `time`.
    pub fn discard_after(&mut self, time: f64) {
        let keep = self.snapshots.partition_point(|snapshot| snapshot.time <= time);
        self.snapshots.truncate(keep);
    }

    /// Returns the snapshot whose time is closest to `time`. Ties resolve to
    /// the earlier snapshot.
    pub fn nearest(&self, time: f64) -> Option<&SimulationSnapshot> {
        let index = self.snapshots.partition_point(|snapshot| snapshot.time < time);
        let after = self.snapshots.get(index);
        let before = index
            .checked_sub(1)
            .and_then(|previous| self.snapshots.get(previous));

        match (before, after) {
            (Some(b), Some(a)) => {
                if (a.time - time).abs() < (time - b.time).abs() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }
}
