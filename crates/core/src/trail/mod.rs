use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{TrailConfig, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub time: f64,
    pub position: Vector2,
}

/// Throttled position history of one body, bounded by count and age.
#[derive(Debug, Clone)]
pub struct PositionTrail {
    points: VecDeque<TrailPoint>,
    config: TrailConfig,
}

impl PositionTrail {
    pub fn new(config: TrailConfig) -> Self {
        Self {
            points: VecDeque::with_capacity(config.max_points),
            config,
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Records `position` unless the last point is younger than the sampling
    /// interval, then prunes by age and count.
    pub fn sample(&mut self, time: f64, position: Vector2) {
        let due = self
            .points
            .back()
            .map(|last| time - last.time >= self.config.sample_interval)
            .unwrap_or(true);
        if due {
            self.points.push_back(TrailPoint { time, position });
        }

        while self
            .points
            .front()
            .map(|oldest| time - oldest.time > self.config.max_age)
            .unwrap_or(false)
        {
            self.points.pop_front();
        }
        while self.points.len() > self.config.max_points {
            self.points.pop_front();
        }
    }

    /// Drops points recorded after `time`.
    pub fn trim_after(&mut self, time: f64) {
        while self
            .points
            .back()
            .map(|last| last.time > time)
            .unwrap_or(false)
        {
            self.points.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
