use std::{collections::VecDeque, f64::consts::TAU};

use serde::{Deserialize, Serialize};

const DISPLAY_AMPLITUDE: f64 = 1.0;

/// One point of a displayed waveform. `t` is the real-time offset in seconds
/// from the newest sample (always `<= 0`), `y` the dimensionless amplitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveformSample {
    pub t: f64,
    pub y: f64,
}

/// Fixed-length FIFO of amplitudes, each stamped with the sample clock.
#[derive(Debug, Clone)]
struct SampleRing {
    values: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl SampleRing {
    fn zeroed(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: std::iter::repeat((0.0, 0.0)).take(capacity).collect(),
            capacity,
        }
    }

    fn push(&mut self, stamp: f64, y: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back((stamp, y));
    }

    fn render(&self, time_speed: f64, out: &mut Vec<WaveformSample>) {
        let newest = self.values.back().map(|(stamp, _)| *stamp).unwrap_or(0.0);
        let scale = if time_speed.abs() > f64::EPSILON {
            1.0 / time_speed.abs()
        } else {
            1.0
        };

        out.clear();
        out.extend(self.values.iter().map(|(stamp, y)| WaveformSample {
            t: (stamp - newest) * scale,
            y: *y,
        }));
    }
}

/// Synthesizes the emitted and observed display signals.
///
/// The emitted phase is integrated frame by frame. The observed phase is
/// rebuilt from the arrival of the wavefront currently heard, so it stays
/// consistent when the frame delta varies.
#[derive(Debug, Clone)]
pub struct WaveformSynthesizer {
    amplitude: f64,
    emitted_phase: f64,
    observed_phase: f64,
    clock: f64,
    emitted_ring: SampleRing,
    observed_ring: SampleRing,
    emitted: Vec<WaveformSample>,
    observed: Vec<WaveformSample>,
}

impl WaveformSynthesizer {
    pub fn new(size: usize) -> Self {
        let mut synth = Self {
            amplitude: DISPLAY_AMPLITUDE,
            emitted_phase: 0.0,
            observed_phase: 0.0,
            clock: 0.0,
            emitted_ring: SampleRing::zeroed(size),
            observed_ring: SampleRing::zeroed(size),
            emitted: Vec::new(),
            observed: Vec::new(),
        };
        synth.reset(size);
        synth
    }

    pub fn len(&self) -> usize {
        self.emitted_ring.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emitted_phase(&self) -> f64 {
        self.emitted_phase
    }

    pub fn observed_phase(&self) -> f64 {
        self.observed_phase
    }

    /// Emitted samples, oldest first. Valid until the next update.
    pub fn emitted(&self) -> &[WaveformSample] {
        &self.emitted
    }

    /// Observed samples, oldest first. Valid until the next update.
    pub fn observed(&self) -> &[WaveformSample] {
        &self.observed
    }

    /// Integrates the emitted phase over `dt` and pushes a new sample.
    ///
    /// `dt` may be negative while rewinding. The phase then runs backwards
    /// but the sample clock keeps moving forward so the display axis stays
    /// monotonic.
    pub fn advance_emitted(&mut self, frequency: f64, dt: f64, time_speed: f64) {
        self.clock += dt.abs();
        self.emitted_phase = (self.emitted_phase + TAU * frequency * dt).rem_euclid(TAU);
        self.emitted_ring
            .push(self.clock, self.amplitude * self.emitted_phase.sin());
        self.emitted_ring.render(time_speed, &mut self.emitted);
    }

    /// Pushes the observed sample for the wavefront currently heard.
    pub fn advance_observed(
        &mut self,
        observed_frequency: f64,
        phase_at_arrival: f64,
        time_since_arrival: f64,
        time_speed: f64,
    ) {
        self.observed_phase =
            (phase_at_arrival + TAU * observed_frequency * time_since_arrival).rem_euclid(TAU);
        self.observed_ring
            .push(self.clock, self.amplitude * self.observed_phase.sin());
        self.observed_ring.render(time_speed, &mut self.observed);
    }

    /// Pushes silence while nothing has reached the observer yet.
    pub fn clear_observed(&mut self, time_speed: f64) {
        self.observed_ring.push(self.clock, 0.0);
        self.observed_ring.render(time_speed, &mut self.observed);
    }

    pub fn reset(&mut self, size: usize) {
        self.emitted_phase = 0.0;
        self.observed_phase = 0.0;
        self.clock = 0.0;
        self.emitted_ring = SampleRing::zeroed(size);
        self.observed_ring = SampleRing::zeroed(size);
        self.emitted_ring.render(1.0, &mut self.emitted);
        self.observed_ring.render(1.0, &mut self.observed);
    }
}
