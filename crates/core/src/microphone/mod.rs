use crate::{MicrophoneConfig, Vector2, Wavefront};

/// Probe that fires a one-shot event whenever a wavefront sweeps across it.
#[derive(Debug, Clone)]
pub struct Microphone {
    pub position: Vector2,
    pub enabled: bool,
    tolerance: f64,
    cooldown: f64,
    last_detection: Option<f64>,
    detected: bool,
}

impl Microphone {
    pub fn new(config: &MicrophoneConfig) -> Self {
        Self {
            position: config.position,
            enabled: config.enabled,
            tolerance: config.tolerance,
            cooldown: config.cooldown,
            last_detection: None,
            detected: false,
        }
    }

    /// Checks the live set for a wavefront crossing the probe at `sim_time`.
    ///
    /// A crossing inside the cooldown window of the previous one is ignored,
    /// so one wavefront passing over several frames fires once.
    pub fn scan(&mut self, wavefronts: &[Wavefront], sim_time: f64) -> bool {
        if !self.enabled || wavefronts.is_empty() {
            return false;
        }

        if let Some(last) = self.last_detection {
            if (sim_time - last).abs() < self.cooldown {
                return false;
            }
        }

        let crossing = wavefronts.iter().any(|wavefront| {
            let distance = (self.position - wavefront.origin_position).norm();
            (wavefront.radius - distance).abs() < self.tolerance
        });
        if crossing {
            tracing::debug!(time = sim_time, "wavefront reached microphone");
            self.last_detection = Some(sim_time);
            self.detected = true;
        }
        crossing
    }

    /// Returns and clears the pending detection flag.
    pub fn take_detection(&mut self) -> bool {
        std::mem::take(&mut self.detected)
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn reset(&mut self) {
        self.last_detection = None;
        self.detected = false;
    }
}
