use serde::{Deserialize, Serialize};

use crate::Vector2;

/// Stable identifier assigned to each wavefront at emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WavefrontId(pub u64);

/// A single emitted pulse, modelled as an expanding circle around the point
/// the source occupied when it was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wavefront {
    pub id: WavefrontId,
    pub origin_position: Vector2,
    pub birth_time: f64,
    pub radius: f64,
    pub source_velocity_at_emission: Vector2,
    pub source_frequency_at_emission: f64,
    pub phase_at_emission: f64,
}

impl Wavefront {
    pub fn age(&self, sim_time: f64) -> f64 {
        sim_time - self.birth_time
    }
}

/// Source state captured when a wavefront is emitted.
#[derive(Debug, Clone, Copy)]
pub struct EmissionState {
    pub position: Vector2,
    pub velocity: Vector2,
    pub frequency: f64,
    pub phase: f64,
}

/// Owns the live wavefront set plus the emission log used for rewinding.
#[derive(Debug, Clone)]
pub struct WaveEmitter {
    sound_speed: f64,
    max_age: f64,
    live: Vec<Wavefront>,
    history: Vec<Wavefront>,
    last_emission_time: Option<f64>,
    next_id: u64,
}

impl WaveEmitter {
    pub fn new(sound_speed: f64, max_age: f64) -> Self {
        Self {
            sound_speed,
            max_age,
            live: Vec::new(),
            history: Vec::new(),
            last_emission_time: None,
            next_id: 0,
        }
    }

    /// Read-only view over the live wavefronts, oldest first.
    pub fn wavefronts(&self) -> &[Wavefront] {
        &self.live
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn sound_speed(&self) -> f64 {
        self.sound_speed
    }

    /// Callers validate the value; propagation divides by it.
    pub fn set_sound_speed(&mut self, sound_speed: f64) {
        self.sound_speed = sound_speed;
    }

    pub fn max_age(&self) -> f64 {
        self.max_age
    }

    pub fn last_emission_time(&self) -> Option<f64> {
        self.last_emission_time
    }

    /// Emits a new wavefront once the emission interval has elapsed.
    ///
    /// The first tick after a reset always emits. Returns the new wavefront's
    /// id when one was emitted.
    pub fn tick(&mut self, sim_time: f64, source: EmissionState) -> Option<WavefrontId> {
        if source.frequency <= 0.0 {
            return None;
        }

        let interval = 1.0 / source.frequency;
        let due = self
            .last_emission_time
            .map(|last| sim_time - last > interval)
            .unwrap_or(true);
        if !due {
            return None;
        }

        let id = WavefrontId(self.next_id);
        self.next_id += 1;
        let wavefront = Wavefront {
            id,
            origin_position: source.position,
            birth_time: sim_time,
            radius: 0.0,
            source_velocity_at_emission: source.velocity,
            source_frequency_at_emission: source.frequency,
            phase_at_emission: source.phase,
        };
        tracing::trace!(id = id.0, time = sim_time, "emitting wavefront");

        self.history.push(wavefront.clone());
        self.live.push(wavefront);
        self.last_emission_time = Some(sim_time);
        Some(id)
    }

    /// Grows every live wavefront by `dt * sound_speed` and prunes the ones
    /// that aged out or shrank below zero.
    pub fn advance(&mut self, sim_time: f64, dt: f64) {
        let growth = dt * self.sound_speed;
        let max_age = self.max_age;
        for wavefront in &mut self.live {
            // Born this tick: radius stays at zero until time moves on.
            if wavefront.birth_time != sim_time {
                wavefront.radius += growth;
            }
        }

        let before = self.live.len();
        self.live
            .retain(|wavefront| wavefront.age(sim_time) <= max_age && wavefront.radius >= 0.0);
        let pruned = before - self.live.len();
        if pruned > 0 {
            tracing::trace!(pruned, time = sim_time, "pruned wavefronts");
        }
    }

    /// Rebuilds the live set at `target_time` from the emission log.
    ///
    /// Every logged wavefront born at or before the target and not yet aged
    /// out is restored with radius `(target_time - birth_time) * sound_speed`.
    /// The log itself is left untouched.
    pub fn restore_to_time(&mut self, target_time: f64) {
        let sound_speed = self.sound_speed;
        let max_age = self.max_age;
        self.live = self
            .history
            .iter()
            .filter(|entry| entry.birth_time <= target_time && entry.age(target_time) <= max_age)
            .map(|entry| Wavefront {
                radius: entry.age(target_time) * sound_speed,
                ..entry.clone()
            })
            .collect();
        self.last_emission_time = self
            .history
            .iter()
            .rev()
            .map(|entry| entry.birth_time)
            .find(|birth| *birth <= target_time);
    }

    /// Drops log entries born after `time`. Called when forward play resumes
    /// from a rewound position so the log stays time ordered.
    pub fn discard_after(&mut self, time: f64) {
        self.history.retain(|entry| entry.birth_time <= time);
        self.live.retain(|entry| entry.birth_time <= time);
        self.last_emission_time = self.history.last().map(|entry| entry.birth_time);
    }

    /// Forgets log entries born before `time`; they can no longer be live at
    /// any time the snapshot history can rewind to.
    pub fn forget_before(&mut self, time: f64) {
        let stale = self.history.partition_point(|entry| entry.birth_time < time);
        if stale > 0 {
            self.history.drain(..stale);
        }
    }

    pub fn reset(&mut self) {
        self.live.clear();
        self.history.clear();
        self.last_emission_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const SOUND: f64 = 343.0;

    fn source(frequency: f64) -> EmissionState {
        EmissionState {
            position: Vector2::new(-50.0, 0.0),
            velocity: Vector2::new(20.0, 0.0),
            frequency,
            phase: 0.0,
        }
    }

    /// Runs the emitter forward in fixed steps and returns the final time.
    fn run(emitter: &mut WaveEmitter, steps: usize, dt: f64, frequency: f64) -> f64 {
        let mut time = 0.0;
        for _ in 0..steps {
            time += dt;
            emitter.tick(time, source(frequency));
            emitter.advance(time, dt);
        }
        time
    }

    #[test]
    fn first_tick_emits_and_interval_is_respected() {
        let mut emitter = WaveEmitter::new(SOUND, 10.0);
        assert!(emitter.tick(0.01, source(4.0)).is_some());
        assert!(emitter.tick(0.20, source(4.0)).is_none());
        assert!(emitter.tick(0.25, source(4.0)).is_none());
        assert!(emitter.tick(0.27, source(4.0)).is_some());
        assert_eq!(emitter.wavefronts().len(), 2);
        assert_eq!(emitter.last_emission_time(), Some(0.27));
    }

    #[test]
    fn captures_source_state_at_emission() {
        let mut emitter = WaveEmitter::new(SOUND, 10.0);
        let state = EmissionState {
            phase: 1.25,
            ..source(4.0)
        };
        emitter.tick(0.5, state);

        let wave = &emitter.wavefronts()[0];
        assert_eq!(wave.origin_position, state.position);
        assert_eq!(wave.source_velocity_at_emission, state.velocity);
        assert_eq!(wave.source_frequency_at_emission, 4.0);
        assert_eq!(wave.phase_at_emission, 1.25);
        assert_eq!(wave.birth_time, 0.5);
        assert_eq!(wave.radius, 0.0);
    }

    #[test]
    fn radius_after_one_second_matches_sound_speed() {
        let mut emitter = WaveEmitter::new(SOUND, 1.0);
        emitter.tick(0.0, source(4.0));
        emitter.advance(1.0, 1.0);

        assert_relative_eq!(emitter.wavefronts()[0].radius, 343.0);

        emitter.advance(1.01, 0.01);
        assert!(emitter.wavefronts().is_empty());
    }

    #[test]
    fn negative_radius_is_pruned() {
        let mut emitter = WaveEmitter::new(SOUND, 10.0);
        emitter.tick(1.0, source(4.0));
        emitter.advance(0.9, -0.1);
        assert!(emitter.wavefronts().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut emitter = WaveEmitter::new(SOUND, 10.0);
        run(&mut emitter, 60, 1.0 / 60.0, 4.0);
        emitter.reset();

        assert!(emitter.wavefronts().is_empty());
        assert_eq!(emitter.history_len(), 0);
        assert_eq!(emitter.last_emission_time(), None);
        assert!(emitter.tick(0.001, source(4.0)).is_some());
    }

    #[test]
    fn restore_reproduces_forward_state() {
        let dt = 1.0 / 60.0;
        let mut reference = WaveEmitter::new(SOUND, 1.0);
        let t = run(&mut reference, 90, dt, 4.0);
        let expected = reference.wavefronts().to_vec();

        let mut emitter = WaveEmitter::new(SOUND, 1.0);
        run(&mut emitter, 150, dt, 4.0);
        emitter.restore_to_time(t);

        let restored = emitter.wavefronts();
        assert_eq!(restored.len(), expected.len());
        for (a, b) in restored.iter().zip(&expected) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.origin_position, b.origin_position);
            assert_relative_eq!(a.birth_time, b.birth_time, epsilon = 1e-9);
            assert_relative_eq!(a.radius, b.radius, epsilon = 1e-6);
        }
        assert_eq!(emitter.last_emission_time(), reference.last_emission_time());
    }

    #[test]
    fn restored_state_advances_like_the_original_run() {
        let dt = 1.0 / 60.0;
        let mut reference = WaveEmitter::new(SOUND, 1.0);
        let t_mid = run(&mut reference, 45, dt, 4.0);
        let mut t = t_mid;
        for _ in 0..10 {
            t += dt;
            reference.tick(t, source(4.0));
            reference.advance(t, dt);
        }

        let mut emitter = WaveEmitter::new(SOUND, 1.0);
        run(&mut emitter, 120, dt, 4.0);
        emitter.restore_to_time(t_mid);
        emitter.discard_after(t_mid);
        let mut t = t_mid;
        for _ in 0..10 {
            t += dt;
            emitter.tick(t, source(4.0));
            emitter.advance(t, dt);
        }

        assert_eq!(emitter.wavefronts().len(), reference.wavefronts().len());
        for (a, b) in emitter.wavefronts().iter().zip(reference.wavefronts()) {
            assert_relative_eq!(a.birth_time, b.birth_time, epsilon = 1e-9);
            assert_relative_eq!(a.radius, b.radius, epsilon = 1e-6);
        }
    }

    #[test]
    fn restore_before_first_emission_is_empty() {
        let mut emitter = WaveEmitter::new(SOUND, 1.0);
        emitter.tick(0.5, source(4.0));
        emitter.restore_to_time(0.25);

        assert!(emitter.wavefronts().is_empty());
        assert_eq!(emitter.last_emission_time(), None);
    }

    #[test]
    fn forget_before_trims_the_log_only() {
        let mut emitter = WaveEmitter::new(SOUND, 10.0);
        run(&mut emitter, 120, 1.0 / 60.0, 4.0);
        let live = emitter.wavefronts().len();
        let logged = emitter.history_len();

        emitter.forget_before(1.0);

        assert!(emitter.history_len() < logged);
        assert_eq!(emitter.wavefronts().len(), live);
    }

    proptest! {
        #[test]
        fn radius_tracks_age_when_running_forward(
            steps in 1usize..240,
            dt in 0.001f64..0.05,
            frequency in 0.5f64..20.0,
        ) {
            let mut emitter = WaveEmitter::new(SOUND, 2.0);
            let time = run(&mut emitter, steps, dt, frequency);

            for wave in emitter.wavefronts() {
                let expected = (time - wave.birth_time) * SOUND;
                prop_assert!((wave.radius - expected).abs() < 1e-6);
                prop_assert!(wave.age(time) <= 2.0);
            }
        }
    }
}
