//! Line-of-sight Doppler math and causal arrival detection.
//!
//! Everything here is a pure function of its inputs. The observed frequency
//! combines the observer's *current* velocity with the source velocity the
//! wavefront carried at emission, which is the classical moving-source /
//! moving-observer ratio rather than a full retarded-time solution.

use std::cmp::Ordering;

use crate::{Vector2, Wavefront};

/// A wavefront whose radius has reached the observer.
#[derive(Debug, Clone, Copy)]
pub struct Arrival<'a> {
    pub wavefront: &'a Wavefront,
    pub distance: f64,
    pub arrival_time: f64,
}

/// Stateless calculator that also carries the clamp applied near the sound
/// barrier.
#[derive(Debug, Clone, Copy)]
pub struct DopplerCalculator {
    max_frequency_ratio: f64,
}

impl Default for DopplerCalculator {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl DopplerCalculator {
    pub fn new(max_frequency_ratio: f64) -> Self {
        Self {
            max_frequency_ratio,
        }
    }

    pub fn max_frequency_ratio(&self) -> f64 {
        self.max_frequency_ratio
    }

    /// Returns every wavefront whose radius covers the observer, most
    /// recently arrived first.
    pub fn find_arrived_wavefronts<'a>(
        &self,
        wavefronts: &'a [Wavefront],
        observer_position: Vector2,
        sound_speed: f64,
    ) -> Vec<Arrival<'a>> {
        let mut arrivals: Vec<Arrival<'a>> = wavefronts
            .iter()
            .filter_map(|wavefront| {
                let distance = (observer_position - wavefront.origin_position).norm();
                (wavefront.radius >= distance).then(|| Arrival {
                    wavefront,
                    distance,
                    arrival_time: wavefront.birth_time + distance / sound_speed,
                })
            })
            .collect();

        arrivals.sort_by(|a, b| {
            b.arrival_time
                .partial_cmp(&a.arrival_time)
                .unwrap_or(Ordering::Equal)
        });
        arrivals
    }

    /// Frequency heard by an observer at `observer_position` moving with
    /// `observer_velocity` when `wavefront` passes it.
    pub fn observed_frequency(
        &self,
        wavefront: &Wavefront,
        observer_position: Vector2,
        observer_velocity: Vector2,
        sound_speed: f64,
    ) -> f64 {
        let emitted = wavefront.source_frequency_at_emission;
        let Some(direction) = line_of_sight(wavefront.origin_position, observer_position) else {
            return emitted;
        };

        let v_source = wavefront.source_velocity_at_emission.dot(&direction);
        let v_observer = observer_velocity.dot(&direction);
        let ceiling = emitted * self.max_frequency_ratio;

        let denominator = sound_speed - v_source;
        if denominator <= f64::EPSILON * sound_speed {
            return ceiling;
        }

        let frequency = emitted * (sound_speed - v_observer) / denominator;
        if frequency.is_finite() {
            frequency.clamp(0.0, ceiling)
        } else {
            ceiling
        }
    }

    /// Same ratio with the observer held still, isolating the source-side
    /// shift for waveform synthesis.
    pub fn stationary_observed_frequency(
        &self,
        wavefront: &Wavefront,
        observer_position: Vector2,
        sound_speed: f64,
    ) -> f64 {
        self.observed_frequency(wavefront, observer_position, Vector2::zeros(), sound_speed)
    }
}

fn line_of_sight(origin: Vector2, observer: Vector2) -> Option<Vector2> {
    (observer - origin).try_normalize(f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WavefrontId;
    use approx::assert_relative_eq;

    const SOUND: f64 = 343.0;

    fn wave(origin: Vector2, velocity: Vector2, birth_time: f64, radius: f64) -> Wavefront {
        Wavefront {
            id: WavefrontId(0),
            origin_position: origin,
            birth_time,
            radius,
            source_velocity_at_emission: velocity,
            source_frequency_at_emission: 4.0,
            phase_at_emission: 0.0,
        }
    }

    #[test]
    fn stationary_pair_hears_the_emitted_frequency() {
        let calc = DopplerCalculator::default();
        let w = wave(Vector2::new(-50.0, 0.0), Vector2::zeros(), 0.0, 120.0);
        let f = calc.observed_frequency(&w, Vector2::new(50.0, 0.0), Vector2::zeros(), SOUND);
        assert_relative_eq!(f, 4.0);
    }

    #[test]
    fn approaching_source_matches_the_classic_ratio() {
        let calc = DopplerCalculator::default();
        let w = wave(Vector2::new(-50.0, 0.0), Vector2::new(60.0, 0.0), 0.0, 120.0);
        let f = calc.observed_frequency(&w, Vector2::new(50.0, 0.0), Vector2::zeros(), SOUND);

        assert_relative_eq!(f, 4.0 * 343.0 / (343.0 - 60.0), epsilon = 1e-12);
        assert_relative_eq!(f, 4.524, epsilon = 1e-3);
    }

    #[test]
    fn approaching_raises_and_receding_lowers() {
        let calc = DopplerCalculator::default();
        let observer = Vector2::new(50.0, 0.0);
        for speed in [1.0, 30.0, 120.0, 300.0] {
            let toward = wave(Vector2::new(-50.0, 0.0), Vector2::new(speed, 0.0), 0.0, 0.0);
            let away = wave(Vector2::new(-50.0, 0.0), Vector2::new(-speed, 0.0), 0.0, 0.0);

            assert!(calc.observed_frequency(&toward, observer, Vector2::zeros(), SOUND) > 4.0);
            assert!(calc.observed_frequency(&away, observer, Vector2::zeros(), SOUND) < 4.0);
        }
    }

    #[test]
    fn matching_line_of_sight_velocities_cancel() {
        let calc = DopplerCalculator::default();
        let velocity = Vector2::new(25.0, 7.0);
        let w = wave(Vector2::new(0.0, 0.0), velocity, 0.0, 0.0);
        let f = calc.observed_frequency(&w, Vector2::new(80.0, 0.0), velocity, SOUND);
        assert_relative_eq!(f, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn sonic_source_is_clamped() {
        let calc = DopplerCalculator::new(10.0);
        let observer = Vector2::new(50.0, 0.0);
        let sonic = wave(Vector2::new(-50.0, 0.0), Vector2::new(SOUND, 0.0), 0.0, 0.0);
        let supersonic = wave(Vector2::new(-50.0, 0.0), Vector2::new(500.0, 0.0), 0.0, 0.0);

        assert_eq!(calc.observed_frequency(&sonic, observer, Vector2::zeros(), SOUND), 40.0);
        assert_eq!(calc.observed_frequency(&supersonic, observer, Vector2::zeros(), SOUND), 40.0);
    }

    #[test]
    fn observer_outrunning_sound_hears_nothing() {
        let calc = DopplerCalculator::default();
        let w = wave(Vector2::new(0.0, 0.0), Vector2::zeros(), 0.0, 0.0);
        let f = calc.observed_frequency(
            &w,
            Vector2::new(10.0, 0.0),
            Vector2::new(400.0, 0.0),
            SOUND,
        );
        assert_eq!(f, 0.0);
    }

    #[test]
    fn coincident_origin_falls_back_to_emitted() {
        let calc = DopplerCalculator::default();
        let w = wave(Vector2::new(3.0, 4.0), Vector2::new(100.0, 0.0), 0.0, 0.0);
        let f = calc.observed_frequency(&w, Vector2::new(3.0, 4.0), Vector2::zeros(), SOUND);
        assert_eq!(f, 4.0);
    }

    #[test]
    fn stationary_variant_ignores_observer_motion() {
        let calc = DopplerCalculator::default();
        let w = wave(Vector2::new(-50.0, 0.0), Vector2::new(60.0, 0.0), 0.0, 0.0);
        let observer = Vector2::new(50.0, 0.0);

        let moving = calc.observed_frequency(&w, observer, Vector2::new(-40.0, 0.0), SOUND);
        let still = calc.stationary_observed_frequency(&w, observer, SOUND);

        assert!(moving > still);
        assert_relative_eq!(still, 4.0 * 343.0 / 283.0, epsilon = 1e-12);
    }

    #[test]
    fn arrivals_are_sorted_most_recent_first() {
        let calc = DopplerCalculator::default();
        let observer = Vector2::new(100.0, 0.0);
        let waves = vec![
            wave(Vector2::zeros(), Vector2::zeros(), 0.0, 200.0),
            wave(Vector2::zeros(), Vector2::zeros(), 0.25, 114.0),
            wave(Vector2::zeros(), Vector2::zeros(), 0.5, 30.0),
        ];

        let arrived = calc.find_arrived_wavefronts(&waves, observer, SOUND);

        assert_eq!(arrived.len(), 2);
        assert_eq!(arrived[0].wavefront.birth_time, 0.25);
        assert_eq!(arrived[1].wavefront.birth_time, 0.0);
        assert_relative_eq!(arrived[0].arrival_time, 0.25 + 100.0 / SOUND);
        assert_relative_eq!(arrived[0].distance, 100.0);
    }

    #[test]
    fn empty_set_has_no_arrivals() {
        let calc = DopplerCalculator::default();
        assert!(calc
            .find_arrived_wavefronts(&[], Vector2::zeros(), SOUND)
            .is_empty());
    }
}
