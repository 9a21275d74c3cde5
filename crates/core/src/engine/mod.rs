use std::f64::consts::TAU;

use crate::{
    config::{check_positive, check_time_speed},
    DopplerCalculator, EmissionState, EngineEvent, Entity, EventLog, FrameRecord, KinematicBody,
    Microphone, PlayState, PositionTrail, Result, Scenario, SimulationClock,
    SimulationConfig, SimulationSnapshot, SpectrumAnalyzer, StateHistory, Vector2, WaveEmitter,
    Wavefront, WavefrontId, WaveformSample, WaveformSynthesizer,
};

/// Frame-driven orchestrator that owns every simulation component.
///
/// Forward steps integrate the bodies, emit and age wavefronts and work out
/// what the observer hears. Steps with a negative time speed rewind by
/// restoring recorded state instead of integrating backwards.
#[derive(Debug)]
pub struct SimulationEngine {
    config: SimulationConfig,
    scenario: Scenario,
    clock: SimulationClock,
    source: KinematicBody,
    observer: KinematicBody,
    emitter: WaveEmitter,
    synth: WaveformSynthesizer,
    doppler: DopplerCalculator,
    microphone: Microphone,
    history: StateHistory,
    source_trail: PositionTrail,
    observer_trail: PositionTrail,
    events: EventLog,
    analyzer: SpectrumAnalyzer,
    observed_frequency: Option<f64>,
    rewound: bool,
}

impl SimulationEngine {
    /// Builds an engine in the [`Scenario::Free`] layout.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let config = config.validate()?;
        let setup = Scenario::Free.setup();

        Ok(Self {
            scenario: Scenario::Free,
            clock: SimulationClock::new(config.time_scale, config.time_speed),
            source: KinematicBody::new(setup.source.position, config.body),
            observer: KinematicBody::new(setup.observer.position, config.body),
            emitter: WaveEmitter::new(config.sound_speed, config.max_wave_age),
            synth: WaveformSynthesizer::new(config.waveform_len),
            doppler: DopplerCalculator::new(config.max_frequency_ratio),
            microphone: Microphone::new(&config.microphone),
            history: StateHistory::with_capacity(config.snapshot_capacity),
            source_trail: PositionTrail::new(config.trail),
            observer_trail: PositionTrail::new(config.trail),
            events: EventLog::new(),
            analyzer: SpectrumAnalyzer::new(),
            observed_frequency: None,
            rewound: false,
            config,
        })
    }

    pub fn with_scenario(config: SimulationConfig, scenario: Scenario) -> Result<Self> {
        let mut engine = Self::new(config)?;
        engine.apply_scenario(scenario);
        Ok(engine)
    }

    /// Advances the simulation by one frame of `real_dt` real seconds.
    ///
    /// Does nothing while paused unless `force` is set, which is how single
    /// frame stepping works. A forced step still rewinds when the time speed
    /// is negative. A frame that advances model time by zero is skipped, so
    /// a frozen clock never fills the snapshot ring with copies of one
    /// instant.
    pub fn step(&mut self, real_dt: f64, force: bool) {
        if !self.clock.is_playing() && !force {
            return;
        }
        if !(real_dt.is_finite() && real_dt >= 0.0) {
            tracing::warn!(real_dt, "ignoring invalid frame delta");
            return;
        }

        let model_dt = self.clock.model_delta(real_dt);
        if model_dt == 0.0 {
            tracing::trace!(real_dt, "model time is frozen");
            return;
        }

        let before = self.live_ids();
        if self.clock.is_reversed() {
            self.step_backward(model_dt);
        } else {
            self.step_forward(model_dt);
        }
        let after = self.live_ids();
        self.events.diff_wavefronts(&before, &after);
    }

    fn step_forward(&mut self, dt: f64) {
        if self.rewound {
            let now = self.clock.time_seconds;
            self.history.discard_after(now);
            self.emitter.discard_after(now);
            self.rewound = false;
        }

        let snapshot = self.snapshot();
        self.history.record(snapshot);

        self.clock.time_seconds += dt;
        let now = self.clock.time_seconds;

        self.source.integrate(dt);
        self.source.apply_decay();
        self.observer.integrate(dt);
        self.observer.apply_decay();

        self.source_trail.sample(now, self.source.position);
        self.observer_trail.sample(now, self.observer.position);

        let frequency = self.config.emitted_frequency;
        let phase = (self.synth.emitted_phase() + TAU * frequency * dt).rem_euclid(TAU);
        self.emitter.tick(
            now,
            EmissionState {
                position: self.source.position,
                velocity: self.source.velocity,
                frequency,
                phase,
            },
        );
        self.emitter.advance(now, dt);
        if let Some(oldest) = self.history.oldest_time() {
            self.emitter.forget_before(oldest - self.config.max_wave_age);
        }

        if self.microphone.scan(self.emitter.wavefronts(), now) {
            self.events.push(EngineEvent::WaveDetected);
        }

        self.update_signals(dt);
    }

    fn step_backward(&mut self, dt: f64) {
        let Some(oldest) = self.history.oldest_time() else {
            tracing::trace!("no recorded state to rewind to");
            return;
        };

        let previous = self.clock.time_seconds;
        let requested = previous + dt;
        let target = requested.max(oldest);
        if target > requested {
            tracing::debug!(requested, oldest, "rewind clamped to oldest snapshot");
        }

        if let Some(snapshot) = self.history.nearest(target) {
            self.source.restore(&snapshot.source);
            self.observer.restore(&snapshot.observer);
        }
        self.emitter.restore_to_time(target);
        self.clock.time_seconds = target;
        self.source_trail.trim_after(target);
        self.observer_trail.trim_after(target);
        self.rewound = true;
        if target != previous {
            self.events.push(EngineEvent::Rewound { time: target });
        }

        self.update_signals(target - previous);
    }

    /// Works out which wavefront the observer currently hears and feeds both
    /// waveform rings.
    fn update_signals(&mut self, dt: f64) {
        let speed = self.clock.time_speed;
        let now = self.clock.time_seconds;
        let sound_speed = self.emitter.sound_speed();
        self.synth
            .advance_emitted(self.config.emitted_frequency, dt, speed);

        let heard = self
            .doppler
            .find_arrived_wavefronts(self.emitter.wavefronts(), self.observer.position, sound_speed)
            .first()
            .map(|arrival| {
                let wavefront = arrival.wavefront;
                let observed = self.doppler.observed_frequency(
                    wavefront,
                    self.observer.position,
                    self.observer.velocity,
                    sound_speed,
                );
                let stationary = self.doppler.stationary_observed_frequency(
                    wavefront,
                    self.observer.position,
                    sound_speed,
                );
                (
                    observed,
                    stationary,
                    wavefront.phase_at_emission,
                    now - arrival.arrival_time,
                )
            });

        let observed = match heard {
            Some((observed, stationary, phase, since_arrival)) => {
                self.synth
                    .advance_observed(stationary, phase, since_arrival, speed);
                Some(observed)
            }
            None => {
                self.synth.clear_observed(speed);
                None
            }
        };

        if observed != self.observed_frequency {
            self.observed_frequency = observed;
            self.events
                .push(EngineEvent::ObservedFrequencyChanged(observed));
        }
    }

    /// Puts both bodies back at the scenario's start positions, at rest, and
    /// discards all derived state.
    pub fn reset(&mut self) {
        let before = self.live_ids();
        self.clear_state();
        self.events.diff_wavefronts(&before, &[]);
        self.events.push(EngineEvent::Reset);
    }

    /// Switches to `scenario`, resetting everything and assigning its start
    /// velocities.
    pub fn apply_scenario(&mut self, scenario: Scenario) {
        let before = self.live_ids();
        self.scenario = scenario;
        self.clear_state();

        let setup = scenario.setup();
        if setup.source.actively_controlled {
            self.source.set_velocity(setup.source.velocity);
        }
        if setup.observer.actively_controlled {
            self.observer.set_velocity(setup.observer.velocity);
        }

        tracing::debug!(scenario = scenario.name(), "scenario applied");
        self.events.diff_wavefronts(&before, &[]);
        self.events.push(EngineEvent::ScenarioApplied(scenario));
    }

    fn clear_state(&mut self) {
        let setup = self.scenario.setup();
        self.source.reset(setup.source.position);
        self.observer.reset(setup.observer.position);
        self.emitter.reset();
        self.synth.reset(self.config.waveform_len);
        self.history.clear();
        self.source_trail.clear();
        self.observer_trail.clear();
        self.microphone.reset();
        self.clock.reset();
        self.rewound = false;
        if self.observed_frequency.take().is_some() {
            self.events
                .push(EngineEvent::ObservedFrequencyChanged(None));
        }
    }

    fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            time: self.clock.time_seconds,
            source: self.source.state(),
            observer: self.observer.state(),
            wavefronts: self.emitter.wavefronts().to_vec(),
        }
    }

    fn live_ids(&self) -> Vec<WavefrontId> {
        self.emitter
            .wavefronts()
            .iter()
            .map(|wavefront| wavefront.id)
            .collect()
    }

    fn body_mut(&mut self, entity: Entity) -> &mut KinematicBody {
        match entity {
            Entity::Source => &mut self.source,
            Entity::Observer => &mut self.observer,
        }
    }

    // External commands.

    pub fn play(&mut self) {
        self.clock.state = PlayState::Playing;
    }

    pub fn pause(&mut self) {
        self.clock.state = PlayState::Paused;
    }

    pub fn toggle_play(&mut self) {
        self.clock.toggle();
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Vector2) {
        self.body_mut(entity).set_velocity(velocity);
    }

    /// Drag gesture: moves the body without changing its velocity.
    pub fn set_position(&mut self, entity: Entity, position: Vector2) {
        self.body_mut(entity).position = position;
    }

    pub fn apply_impulse(&mut self, entity: Entity, delta: Vector2) {
        self.body_mut(entity).apply_impulse(delta);
    }

    pub fn release(&mut self, entity: Entity) {
        self.body_mut(entity).release();
    }

    pub fn set_sound_speed(&mut self, sound_speed: f64) -> Result<()> {
        let sound_speed = check_positive("sound_speed", sound_speed).map_err(|err| {
            tracing::warn!(%err, "rejected sound speed");
            err
        })?;
        self.config.sound_speed = sound_speed;
        self.emitter.set_sound_speed(sound_speed);
        Ok(())
    }

    pub fn set_emitted_frequency(&mut self, frequency: f64) -> Result<()> {
        let frequency = check_positive("emitted_frequency", frequency).map_err(|err| {
            tracing::warn!(%err, "rejected emitted frequency");
            err
        })?;
        self.config.emitted_frequency = frequency;
        Ok(())
    }

    pub fn set_time_speed(&mut self, time_speed: f64) -> Result<()> {
        let time_speed = check_time_speed(time_speed).map_err(|err| {
            tracing::warn!(%err, "rejected time speed");
            err
        })?;
        self.config.time_speed = time_speed;
        self.clock.time_speed = time_speed;
        Ok(())
    }

    pub fn set_microphone_position(&mut self, position: Vector2) {
        self.microphone.position = position;
    }

    pub fn set_microphone_enabled(&mut self, enabled: bool) {
        self.microphone.enabled = enabled;
        if !enabled {
            self.microphone.reset();
        }
    }

    // Outputs.

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn time(&self) -> f64 {
        self.clock.time_seconds
    }

    pub fn source(&self) -> &KinematicBody {
        &self.source
    }

    pub fn observer(&self) -> &KinematicBody {
        &self.observer
    }

    pub fn body(&self, entity: Entity) -> &KinematicBody {
        match entity {
            Entity::Source => &self.source,
            Entity::Observer => &self.observer,
        }
    }

    pub fn wavefronts(&self) -> &[Wavefront] {
        self.emitter.wavefronts()
    }

    pub fn emitted_waveform(&self) -> &[WaveformSample] {
        self.synth.emitted()
    }

    pub fn observed_waveform(&self) -> &[WaveformSample] {
        self.synth.observed()
    }

    /// Frequency the observer currently hears, `None` before the first
    /// wavefront arrives.
    pub fn observed_frequency(&self) -> Option<f64> {
        self.observed_frequency
    }

    pub fn trail(&self, entity: Entity) -> &PositionTrail {
        match entity {
            Entity::Source => &self.source_trail,
            Entity::Observer => &self.observer_trail,
        }
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn microphone(&self) -> &Microphone {
        &self.microphone
    }

    /// Returns and clears the one-shot microphone detection flag.
    pub fn take_wave_detected(&mut self) -> bool {
        self.microphone.take_detection()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    /// Dominant frequency of the synthesized observed signal in model Hz.
    pub fn measured_observed_frequency(&mut self) -> Result<Option<f64>> {
        let measured = self.analyzer.dominant_frequency_of(self.synth.observed())?;
        let speed = self.clock.time_speed.abs();
        Ok(measured.map(|hz| if speed > f64::EPSILON { hz / speed } else { hz }))
    }

    pub fn frame_record(&self) -> FrameRecord {
        FrameRecord {
            time: self.clock.time_seconds,
            source: self.source.state(),
            observer: self.observer.state(),
            wavefront_count: self.emitter.wavefronts().len(),
            observed_frequency: self.observed_frequency,
            detected: self.microphone.is_detected(),
        }
    }
}
