//! Core library for the Doppler Sim application.
//!
//! A moving source emits periodic wavefronts that travel at the speed of
//! sound toward a moving observer. Each subsystem lives in its own module
//! (kinematics, emission, Doppler math, waveform synthesis, rewind history)
//! and [`SimulationEngine`] drives them one frame at a time. Rendering, input
//! and audio playback sit outside this crate and talk to the engine through
//! plain values and [`EngineEvent`] notifications.

pub mod analysis;
pub mod body;
pub mod config;
pub mod doppler;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod events;
pub mod microphone;
pub mod record;
pub mod scenario;
pub mod timeline;
pub mod trail;
pub mod waveform;

/// Planar vector in meters or meters per second.
pub type Vector2 = nalgebra::Vector2<f64>;

pub use analysis::SpectrumAnalyzer;
pub use body::{BodyState, Entity, KinematicBody};
pub use config::{BodyConfig, MicrophoneConfig, SimulationConfig, TimeSpeed, TrailConfig};
pub use doppler::{Arrival, DopplerCalculator};
pub use emitter::{EmissionState, WaveEmitter, Wavefront, WavefrontId};
pub use engine::SimulationEngine;
pub use error::{DopplerError, Result};
pub use events::{EngineEvent, EventLog};
pub use microphone::Microphone;
pub use record::{FrameRecord, TraceRecorder, TraceSettings};
pub use scenario::{BodySetup, Scenario, ScenarioSetup};
pub use timeline::{PlayState, SimulationClock, SimulationSnapshot, StateHistory};
pub use trail::{PositionTrail, TrailPoint};
pub use waveform::{WaveformSample, WaveformSynthesizer};
