use serde::{Deserialize, Serialize};

use crate::{BodyConfig, Vector2};

/// Identifies one of the two movable bodies for external commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Source,
    Observer,
}

/// Position and velocity of a single movable entity.
///
/// Only an actively controlled body translates. Once control ends the
/// velocity decays geometrically until it falls under the configured
/// minimum speed and snaps to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicBody {
    pub position: Vector2,
    pub velocity: Vector2,
    pub is_actively_controlled: bool,
    #[serde(skip)]
    tuning: BodyConfig,
}

impl KinematicBody {
    pub fn new(position: Vector2, tuning: BodyConfig) -> Self {
        Self {
            position,
            velocity: Vector2::zeros(),
            is_actively_controlled: false,
            tuning,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Moves the body along its velocity for `dt` model seconds.
    pub fn integrate(&mut self, dt: f64) {
        if !self.is_actively_controlled {
            return;
        }

        self.position += self.velocity * dt;
        if self.speed() < self.tuning.min_speed {
            self.velocity = Vector2::zeros();
            self.is_actively_controlled = false;
        }
    }

    pub fn apply_decay(&mut self) {
        if self.is_actively_controlled {
            return;
        }

        let speed = self.speed();
        if speed == 0.0 {
            return;
        }

        if speed > self.tuning.min_speed {
            self.velocity *= self.tuning.decay_factor;
        } else {
            self.velocity = Vector2::zeros();
        }
    }

    /// Assigns a velocity and takes control of the body.
    ///
    /// A zero vector releases control instead.
    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.velocity = velocity;
        self.is_actively_controlled = velocity != Vector2::zeros();
    }

    /// Adds a velocity delta, as produced by a held movement key.
    pub fn apply_impulse(&mut self, delta: Vector2) {
        self.set_velocity(self.velocity + delta);
    }

    /// Ends active control; the current velocity then starts to decay.
    pub fn release(&mut self) {
        self.is_actively_controlled = false;
    }

    pub(crate) fn restore(&mut self, state: &BodyState) {
        self.position = state.position;
        self.velocity = state.velocity;
        self.is_actively_controlled = state.is_actively_controlled;
    }

    pub fn reset(&mut self, initial_position: Vector2) {
        self.position = initial_position;
        self.velocity = Vector2::zeros();
        self.is_actively_controlled = false;
    }

    pub fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            velocity: self.velocity,
            is_actively_controlled: self.is_actively_controlled,
        }
    }
}

/// Copy of a body's kinematic state, stored in snapshots and traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vector2,
    pub velocity: Vector2,
    pub is_actively_controlled: bool,
}
