use serde::{Deserialize, Serialize};

use crate::{Scenario, WavefrontId};

/// Change notification raised by the engine for rendering and audio layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    WavefrontAdded(WavefrontId),
    WavefrontRemoved(WavefrontId),
    /// `None` while nothing has reached the observer.
    ObservedFrequencyChanged(Option<f64>),
    WaveDetected,
    ScenarioApplied(Scenario),
    Reset,
    Rewound { time: f64 },
}

/// Per-step list of change notifications, drained by the consumer.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Records additions and removals between two id lists. Both lists must
    /// be sorted ascending, which holds for the emitter's live set.
    pub fn diff_wavefronts(&mut self, before: &[WavefrontId], after: &[WavefrontId]) {
        let (mut i, mut j) = (0, 0);
        while i < before.len() || j < after.len() {
            match (before.get(i), after.get(j)) {
                (Some(old), Some(new)) if old == new => {
                    i += 1;
                    j += 1;
                }
                (Some(old), Some(new)) if old < new => {
                    self.push(EngineEvent::WavefrontRemoved(*old));
                    i += 1;
                }
                (Some(_), Some(new)) => {
                    self.push(EngineEvent::WavefrontAdded(*new));
                    j += 1;
                }
                (Some(old), None) => {
                    self.push(EngineEvent::WavefrontRemoved(*old));
                    i += 1;
                }
                (None, Some(new)) => {
                    self.push(EngineEvent::WavefrontAdded(*new));
                    j += 1;
                }
                (None, None) => break,
            }
        }
    }
}
