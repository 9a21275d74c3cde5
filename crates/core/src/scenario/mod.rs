use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DopplerError, Vector2};

const START_SEPARATION: f64 = 100.0;

const SUBSONIC_SPEED: f64 = 60.0;
const WALKING_SPEED: f64 = 20.0;

/// Preset motions selectable from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scenario {
    /// Both bodies at rest; the user drives everything.
    #[default]
    Free,
    SourceApproaching,
    SourceReceding,
    ObserverApproaching,
    ObserverReceding,
    /// Both bodies move together, so no shift is heard.
    SameDirection,
    /// Source passes the observer on a parallel track.
    FlyBy,
}

/// Initial conditions for one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySetup {
    pub position: Vector2,
    pub velocity: Vector2,
    pub actively_controlled: bool,
}

impl BodySetup {
    fn at_rest(position: Vector2) -> Self {
        Self {
            position,
            velocity: Vector2::zeros(),
            actively_controlled: false,
        }
    }

    fn moving(position: Vector2, velocity: Vector2) -> Self {
        Self {
            position,
            velocity,
            actively_controlled: true,
        }
    }
}

/// Resolved initial conditions for both bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioSetup {
    pub source: BodySetup,
    pub observer: BodySetup,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::Free,
        Scenario::SourceApproaching,
        Scenario::SourceReceding,
        Scenario::ObserverApproaching,
        Scenario::ObserverReceding,
        Scenario::SameDirection,
        Scenario::FlyBy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Free => "free",
            Scenario::SourceApproaching => "source-approaching",
            Scenario::SourceReceding => "source-receding",
            Scenario::ObserverApproaching => "observer-approaching",
            Scenario::ObserverReceding => "observer-receding",
            Scenario::SameDirection => "same-direction",
            Scenario::FlyBy => "fly-by",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Free => "source and observer at rest",
            Scenario::SourceApproaching => "source drives toward a stationary observer",
            Scenario::SourceReceding => "source drives away from a stationary observer",
            Scenario::ObserverApproaching => "observer walks toward a stationary source",
            Scenario::ObserverReceding => "observer walks away from a stationary source",
            Scenario::SameDirection => "both bodies travel together at the same velocity",
            Scenario::FlyBy => "source passes the observer on a parallel track",
        }
    }

    /// Lookup table from scenario to start positions and velocities.
    pub fn setup(&self) -> ScenarioSetup {
        let source_start = Vector2::new(-START_SEPARATION / 2.0, 0.0);
        let observer_start = Vector2::new(START_SEPARATION / 2.0, 0.0);
        let toward_observer = Vector2::new(SUBSONIC_SPEED, 0.0);
        let toward_source = Vector2::new(-WALKING_SPEED, 0.0);
        match self {
            Scenario::Free => ScenarioSetup {
                source: BodySetup::at_rest(source_start),
                observer: BodySetup::at_rest(observer_start),
            },
            Scenario::SourceApproaching => ScenarioSetup {
                source: BodySetup::moving(source_start, toward_observer),
                observer: BodySetup::at_rest(observer_start),
            },
            Scenario::SourceReceding => ScenarioSetup {
                source: BodySetup::moving(source_start, -toward_observer),
                observer: BodySetup::at_rest(observer_start),
            },
            Scenario::ObserverApproaching => ScenarioSetup {
                source: BodySetup::at_rest(source_start),
                observer: BodySetup::moving(observer_start, toward_source),
            },
            Scenario::ObserverReceding => ScenarioSetup {
                source: BodySetup::at_rest(source_start),
                observer: BodySetup::moving(observer_start, -toward_source),
            },
            Scenario::SameDirection => ScenarioSetup {
                source: BodySetup::moving(source_start, toward_observer),
                observer: BodySetup::moving(observer_start, toward_observer),
            },
            Scenario::FlyBy => ScenarioSetup {
                source: BodySetup::moving(Vector2::new(-150.0, 30.0), toward_observer),
                observer: BodySetup::at_rest(observer_start),
            },
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = DopplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| DopplerError::msg(format!("unknown scenario `{s}`")))
    }
}
