use std::fmt;

use serde::{Deserialize, Serialize};

/// Flight phases in the order they occur. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlightPhase {
    Ascent,
    Coast,
    DescentFreefall,
    DescentParachute,
    Landed,
}

impl FlightPhase {
    pub fn is_thrusting(&self) -> bool {
        matches!(self, FlightPhase::Ascent)
    }

    pub fn parachute_deployed(&self) -> bool {
        matches!(self, FlightPhase::DescentParachute)
    }

    /// Whether `next` may follow `self`.
    ///
    /// Besides the regular sequence, a ground impact can end the ascent, the
    /// coast or the freefall directly.
    pub fn can_transition_to(&self, next: FlightPhase) -> bool {
        use FlightPhase::*;
        matches!(
            (self, next),
            (Ascent, Coast)
                | (Coast, DescentFreefall)
                | (DescentFreefall, DescentParachute)
                | (DescentParachute, Landed)
                | (Ascent, Landed)
                | (Coast, Landed)
                | (DescentFreefall, Landed)
        )
    }

    pub fn params(&self) -> PhaseParams {
        PhaseParams {
            phase: *self,
            thrust_enabled: self.is_thrusting(),
            parachute_deployed: self.parachute_deployed(),
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightPhase::Ascent => "ascent",
            FlightPhase::Coast => "coast",
            FlightPhase::DescentFreefall => "freefall descent",
            FlightPhase::DescentParachute => "parachute descent",
            FlightPhase::Landed => "landed",
        };
        f.write_str(name)
    }
}

/// Switches handed to the dynamics for one phase segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseParams {
    pub phase: FlightPhase,
    pub thrust_enabled: bool,
    pub parachute_deployed: bool,
}

/// Events that end a phase segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightEvent {
    Burnout,
    Apogee,
    ParachuteDeployment,
    GroundImpact,
}

impl fmt::Display for FlightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightEvent::Burnout => "burnout",
            FlightEvent::Apogee => "apogee",
            FlightEvent::ParachuteDeployment => "parachute deployment",
            FlightEvent::GroundImpact => "ground impact",
        };
        f.write_str(name)
    }
}
