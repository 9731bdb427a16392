pub mod constants;
pub mod control;
pub mod errors;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use constants::*;
pub use control::environment::{air_density, Atmosphere};
pub use control::flight_phase::{FlightEvent, FlightPhase, PhaseParams};
pub use control::motor_catalog::MotorCatalog;
pub use control::payload::{Parachute, ParachuteSize};
pub use control::propulsion::{Motor, ThrustCurve};
pub use control::rocket::{MassBreakdown, RocketConfiguration};
pub use control::specs::RocketSpecs;
pub use control::structure::{Airframe, Fins, Material, NoseCone, NoseConeShape};
pub use errors::{Result, SimulationError};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::aerodynamics::{aero_properties, AeroProperties, AeroSummary};
pub use trajectory_system::euler::EulerSimulator;
pub use trajectory_system::kinematics::{FlightDynamics, FlightState, StateDerivative};
pub use trajectory_system::scheduler::{simulate, Simulation};
pub use trajectory_system::settings::SimulationSettings;

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{
    FlightReport, FlightSeries, FlightSummary, TrajectorySample,
};

// Re-export commonly used utilities
pub use utils::vector2d::Vector2D;
