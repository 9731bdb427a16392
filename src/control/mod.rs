pub mod environment;
pub mod flight_phase;
pub mod motor_catalog;
pub mod payload;
pub mod propulsion;
pub mod rocket;
pub mod specs;
pub mod structure;
