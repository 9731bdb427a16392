pub mod aerodynamics;
pub mod euler;
pub mod integrator;
pub mod kinematics;
pub mod scheduler;
pub mod settings;
