use serde::{Deserialize, Serialize};

use super::aerodynamics::AeroProperties;
use super::integrator::OdeSystem;
use crate::constants::{DEFAULT_RAIL_LENGTH, GRAVITY};
use crate::control::environment::air_density;
use crate::control::flight_phase::PhaseParams;
use crate::control::rocket::RocketConfiguration;
use crate::errors::{Result, SimulationError};
use crate::utils::vector2d::Vector2D;

/// Number of integrated quantities: x, altitude, vx, vy, mass.
pub const STATE_DIM: usize = 5;

const MASS_FLOOR_TOLERANCE: f64 = 1e-9;

/// Motion state of the vehicle at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub time: f64,
    /// `x` downrange, `y` altitude above the pad.
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub mass: f64,
}

impl FlightState {
    /// At rest on the pad.
    pub fn at_launch(mass: f64) -> Self {
        FlightState {
            time: 0.0,
            position: Vector2D::ZERO,
            velocity: Vector2D::ZERO,
            mass,
        }
    }

    pub fn altitude(&self) -> f64 {
        self.position.y
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [
            self.position.x,
            self.position.y,
            self.velocity.x,
            self.velocity.y,
            self.mass,
        ]
    }

    pub fn from_array(time: f64, y: &[f64; STATE_DIM]) -> Self {
        FlightState {
            time,
            position: Vector2D::new(y[0], y[1]),
            velocity: Vector2D::new(y[2], y[3]),
            mass: y[4],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.non_finite_component().is_none()
    }

    /// First state component that is NaN or infinite, with its value.
    pub fn non_finite_component(&self) -> Option<(&'static str, f64)> {
        [
            ("downrange", self.position.x),
            ("altitude", self.position.y),
            ("horizontal velocity", self.velocity.x),
            ("vertical velocity", self.velocity.y),
            ("mass", self.mass),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    }
}

/// Time derivative of a [`FlightState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateDerivative {
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    pub mass_rate: f64,
}

impl StateDerivative {
    pub const ZERO: StateDerivative = StateDerivative {
        velocity: Vector2D::ZERO,
        acceleration: Vector2D::ZERO,
        mass_rate: 0.0,
    };

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [
            self.velocity.x,
            self.velocity.y,
            self.acceleration.x,
            self.acceleration.y,
            self.mass_rate,
        ]
    }
}

/// Point-mass equations of motion for one rocket design.
///
/// While powered and within `rail_length` of the pad the vehicle is held on
/// the launch rail: only the force components along the rail act. Off the
/// rail thrust follows the velocity vector.
#[derive(Debug, Clone)]
pub struct FlightDynamics<'a> {
    config: &'a RocketConfiguration,
    aerodynamics: AeroProperties<'a>,
    launch_direction: Vector2D,
    rail_length: f64,
    dry_mass: f64,
}

impl<'a> FlightDynamics<'a> {
    /// `launch_angle` is the rail tilt from vertical, in degrees.
    pub fn new(config: &'a RocketConfiguration, launch_angle: f64) -> Self {
        FlightDynamics {
            config,
            aerodynamics: AeroProperties::new(config),
            launch_direction: Vector2D::from_vertical_angle(launch_angle.to_radians()),
            rail_length: DEFAULT_RAIL_LENGTH,
            dry_mass: config.dry_mass(),
        }
    }

    pub fn with_rail_length(mut self, rail_length: f64) -> Self {
        self.rail_length = rail_length;
        self
    }

    pub fn config(&self) -> &RocketConfiguration {
        self.config
    }

    pub fn dry_mass(&self) -> f64 {
        self.dry_mass
    }

    fn thrust(&self, time: f64, params: PhaseParams) -> f64 {
        if params.thrust_enabled {
            self.config.motor.thrust_at(time)
        } else {
            0.0
        }
    }

    fn mass_rate(&self, time: f64, state: &FlightState, params: PhaseParams) -> f64 {
        // The last stage of the burnout step lands on the dry mass up to round-off.
        let above_floor = state.mass - self.dry_mass > -MASS_FLOOR_TOLERANCE * self.dry_mass;
        let burning = params.thrust_enabled && time <= self.config.motor.burn_time;
        if burning && above_floor {
            -self.config.motor.mass_flow_rate()
        } else {
            0.0
        }
    }

    /// Distance travelled along the launch rail.
    fn rail_travel(&self, state: &FlightState) -> f64 {
        state.position.dot(&self.launch_direction)
    }

    fn check_mass(state: &FlightState) -> Result<()> {
        if state.mass <= 0.0 || !state.mass.is_finite() {
            return Err(SimulationError::domain("mass", state.mass));
        }
        Ok(())
    }

    pub fn derivative(
        &self,
        time: f64,
        state: &FlightState,
        params: PhaseParams,
    ) -> Result<StateDerivative> {
        let thrust = self.thrust(time, params);
        let mass_rate = self.mass_rate(time, state, params);
        if params.thrust_enabled && self.rail_travel(state) < self.rail_length {
            return self.on_rail(state, thrust, mass_rate);
        }

        let velocity = state.velocity;
        let direction = if velocity.magnitude() > 0.0 {
            velocity.normalize()
        } else {
            self.launch_direction
        };
        // Resting on the ground without enough thrust to leave it.
        if state.altitude() <= 0.0
            && velocity.y <= 0.0
            && thrust * direction.y <= state.mass * GRAVITY
        {
            return Ok(StateDerivative::ZERO);
        }
        Self::check_mass(state)?;

        let altitude = state.altitude().max(0.0);
        let mut force = direction * thrust;
        force += self.aerodynamics.drag_vector(altitude, velocity)?;
        if params.parachute_deployed {
            let rho = air_density(altitude)?;
            let load = state.mass * GRAVITY - force.y;
            force.y += self.config.parachute.descent_force(rho, velocity.y, load);
        }
        let acceleration = force / state.mass + Vector2D::new(0.0, -GRAVITY);

        Ok(StateDerivative {
            velocity,
            acceleration,
            mass_rate,
        })
    }

    /// Motion constrained to the rail; the rail takes every force across it.
    fn on_rail(&self, state: &FlightState, thrust: f64, mass_rate: f64) -> Result<StateDerivative> {
        let speed = state.velocity.dot(&self.launch_direction);
        let weight_along = state.mass * GRAVITY * self.launch_direction.y;

        // The foot of the rail holds the vehicle until thrust beats the
        // weight's share along it. Round-off can leave it a hair below.
        if self.rail_travel(state) <= 0.0 && speed <= 0.0 && thrust <= weight_along {
            return Ok(StateDerivative::ZERO);
        }
        Self::check_mass(state)?;

        let altitude = state.altitude().max(0.0);
        let drag = self.aerodynamics.drag_force(altitude, speed.abs())? * speed.signum();
        let along = (thrust - drag - weight_along) / state.mass;

        Ok(StateDerivative {
            velocity: state.velocity,
            acceleration: self.launch_direction * along,
            mass_rate,
        })
    }
}

/// The dynamics frozen to one phase's parameters, as an ODE right-hand side.
pub struct PhaseSystem<'d, 'a> {
    pub dynamics: &'d FlightDynamics<'a>,
    pub params: PhaseParams,
}

impl OdeSystem<STATE_DIM> for PhaseSystem<'_, '_> {
    fn rhs(&self, t: f64, y: &[f64; STATE_DIM]) -> Result<[f64; STATE_DIM]> {
        let state = FlightState::from_array(t, y);
        self.dynamics
            .derivative(t, &state, self.params)
            .map(|derivative| derivative.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::flight_phase::FlightPhase;
    use crate::control::payload::Parachute;
    use crate::control::propulsion::ThrustCurve;
    use crate::control::rocket::tests::create_test_configuration;
    use approx::assert_relative_eq;

    const EPSILON: f64 = 1e-9;

    fn state(altitude: f64, vy: f64, mass: f64) -> FlightState {
        FlightState {
            time: 0.0,
            position: Vector2D::new(0.0, altitude),
            velocity: Vector2D::new(0.0, vy),
            mass,
        }
    }

    #[test]
    fn test_state_array_conversion() {
        let original = FlightState {
            time: 2.5,
            position: Vector2D::new(1.0, 2.0),
            velocity: Vector2D::new(3.0, 4.0),
            mass: 5.0,
        };
        let restored = FlightState::from_array(2.5, &original.to_array());
        assert_eq!(original, restored);
    }

    #[test]
    fn test_grounded_guard_returns_zero() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);

        let below = state(-0.5, -3.0, 2.0);
        let derivative = dynamics.derivative(10.0, &below, FlightPhase::Coast.params()).unwrap();
        assert_eq!(derivative, StateDerivative::ZERO);

        let landed = state(0.0, -3.0, 2.0);
        let derivative = dynamics
            .derivative(10.0, &landed, FlightPhase::DescentParachute.params())
            .unwrap();
        assert_eq!(derivative, StateDerivative::ZERO);
    }

    #[test]
    fn test_liftoff_from_pad() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let pad = FlightState::at_launch(config.initial_mass());

        let derivative = dynamics.derivative(0.0, &pad, FlightPhase::Ascent.params()).unwrap();
        let expected = 550.0 / config.initial_mass() - GRAVITY;

        assert_relative_eq!(derivative.acceleration.y, expected, epsilon = EPSILON);
        assert_eq!(derivative.acceleration.x, 0.0);
        assert_relative_eq!(derivative.mass_rate, -0.919 / 3.2, epsilon = EPSILON);
    }

    #[test]
    fn test_pad_hold_until_thrust_exceeds_weight() {
        let mut config = create_test_configuration();
        config.motor.thrust = ThrustCurve::Table(vec![(0.0, 0.0), (0.5, 600.0), (3.2, 500.0)]);
        let dynamics = FlightDynamics::new(&config, 0.0);
        let pad = FlightState::at_launch(config.initial_mass());

        let early = dynamics.derivative(0.01, &pad, FlightPhase::Ascent.params()).unwrap();
        assert_eq!(early, StateDerivative::ZERO);

        let later = dynamics.derivative(0.4, &pad, FlightPhase::Ascent.params()).unwrap();
        assert!(later.acceleration.y > 0.0);
    }

    #[test]
    fn test_liftoff_from_just_under_the_pad() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let sunk = state(-1e-12, -1e-7, config.initial_mass());

        let derivative = dynamics.derivative(0.5, &sunk, FlightPhase::Ascent.params()).unwrap();
        assert!(derivative.acceleration.y > 0.0);
        assert!(derivative.mass_rate < 0.0);
    }

    #[test]
    fn test_drag_and_gravity_during_coast() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let aero = AeroProperties::new(&config);
        let mass = config.dry_mass();
        let coasting = state(500.0, 80.0, mass);

        let derivative = dynamics
            .derivative(5.0, &coasting, FlightPhase::Coast.params())
            .unwrap();
        let drag = aero.drag_force(500.0, 80.0).unwrap();

        assert_relative_eq!(derivative.velocity.y, 80.0, epsilon = EPSILON);
        assert_relative_eq!(
            derivative.acceleration.y,
            -drag / mass - GRAVITY,
            epsilon = EPSILON
        );
        assert_eq!(derivative.mass_rate, 0.0);
    }

    #[test]
    fn test_thrust_ignored_outside_ascent_phase() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let climbing = state(100.0, 50.0, config.initial_mass());

        let ascent = dynamics.derivative(1.0, &climbing, FlightPhase::Ascent.params()).unwrap();
        let coast = dynamics.derivative(1.0, &climbing, FlightPhase::Coast.params()).unwrap();

        assert_relative_eq!(
            ascent.acceleration.y - coast.acceleration.y,
            550.0 / config.initial_mass(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_parachute_force_opposes_descent() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let falling = state(300.0, -8.0, config.dry_mass());

        let freefall = dynamics
            .derivative(20.0, &falling, FlightPhase::DescentFreefall.params())
            .unwrap();
        let parachute = dynamics
            .derivative(20.0, &falling, FlightPhase::DescentParachute.params())
            .unwrap();

        let rho = air_density(300.0).unwrap();
        let canopy = config.parachute.drag_force(rho, -8.0);
        assert!(canopy > 0.0);
        assert_relative_eq!(
            parachute.acceleration.y - freefall.acceleration.y,
            canopy / config.dry_mass(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_mass_floor_after_depletion() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 0.0);
        let spent = state(100.0, 50.0, config.dry_mass() * 0.99);

        let derivative = dynamics.derivative(1.0, &spent, FlightPhase::Ascent.params()).unwrap();
        assert_eq!(derivative.mass_rate, 0.0);

        let burnt_out = state(100.0, 50.0, config.dry_mass());
        let derivative = dynamics.derivative(3.5, &burnt_out, FlightPhase::Ascent.params()).unwrap();
        assert_eq!(derivative.mass_rate, 0.0);
    }

    #[test]
    fn test_tilted_rail_carries_the_cross_load() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 10.0);
        let pad = FlightState::at_launch(config.initial_mass());

        let derivative = dynamics.derivative(0.0, &pad, FlightPhase::Ascent.params()).unwrap();
        let angle = 10f64.to_radians();
        let along = 550.0 / config.initial_mass() - GRAVITY * angle.cos();

        assert_relative_eq!(derivative.acceleration.x, along * angle.sin(), epsilon = EPSILON);
        assert_relative_eq!(derivative.acceleration.y, along * angle.cos(), epsilon = EPSILON);
    }

    #[test]
    fn test_steep_rail_holds_until_thrust_beats_weight_share() {
        let mut config = create_test_configuration();
        config.motor.thrust = ThrustCurve::Table(vec![(0.0, 0.0), (1.0, 100.0), (3.2, 100.0)]);
        let dynamics = FlightDynamics::new(&config, 60.0);
        let pad = FlightState::at_launch(config.initial_mass());
        let weight_along = config.initial_mass() * GRAVITY * 60f64.to_radians().cos();

        // Thrust ramps at 100 N/s; the rail carries the rest of the weight.
        let held = dynamics
            .derivative(0.9 * weight_along / 100.0, &pad, FlightPhase::Ascent.params())
            .unwrap();
        assert_eq!(held, StateDerivative::ZERO);

        let moving = dynamics
            .derivative(1.1 * weight_along / 100.0, &pad, FlightPhase::Ascent.params())
            .unwrap();
        assert!(moving.acceleration.x > 0.0 && moving.acceleration.y > 0.0);
    }

    #[test]
    fn test_thrust_follows_velocity_off_the_rail() {
        let config = create_test_configuration();
        let dynamics = FlightDynamics::new(&config, 45.0);
        let aero = AeroProperties::new(&config);
        let mass = config.initial_mass();
        // Well past the rail and already sinking while the motor still burns.
        let sinking = FlightState {
            time: 1.0,
            position: Vector2D::new(80.0, 20.0),
            velocity: Vector2D::new(60.0, -5.0),
            mass,
        };

        let derivative = dynamics
            .derivative(1.0, &sinking, FlightPhase::Ascent.params())
            .unwrap();
        let speed = sinking.velocity.magnitude();
        let drag = aero.drag_force(20.0, speed).unwrap();
        let expected_y = (550.0 - drag) * (-5.0 / speed) / mass - GRAVITY;

        assert_relative_eq!(derivative.acceleration.y, expected_y, epsilon = 1e-6);
        assert!(derivative.acceleration.y < -GRAVITY);
    }

    #[test]
    fn test_rail_length_setting() {
        let config = create_test_configuration();
        let mass = config.initial_mass();
        let climbing = FlightState {
            time: 0.5,
            position: Vector2D::new(0.5, 0.5),
            velocity: Vector2D::new(10.0, 10.0),
            mass,
        };

        // 0.71 m along a 45 degree rail: on a 1.5 m rail, off a 0.5 m one.
        let long = FlightDynamics::new(&config, 45.0).with_rail_length(1.5);
        let short = FlightDynamics::new(&config, 45.0).with_rail_length(0.5);
        let on_rail = long.derivative(0.5, &climbing, FlightPhase::Ascent.params()).unwrap();
        let free = short.derivative(0.5, &climbing, FlightPhase::Ascent.params()).unwrap();

        assert_relative_eq!(on_rail.acceleration.x, on_rail.acceleration.y, epsilon = EPSILON);
        assert!(free.acceleration.x > free.acceleration.y);
    }

    #[test]
    fn test_canopy_never_lifts_a_slow_descent() {
        let mut config = create_test_configuration();
        config.parachute = Parachute::new(1.5, 500.0, 0.5);
        let dynamics = FlightDynamics::new(&config, 0.0);
        let mass = config.dry_mass();

        // Under the floor speed the canopy only balances the load.
        let slow = state(200.0, -0.3, mass);
        let derivative = dynamics
            .derivative(60.0, &slow, FlightPhase::DescentParachute.params())
            .unwrap();
        assert_relative_eq!(derivative.acceleration.y, 0.0, epsilon = 1e-12);

        // Faster than the floor the full canopy decelerates the descent.
        let fast = state(200.0, -2.0, mass);
        let derivative = dynamics
            .derivative(60.0, &fast, FlightPhase::DescentParachute.params())
            .unwrap();
        assert!(derivative.acceleration.y > 0.0);
    }
}
