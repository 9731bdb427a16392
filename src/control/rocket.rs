use serde::{Deserialize, Serialize};

use super::{
    payload::Parachute,
    propulsion::Motor,
    structure::{Airframe, Fins, Material, NoseCone},
};
use crate::constants::GRAVITY;
use crate::errors::{Result, SimulationError};

/// Static design of a single-stage model rocket, in SI units.
///
/// Built once by the caller (directly or through
/// [`RocketSpecs`](super::specs::RocketSpecs)) and read-only for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketConfiguration {
    pub airframe: Airframe,
    pub nose_cone: NoseCone,
    pub fins: Fins,
    pub material: Material,
    pub motor: Motor,
    pub parachute: Parachute,
}

/// Component masses in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassBreakdown {
    pub airframe: f64,
    pub nose_cone: f64,
    pub fins: f64,
    pub motor: f64,
    pub parachute: f64,
}

impl MassBreakdown {
    pub fn structure(&self) -> f64 {
        self.airframe + self.nose_cone + self.fins
    }

    pub fn total(&self) -> f64 {
        self.structure() + self.motor + self.parachute
    }
}

impl RocketConfiguration {
    pub fn new(
        airframe: Airframe,
        nose_cone: NoseCone,
        fins: Fins,
        material: Material,
        motor: Motor,
        parachute: Parachute,
    ) -> Self {
        RocketConfiguration {
            airframe,
            nose_cone,
            fins,
            material,
            motor,
            parachute,
        }
    }

    pub fn mass_breakdown(&self) -> MassBreakdown {
        let density = self.material.density;
        let thickness = self.material.thickness;

        MassBreakdown {
            airframe: self.airframe.shell_volume(thickness) * density,
            nose_cone: self.nose_cone.shell_volume(self.airframe.radius(), thickness) * density,
            fins: f64::from(self.fins.count) * self.fins.plate_area() * thickness * density,
            motor: self.motor.mass,
            parachute: self.parachute.mass,
        }
    }

    /// Lift-off mass: structure, loaded motor and parachute.
    pub fn initial_mass(&self) -> f64 {
        self.mass_breakdown().total()
    }

    /// Mass after burnout; the floor for propellant depletion.
    pub fn dry_mass(&self) -> f64 {
        self.initial_mass() - self.motor.propellant_mass
    }

    pub fn total_length(&self) -> f64 {
        self.airframe.length + self.nose_cone.length
    }

    /// Checks every invariant the simulation relies on, naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        self.airframe.validate()?;
        self.nose_cone.validate()?;
        self.fins.validate()?;
        self.material.validate()?;
        self.motor.validate()?;
        self.parachute.validate()?;

        if self.material.thickness >= self.airframe.radius() {
            return Err(SimulationError::configuration(
                "materials.thickness",
                format!(
                    "wall thickness {} m must be smaller than the airframe radius {} m",
                    self.material.thickness,
                    self.airframe.radius()
                ),
            ));
        }
        if self.motor.length > self.airframe.length {
            return Err(SimulationError::configuration(
                "motor.length",
                format!(
                    "motor ({} m) is longer than the airframe ({} m)",
                    self.motor.length, self.airframe.length
                ),
            ));
        }
        if self.motor.diameter > self.airframe.diameter {
            return Err(SimulationError::configuration(
                "motor.diameter",
                format!(
                    "motor ({} m) is wider than the airframe ({} m)",
                    self.motor.diameter, self.airframe.diameter
                ),
            ));
        }
        if self.fins.root_chord > self.airframe.length {
            return Err(SimulationError::configuration(
                "fins.root_chord",
                "root chord is longer than the airframe",
            ));
        }

        let initial_mass = self.initial_mass();
        if !initial_mass.is_finite() || initial_mass <= 0.0 || self.dry_mass() <= 0.0 {
            return Err(SimulationError::configuration(
                "mass",
                format!("total vehicle mass must be positive, got {initial_mass} kg"),
            ));
        }

        self.check_liftoff(0.0)
    }

    /// Checks that the motor can lift the vehicle off a rail tilted
    /// `launch_angle` degrees from vertical: the peak thrust delivered
    /// during the burn, projected on the vertical, must beat the weight.
    pub fn check_liftoff(&self, launch_angle: f64) -> Result<()> {
        let weight = self.initial_mass() * GRAVITY;
        let peak = self.motor.peak_thrust();
        let lift = peak * launch_angle.to_radians().cos();
        if lift <= weight {
            return Err(SimulationError::configuration(
                "motor.thrust",
                format!(
                    "peak thrust {peak:.1} N gives {lift:.1} N of lift at {launch_angle} deg, \
                     not enough for the {weight:.1} N vehicle"
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::control::{
        payload::Parachute,
        propulsion::{Motor, ThrustCurve},
        structure::{Airframe, Fins, Material, NoseCone, NoseConeShape},
    };
    use approx::assert_relative_eq;

    /// 4 in fiberglass airframe on a K550 with a 28 in canopy.
    pub(crate) fn create_test_configuration() -> RocketConfiguration {
        RocketConfiguration::new(
            Airframe::new(0.1016, 1.2192),
            NoseCone::new(0.4064, NoseConeShape::TangentOgive),
            Fins::new(0.2032, 0.1016, 0.1016, 30.0),
            Material::new("fiberglass", 1850.0, 0.0016),
            Motor::new("K550W", ThrustCurve::Constant(550.0), 3.2, 1.487, 0.919, 0.41, 0.054),
            Parachute::from_diameter(0.75, 0.7112, 0.1),
        )
    }

    #[test]
    fn test_mass_breakdown() {
        let config = create_test_configuration();
        let masses = config.mass_breakdown();

        assert_relative_eq!(masses.airframe, 1.1338, epsilon = 1e-3);
        assert_relative_eq!(masses.nose_cone, 0.0640, epsilon = 1e-3);
        assert_relative_eq!(masses.fins, 0.1833, epsilon = 1e-3);
        assert_eq!(masses.motor, 1.487);
        assert_eq!(masses.parachute, 0.1);
        assert_relative_eq!(config.initial_mass(), masses.total(), epsilon = 1e-12);
        assert_relative_eq!(config.dry_mass(), masses.total() - 0.919, epsilon = 1e-12);
    }

    #[test]
    fn test_valid_configuration() {
        assert!(create_test_configuration().validate().is_ok());
    }

    #[test]
    fn test_invalid_configurations() {
        let mut config = create_test_configuration();
        config.material.thickness = 0.06;
        assert!(config.validate().is_err());

        let mut config = create_test_configuration();
        config.motor.length = 2.0;
        assert!(config.validate().is_err());

        let mut config = create_test_configuration();
        config.motor.thrust = ThrustCurve::Constant(20.0);
        match config.validate() {
            Err(SimulationError::ConfigurationError { field, .. }) => {
                assert_eq!(field, "motor.thrust")
            }
            other => panic!("expected a thrust error, got {other:?}"),
        }
    }

    #[test]
    fn test_thrust_after_burnout_does_not_count_for_liftoff() {
        let mut config = create_test_configuration();
        let weight = config.initial_mass() * GRAVITY;
        // Only the tail beyond burnout could lift the vehicle.
        config.motor.thrust = ThrustCurve::Table(vec![(0.0, 10.0), (3.0, 20.0), (5.0, 900.0)]);
        assert!(config.motor.thrust.peak() > weight);
        match config.validate() {
            Err(SimulationError::ConfigurationError { field, .. }) => {
                assert_eq!(field, "motor.thrust")
            }
            other => panic!("expected a thrust error, got {other:?}"),
        }
    }

    #[test]
    fn test_liftoff_check_accounts_for_launch_angle() {
        let config = create_test_configuration();
        let weight = config.initial_mass() * GRAVITY;
        // cos(87 deg) * 550 N is about 29 N.
        assert!(550.0 * 87f64.to_radians().cos() < weight);

        assert!(config.check_liftoff(0.0).is_ok());
        assert!(config.check_liftoff(45.0).is_ok());
        assert!(matches!(
            config.check_liftoff(87.0),
            Err(SimulationError::ConfigurationError { ref field, .. }) if field == "motor.thrust"
        ));
    }

    #[test]
    fn test_zero_burn_time_fails_before_mass_checks() {
        let mut config = create_test_configuration();
        config.motor.burn_time = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimulationError::ConfigurationError { ref field, .. }) if field == "motor.burn_time"
        ));
    }
}
