use serde::{Deserialize, Serialize};

use crate::errors::{require_positive, Result, SimulationError};

/// Thrust profile of a motor over its burn, in newtons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrustCurve {
    Constant(f64),
    /// `(time, thrust)` points, linearly interpolated. Times are seconds
    /// since ignition and must be strictly increasing.
    Table(Vec<(f64, f64)>),
}

impl ThrustCurve {
    fn sample(&self, time: f64) -> f64 {
        match self {
            ThrustCurve::Constant(thrust) => *thrust,
            ThrustCurve::Table(points) => {
                let Some(&(first_t, first_f)) = points.first() else {
                    return 0.0;
                };
                if time <= first_t {
                    return first_f;
                }
                for pair in points.windows(2) {
                    let (t0, f0) = pair[0];
                    let (t1, f1) = pair[1];
                    if time <= t1 {
                        return f0 + (f1 - f0) * (time - t0) / (t1 - t0);
                    }
                }
                points.last().map_or(0.0, |&(_, thrust)| thrust)
            }
        }
    }

    pub fn peak(&self) -> f64 {
        match self {
            ThrustCurve::Constant(thrust) => *thrust,
            ThrustCurve::Table(points) => points
                .iter()
                .map(|&(_, thrust)| thrust)
                .fold(0.0, f64::max),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ThrustCurve::Constant(thrust) => {
                require_positive("motor.thrust", *thrust)?;
            }
            ThrustCurve::Table(points) => {
                if points.is_empty() {
                    return Err(SimulationError::configuration(
                        "motor.thrust_curve",
                        "thrust curve has no points",
                    ));
                }
                if points
                    .iter()
                    .any(|&(t, f)| !t.is_finite() || !f.is_finite() || t < 0.0 || f < 0.0)
                {
                    return Err(SimulationError::configuration(
                        "motor.thrust_curve",
                        "thrust curve points must be finite and non-negative",
                    ));
                }
                if points.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
                    return Err(SimulationError::configuration(
                        "motor.thrust_curve",
                        "thrust curve times must be strictly increasing",
                    ));
                }
                require_positive("motor.thrust_curve", self.peak())?;
            }
        }
        Ok(())
    }
}

/// Solid motor. Masses in kilograms, dimensions in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    pub designation: String,
    pub thrust: ThrustCurve,
    pub burn_time: f64,
    /// Loaded mass: propellant plus casing.
    pub mass: f64,
    pub propellant_mass: f64,
    pub length: f64,
    pub diameter: f64,
}

impl Motor {
    pub fn new(
        designation: impl Into<String>,
        thrust: ThrustCurve,
        burn_time: f64,
        mass: f64,
        propellant_mass: f64,
        length: f64,
        diameter: f64,
    ) -> Self {
        Motor {
            designation: designation.into(),
            thrust,
            burn_time,
            mass,
            propellant_mass,
            length,
            diameter,
        }
    }

    /// Thrust at `time` after ignition; zero once the burn is over.
    pub fn thrust_at(&self, time: f64) -> f64 {
        if (0.0..=self.burn_time).contains(&time) {
            self.thrust.sample(time).max(0.0)
        } else {
            0.0
        }
    }

    /// Highest thrust delivered during the burn. Table points after burnout
    /// are never reached, so they do not count.
    pub fn peak_thrust(&self) -> f64 {
        match &self.thrust {
            ThrustCurve::Constant(thrust) => thrust.max(0.0),
            ThrustCurve::Table(points) => points
                .iter()
                .map(|&(t, _)| t)
                .filter(|t| (0.0..=self.burn_time).contains(t))
                .chain([0.0, self.burn_time])
                .map(|t| self.thrust_at(t))
                .fold(0.0, f64::max),
        }
    }

    /// Propellant consumed per second, assuming a linear burn.
    pub fn mass_flow_rate(&self) -> f64 {
        self.propellant_mass / self.burn_time
    }

    pub fn casing_mass(&self) -> f64 {
        self.mass - self.propellant_mass
    }

    pub fn total_impulse(&self) -> f64 {
        match &self.thrust {
            ThrustCurve::Constant(thrust) => thrust * self.burn_time,
            ThrustCurve::Table(points) => {
                // Trapezoid rule over the curve, cut at burnout.
                let mut impulse = 0.0;
                let mut previous = (0.0, self.thrust_at(0.0));
                for &(t, _) in points.iter().filter(|(t, _)| *t > 0.0 && *t < self.burn_time) {
                    let current = (t, self.thrust_at(t));
                    impulse += 0.5 * (previous.1 + current.1) * (current.0 - previous.0);
                    previous = current;
                }
                let end = (self.burn_time, self.thrust_at(self.burn_time));
                impulse + 0.5 * (previous.1 + end.1) * (end.0 - previous.0)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("motor.burn_time", self.burn_time)?;
        require_positive("motor.mass", self.mass)?;
        require_positive("motor.length", self.length)?;
        require_positive("motor.diameter", self.diameter)?;
        self.thrust.validate()?;
        if !self.propellant_mass.is_finite()
            || self.propellant_mass < 0.0
            || self.propellant_mass > self.mass
        {
            return Err(SimulationError::configuration(
                "motor.propellant_mass",
                format!(
                    "must lie between 0 and the motor mass {} kg, got {}",
                    self.mass, self.propellant_mass
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant_motor() -> Motor {
        Motor::new("K550W", ThrustCurve::Constant(550.0), 3.2, 1.487, 0.919, 0.41, 0.054)
    }

    #[test]
    fn test_constant_thrust_during_burn_only() {
        let motor = constant_motor();
        assert_eq!(motor.thrust_at(0.0), 550.0);
        assert_eq!(motor.thrust_at(3.2), 550.0);
        assert_eq!(motor.thrust_at(3.2001), 0.0);
        assert_eq!(motor.thrust_at(-0.1), 0.0);
    }

    #[test]
    fn test_thrust_curve_interpolation() {
        let curve = ThrustCurve::Table(vec![(0.0, 0.0), (0.1, 100.0), (1.0, 80.0), (1.5, 0.0)]);
        let motor = Motor::new("H", curve, 1.5, 0.2, 0.1, 0.2, 0.029);

        assert_relative_eq!(motor.thrust_at(0.05), 50.0, epsilon = 1e-12);
        assert_relative_eq!(motor.thrust_at(0.55), 90.0, epsilon = 1e-12);
        assert_relative_eq!(motor.thrust_at(1.25), 40.0, epsilon = 1e-12);
        assert_eq!(motor.thrust.peak(), 100.0);
        // 5 + 81 + 20 N·s
        assert_relative_eq!(motor.total_impulse(), 106.0, epsilon = 1e-9);
    }

    #[test]
    fn test_peak_thrust_ignores_points_after_burnout() {
        let curve = ThrustCurve::Table(vec![(0.0, 0.0), (1.0, 40.0), (2.0, 60.0), (3.0, 500.0)]);
        let motor = Motor::new("late", curve, 1.5, 0.2, 0.1, 0.2, 0.029);

        assert_eq!(motor.thrust.peak(), 500.0);
        // Burnout at 1.5 s lands halfway up the 40 -> 60 N segment.
        assert_relative_eq!(motor.peak_thrust(), 50.0, epsilon = 1e-12);
        assert_eq!(constant_motor().peak_thrust(), 550.0);
    }

    #[test]
    fn test_mass_flow_and_casing() {
        let motor = constant_motor();
        assert_relative_eq!(motor.mass_flow_rate(), 0.919 / 3.2, epsilon = 1e-12);
        assert_relative_eq!(motor.casing_mass(), 0.568, epsilon = 1e-12);
        assert_relative_eq!(motor.total_impulse(), 1760.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_burn_time_is_rejected() {
        let mut motor = constant_motor();
        motor.burn_time = 0.0;
        match motor.validate() {
            Err(SimulationError::ConfigurationError { field, .. }) => {
                assert_eq!(field, "motor.burn_time")
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_propellant_and_curve_are_rejected() {
        let mut motor = constant_motor();
        motor.propellant_mass = 2.0;
        assert!(motor.validate().is_err());

        let mut motor = constant_motor();
        motor.thrust = ThrustCurve::Table(vec![(0.0, 10.0), (0.0, 20.0)]);
        assert!(motor.validate().is_err());

        let mut motor = constant_motor();
        motor.thrust = ThrustCurve::Table(Vec::new());
        assert!(motor.validate().is_err());
    }
}
