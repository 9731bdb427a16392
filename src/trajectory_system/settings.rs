use serde::{Deserialize, Serialize};

use super::integrator::{Rkf45, Tolerances};
use crate::constants::{
    COAST_TIME_BUDGET, DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_INITIAL_STEP, DEFAULT_MAX_STEP,
    DEFAULT_MIN_STEP, DEFAULT_RAIL_LENGTH, DEFAULT_RELATIVE_TOLERANCE, EULER_TIME_STEP, FREEFALL_TIME_BUDGET,
    PARACHUTE_DESCENT_TIME_BUDGET,
};
use crate::errors::{require_positive, Result, SimulationError};

/// Knobs of a simulation run that are not part of the rocket design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Launch rail tilt from vertical, degrees.
    pub launch_angle: f64,
    /// Travel along the rail before the vehicle flies free, meters.
    pub rail_length: f64,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub initial_step: f64,
    pub max_step: f64,
    pub min_step: f64,
    pub coast_time_budget: f64,
    pub freefall_time_budget: f64,
    pub parachute_time_budget: f64,
    /// Step of the fixed-step Euler variant.
    pub euler_time_step: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            launch_angle: 0.0,
            rail_length: DEFAULT_RAIL_LENGTH,
            relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            absolute_tolerance: DEFAULT_ABSOLUTE_TOLERANCE,
            initial_step: DEFAULT_INITIAL_STEP,
            max_step: DEFAULT_MAX_STEP,
            min_step: DEFAULT_MIN_STEP,
            coast_time_budget: COAST_TIME_BUDGET,
            freefall_time_budget: FREEFALL_TIME_BUDGET,
            parachute_time_budget: PARACHUTE_DESCENT_TIME_BUDGET,
            euler_time_step: EULER_TIME_STEP,
        }
    }
}

impl SimulationSettings {
    pub fn with_launch_angle(mut self, degrees: f64) -> Self {
        self.launch_angle = degrees;
        self
    }

    pub fn with_rail_length(mut self, meters: f64) -> Self {
        self.rail_length = meters;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.launch_angle.is_finite() || !(0.0..90.0).contains(&self.launch_angle) {
            return Err(SimulationError::configuration(
                "settings.launch_angle",
                format!("must be in [0, 90) degrees, got {}", self.launch_angle),
            ));
        }
        if !self.rail_length.is_finite() || self.rail_length < 0.0 {
            return Err(SimulationError::configuration(
                "settings.rail_length",
                format!("must be finite and non-negative, got {}", self.rail_length),
            ));
        }
        require_positive("settings.relative_tolerance", self.relative_tolerance)?;
        require_positive("settings.absolute_tolerance", self.absolute_tolerance)?;
        require_positive("settings.initial_step", self.initial_step)?;
        require_positive("settings.max_step", self.max_step)?;
        require_positive("settings.min_step", self.min_step)?;
        if self.min_step > self.max_step {
            return Err(SimulationError::configuration(
                "settings.min_step",
                format!(
                    "minimum step {} exceeds maximum step {}",
                    self.min_step, self.max_step
                ),
            ));
        }
        require_positive("settings.coast_time_budget", self.coast_time_budget)?;
        require_positive("settings.freefall_time_budget", self.freefall_time_budget)?;
        require_positive("settings.parachute_time_budget", self.parachute_time_budget)?;
        require_positive("settings.euler_time_step", self.euler_time_step)?;
        Ok(())
    }

    pub fn integrator(&self) -> Rkf45 {
        Rkf45::new(Tolerances::new(
            self.relative_tolerance,
            self.absolute_tolerance,
        ))
        .with_steps(self.initial_step, self.min_step, self.max_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_step, DEFAULT_MAX_STEP);
        assert_eq!(settings.launch_angle, 0.0);
        assert_eq!(settings.rail_length, DEFAULT_RAIL_LENGTH);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: SimulationSettings =
            serde_json::from_str(r#"{ "launch_angle": 5.0, "max_step": 0.05 }"#).unwrap();
        assert_eq!(settings.launch_angle, 5.0);
        assert_eq!(settings.max_step, 0.05);
        assert_eq!(settings.coast_time_budget, COAST_TIME_BUDGET);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let steep = SimulationSettings::default().with_launch_angle(95.0);
        assert!(matches!(
            steep.validate(),
            Err(SimulationError::ConfigurationError { ref field, .. }) if field == "settings.launch_angle"
        ));

        let no_rail = SimulationSettings::default().with_rail_length(0.0);
        assert!(no_rail.validate().is_ok());
        let buried = SimulationSettings::default().with_rail_length(-1.0);
        assert!(matches!(
            buried.validate(),
            Err(SimulationError::ConfigurationError { ref field, .. }) if field == "settings.rail_length"
        ));

        let inverted = SimulationSettings {
            min_step: 1.0,
            max_step: 0.1,
            ..SimulationSettings::default()
        };
        assert!(inverted.validate().is_err());

        let no_budget = SimulationSettings {
            coast_time_budget: 0.0,
            ..SimulationSettings::default()
        };
        assert!(no_budget.validate().is_err());
    }
}
