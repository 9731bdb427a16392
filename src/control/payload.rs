use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DEPLOYMENT_SPEED, INCH_TO_METER, MIN_DESCENT_SPEED, PARACHUTE_DAMPING_FACTOR,
    PARACHUTE_DAMPING_SPEED,
};
use crate::errors::{require_positive, Result, SimulationError};

/// Named canopy sizes offered for selection: nominal diameter, drag
/// coefficient and mass of the stock canopy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParachuteSize {
    Small,
    Medium,
    Large,
}

impl ParachuteSize {
    pub fn nominal_diameter_inches(&self) -> f64 {
        match self {
            ParachuteSize::Small => 15.0,
            ParachuteSize::Medium => 28.0,
            ParachuteSize::Large => 42.0,
        }
    }

    pub fn nominal_diameter(&self) -> f64 {
        self.nominal_diameter_inches() * INCH_TO_METER
    }

    pub fn drag_coefficient(&self) -> f64 {
        match self {
            ParachuteSize::Small => 1.25,
            ParachuteSize::Medium => 1.5,
            ParachuteSize::Large => 1.8,
        }
    }

    /// Canopy mass in kilograms.
    pub fn mass(&self) -> f64 {
        match self {
            ParachuteSize::Small => 0.060,
            ParachuteSize::Medium => 0.070,
            ParachuteSize::Large => 0.1276,
        }
    }

    /// Stock canopy of this size.
    pub fn parachute(&self) -> Parachute {
        Parachute::from_diameter(self.drag_coefficient(), self.nominal_diameter(), self.mass())
    }
}

impl fmt::Display for ParachuteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParachuteSize::Small => write!(f, "small"),
            ParachuteSize::Medium => write!(f, "medium"),
            ParachuteSize::Large => write!(f, "large"),
        }
    }
}

impl FromStr for ParachuteSize {
    type Err = SimulationError;

    // "Medium (28 inch)" style labels resolve by their first word.
    fn from_str(value: &str) -> Result<Self> {
        let word = value
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match word.as_str() {
            "small" => Ok(ParachuteSize::Small),
            "medium" => Ok(ParachuteSize::Medium),
            "large" | "larger" => Ok(ParachuteSize::Large),
            _ => Err(SimulationError::configuration(
                "parachute",
                format!("unknown parachute size `{value}`"),
            )),
        }
    }
}

/// Recovery parachute. Area in m², mass in kg, deployment speed in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parachute {
    pub drag_coefficient: f64,
    pub area: f64,
    pub mass: f64,
    /// Descent rate after apogee at which the canopy opens.
    #[serde(default = "default_deployment_speed")]
    pub deployment_speed: f64,
}

fn default_deployment_speed() -> f64 {
    DEFAULT_DEPLOYMENT_SPEED
}

impl Parachute {
    pub fn new(drag_coefficient: f64, area: f64, mass: f64) -> Self {
        Parachute {
            drag_coefficient,
            area,
            mass,
            deployment_speed: DEFAULT_DEPLOYMENT_SPEED,
        }
    }

    pub fn from_diameter(drag_coefficient: f64, diameter: f64, mass: f64) -> Self {
        Parachute::new(drag_coefficient, PI * (diameter / 2.0).powi(2), mass)
    }

    pub fn with_deployment_speed(mut self, deployment_speed: f64) -> Self {
        self.deployment_speed = deployment_speed;
        self
    }

    /// Vertical velocity below which the canopy opens.
    pub fn deployment_threshold(&self) -> f64 {
        -self.deployment_speed
    }

    /// Upward force from the open canopy for vertical velocity `vy`.
    ///
    /// Zero while climbing; halved once the descent rate exceeds the damping
    /// speed.
    pub fn drag_force(&self, air_density: f64, vy: f64) -> f64 {
        if vy >= 0.0 {
            return 0.0;
        }
        let force = 0.5 * self.drag_coefficient * air_density * self.area * vy.powi(2);
        if vy.abs() > PARACHUTE_DAMPING_SPEED {
            force * PARACHUTE_DAMPING_FACTOR
        } else {
            force
        }
    }

    /// Canopy force with the descent-rate floor applied.
    ///
    /// `load` is the net downward force from everything else. Once the
    /// descent is no faster than [`MIN_DESCENT_SPEED`] the canopy can at most
    /// balance it, so it never slows the vehicle further or lifts it.
    pub fn descent_force(&self, air_density: f64, vy: f64, load: f64) -> f64 {
        let force = self.drag_force(air_density, vy);
        if vy >= -MIN_DESCENT_SPEED {
            force.min(load.max(0.0))
        } else {
            force
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("parachute.drag_coeff", self.drag_coefficient)?;
        require_positive("parachute.area", self.area)?;
        require_positive("parachute.mass", self.mass)?;
        if !self.deployment_speed.is_finite() || self.deployment_speed < 0.0 {
            return Err(SimulationError::configuration(
                "parachute.deploy_velocity",
                format!(
                    "must be a non-negative descent rate, got {}",
                    self.deployment_speed
                ),
            ));
        }
        Ok(())
    }
}
