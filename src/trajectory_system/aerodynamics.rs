use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_DRAG_FACTOR, INCH_TO_METER, NOSE_CONE_DRAG_FACTOR, SQUARE_INCH_TO_SQUARE_METER,
};
use crate::control::environment::air_density;
use crate::control::rocket::RocketConfiguration;
use crate::errors::Result;
use crate::utils::vector2d::Vector2D;

/// Aerodynamic and mass properties derived from a rocket design.
///
/// Axial positions are measured in meters from the aft end of the airframe
/// towards the nose tip.
#[derive(Debug, Clone)]
pub struct AeroProperties<'a> {
    config: &'a RocketConfiguration,
}

/// The numbers a design view shows next to the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AeroSummary {
    pub cg: f64,
    pub cp: f64,
    pub cd: f64,
    pub static_margin: f64,
}

impl AeroSummary {
    pub fn is_stable(&self) -> bool {
        self.static_margin > 0.0
    }
}

impl<'a> AeroProperties<'a> {
    pub fn new(config: &'a RocketConfiguration) -> Self {
        AeroProperties { config }
    }

    /// Empirical Barrowman-style sum of nose, fin and base terms.
    ///
    /// `altitude` mirrors the drag-force signature; the coefficient itself
    /// does not vary with altitude in this model.
    pub fn drag_coefficient(&self, _altitude: f64) -> f64 {
        let diameter = self.config.airframe.diameter;
        let fins = &self.config.fins;

        let nose_cd = NOSE_CONE_DRAG_FACTOR * (self.config.nose_cone.length / diameter);
        let span_ratio = fins.semi_span / fins.root_chord;
        let fin_cd = 2.0 * fins.semi_span.powi(2) / (diameter * fins.root_chord)
            * (1.0 + (1.0 + span_ratio.powi(2)).sqrt());
        let base_cd = BASE_DRAG_FACTOR * (diameter / self.config.motor.diameter);

        nose_cd + fin_cd + base_cd
    }

    pub fn frontal_area(&self) -> f64 {
        self.config.airframe.frontal_area()
    }

    /// Drag magnitude in newtons at `altitude` for airspeed `speed`.
    pub fn drag_force(&self, altitude: f64, speed: f64) -> Result<f64> {
        let rho = air_density(altitude)?;
        if speed == 0.0 {
            return Ok(0.0);
        }
        Ok(0.5 * self.drag_coefficient(altitude) * rho * self.frontal_area() * speed.powi(2))
    }

    /// Drag vector opposing `velocity`; zero when at rest.
    pub fn drag_vector(&self, altitude: f64, velocity: Vector2D) -> Result<Vector2D> {
        let speed = velocity.magnitude();
        let drag = self.drag_force(altitude, speed)?;
        if speed > 0.0 {
            Ok(-velocity.normalize() * drag)
        } else {
            Ok(Vector2D::ZERO)
        }
    }

    pub fn center_of_gravity(&self) -> f64 {
        let config = self.config;
        let masses = config.mass_breakdown();
        let airframe_length = config.airframe.length;
        let nose_length = config.nose_cone.length;

        let moments = masses.airframe * (airframe_length / 2.0)
            + masses.nose_cone * (airframe_length + nose_length / 3.0)
            + masses.fins * (config.fins.root_chord / 2.0)
            + masses.motor * (config.motor.length / 2.0)
            + masses.parachute * (airframe_length + nose_length);

        moments / masses.total()
    }

    /// Simplified Barrowman aggregate, weighted by fin planform area.
    ///
    /// The `1 + fin_area` normalization mixes a length with an area, so it
    /// is evaluated in inches (the scale stability margins were calibrated
    /// against) and converted back to meters.
    pub fn center_of_pressure(&self) -> f64 {
        let config = self.config;
        let body_length = config.airframe.length / INCH_TO_METER;
        let nose_length = config.nose_cone.length / INCH_TO_METER;
        let root_chord = config.fins.root_chord / INCH_TO_METER;
        let tip_chord = config.fins.tip_chord / INCH_TO_METER;

        let fin_area = config.fins.planform_area() / SQUARE_INCH_TO_SQUARE_METER;

        let cp_nose = body_length + nose_length * 0.5;
        let cp_body = body_length * 0.5;
        let cp_fins = ((root_chord - tip_chord) / 2.0) * fin_area;

        (cp_nose + cp_body + cp_fins) / (1.0 + fin_area) * INCH_TO_METER
    }

    pub fn static_margin(&self) -> f64 {
        (self.center_of_pressure() - self.center_of_gravity()) / self.config.airframe.diameter
    }

    pub fn summary(&self) -> AeroSummary {
        AeroSummary {
            cg: self.center_of_gravity(),
            cp: self.center_of_pressure(),
            cd: self.drag_coefficient(0.0),
            static_margin: self.static_margin(),
        }
    }
}

/// CG, CP and Cd for a validated design.
pub fn aero_properties(config: &RocketConfiguration) -> Result<AeroSummary> {
    config.validate()?;
    Ok(AeroProperties::new(config).summary())
}
