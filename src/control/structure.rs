use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FIN_COUNT;
use crate::errors::{require_positive, Result, SimulationError};

/// Body tube. Lengths in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Airframe {
    pub diameter: f64,
    pub length: f64,
}

impl Airframe {
    pub fn new(diameter: f64, length: f64) -> Self {
        Airframe { diameter, length }
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn frontal_area(&self) -> f64 {
        PI * self.radius().powi(2)
    }

    /// Volume of the hollow cylinder shell of the given wall thickness.
    pub fn shell_volume(&self, wall_thickness: f64) -> f64 {
        let outer = self.radius();
        let inner = outer - wall_thickness;
        PI * (outer.powi(2) - inner.powi(2)) * self.length
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("air_frame.diameter", self.diameter)?;
        require_positive("air_frame.length", self.length)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoseConeShape {
    Conic,
    Elliptical,
    TangentOgive,
    Parabolic,
}

impl fmt::Display for NoseConeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoseConeShape::Conic => "conic",
            NoseConeShape::Elliptical => "elliptical",
            NoseConeShape::TangentOgive => "tangent_ogive",
            NoseConeShape::Parabolic => "parabolic",
        };
        f.write_str(name)
    }
}

impl FromStr for NoseConeShape {
    type Err = SimulationError;

    // Accepts the labels a GUI list would show ("Tangent Ogive", "Elliptic").
    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "conic" | "cone" | "conical" => Ok(NoseConeShape::Conic),
            "elliptical" | "elliptic" => Ok(NoseConeShape::Elliptical),
            "tangent_ogive" | "ogive" => Ok(NoseConeShape::TangentOgive),
            "parabolic" => Ok(NoseConeShape::Parabolic),
            _ => Err(SimulationError::configuration(
                "nose_cone.shape",
                format!("unknown nose cone shape `{value}`"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoseCone {
    pub length: f64,
    pub shape: NoseConeShape,
}

impl NoseCone {
    pub fn new(length: f64, shape: NoseConeShape) -> Self {
        NoseCone { length, shape }
    }

    /// Thin-walled cone: the solid cone volume scaled by the wall
    /// thickness-to-radius ratio.
    pub fn shell_volume(&self, base_radius: f64, wall_thickness: f64) -> f64 {
        (1.0 / 3.0) * PI * base_radius.powi(2) * self.length * (wall_thickness / base_radius)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("nose_cone.length", self.length)?;
        Ok(())
    }
}

/// Trapezoidal fin set. Chords and span in meters, sweep in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fins {
    pub root_chord: f64,
    pub tip_chord: f64,
    pub semi_span: f64,
    pub sweep_angle: f64,
    #[serde(default = "default_fin_count")]
    pub count: u32,
}

fn default_fin_count() -> u32 {
    DEFAULT_FIN_COUNT
}

impl Fins {
    pub fn new(root_chord: f64, tip_chord: f64, semi_span: f64, sweep_angle: f64) -> Self {
        Fins {
            root_chord,
            tip_chord,
            semi_span,
            sweep_angle,
            count: DEFAULT_FIN_COUNT,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Planform area of a single fin.
    pub fn planform_area(&self) -> f64 {
        (self.root_chord + self.tip_chord) / 2.0 * self.semi_span
    }

    /// Area of the rectangular plate a single fin is cut from.
    pub fn plate_area(&self) -> f64 {
        self.root_chord * self.semi_span
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("fins.root_chord", self.root_chord)?;
        require_positive("fins.tip_chord", self.tip_chord)?;
        require_positive("fins.semi_span", self.semi_span)?;
        if !self.sweep_angle.is_finite() || !(0.0..90.0).contains(&self.sweep_angle) {
            return Err(SimulationError::configuration(
                "fins.sweep_angle",
                format!("must lie in [0, 90) degrees, got {}", self.sweep_angle),
            ));
        }
        if self.count == 0 {
            return Err(SimulationError::configuration(
                "fins.count",
                "a fin set needs at least one fin",
            ));
        }
        Ok(())
    }
}

/// Body material. Density in kg/m³, wall thickness in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub density: f64,
    pub thickness: f64,
}

impl Material {
    pub fn new(name: impl Into<String>, density: f64, thickness: f64) -> Self {
        Material {
            name: name.into(),
            density,
            thickness,
        }
    }

    /// Stock tube materials, both with 3 mm walls.
    pub fn preset(name: &str) -> Option<Material> {
        let density = match name {
            "fiberglass" => 1_800.0,
            "blue_tube" => 1_150.0,
            _ => return None,
        };
        let thickness = 0.003;
        Some(Material::new(name, density, thickness))
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("materials.density", self.density)?;
        require_positive("materials.thickness", self.thickness)?;
        Ok(())
    }
}
