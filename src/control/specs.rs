//! Boundary between the JSON design file and the SI configuration.
//!
//! The design file keeps the units a hobbyist measures in: airframe, nose
//! cone, fin and canopy dimensions in inches, motor dimensions and wall
//! thickness in millimetres, masses in grams and densities in g/cm³. Every
//! value is converted to SI here, so nothing downstream sees these units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    payload::{Parachute, ParachuteSize},
    propulsion::{Motor, ThrustCurve},
    rocket::RocketConfiguration,
    structure::{Airframe, Fins, Material, NoseCone, NoseConeShape},
};
use crate::constants::{
    DEFAULT_DEPLOYMENT_SPEED, DEFAULT_FIN_COUNT, GRAM_TO_KILOGRAM, G_PER_CM3_TO_KG_PER_M3, INCH_TO_METER, MILLIMETER_TO_METER,
    SQUARE_INCH_TO_SQUARE_METER,
};
use crate::errors::{Result, SimulationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirframeSpec {
    pub diameter: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoseConeSpec {
    pub length: f64,
    #[serde(default = "default_shape")]
    pub shape: String,
}

fn default_shape() -> String {
    NoseConeShape::TangentOgive.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinSpec {
    pub root_chord: f64,
    pub tip_chord: f64,
    pub semi_span: f64,
    #[serde(default)]
    pub sweep_angle: f64,
    #[serde(default = "default_fin_count")]
    pub count: u32,
}

fn default_fin_count() -> u32 {
    DEFAULT_FIN_COUNT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorSpec {
    #[serde(default)]
    pub designation: Option<String>,
    pub thrust: f64,
    pub burn_time: f64,
    pub mass: f64,
    /// Defaults to the whole motor mass, i.e. the casing burns away too.
    #[serde(default)]
    pub propellant_mass: Option<f64>,
    pub length: f64,
    pub diameter: f64,
    /// `(s, N)` points; overrides the constant `thrust` when present.
    #[serde(default)]
    pub thrust_curve: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub density: f64,
    pub thickness: f64,
}

/// Canopy entry. A named size fills in the stock drag coefficient and mass
/// when they are omitted.
///
/// Unknown keys are rejected so that a table of sizes is never read as a
/// single canopy with every field left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParachuteSpec {
    #[serde(default)]
    pub drag_coeff: Option<f64>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub diameter: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default = "default_deploy_velocity")]
    pub deploy_velocity: f64,
}

fn default_deploy_velocity() -> f64 {
    DEFAULT_DEPLOYMENT_SPEED
}

/// Either a single canopy or a table of named sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParachuteSpecs {
    Single(ParachuteSpec),
    Sized(BTreeMap<String, ParachuteSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketSpecs {
    pub air_frame: AirframeSpec,
    pub nose_cone: NoseConeSpec,
    pub fins: FinSpec,
    #[serde(default)]
    pub motors: BTreeMap<String, MotorSpec>,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialSpec>,
    pub parachute: ParachuteSpecs,
}

/// Keys are compared case-insensitively with spaces folded to underscores,
/// so "Blue Tube" selects `blue_tube`.
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

fn lookup<'a, T>(table: &'a BTreeMap<String, T>, key: &str, field: &str) -> Result<&'a T> {
    let wanted = normalize_key(key);
    table
        .iter()
        .find(|(name, _)| normalize_key(name) == wanted)
        .map(|(_, value)| value)
        .ok_or_else(|| {
            let known: Vec<&str> = table.keys().map(String::as_str).collect();
            SimulationError::configuration(
                field,
                format!("no entry named `{key}` (available: {})", known.join(", ")),
            )
        })
}

impl RocketSpecs {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| SimulationError::configuration("specs", e.to_string()))
    }

    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motors.keys().map(String::as_str)
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Material from the design file, or a stock tube material when the
    /// file has no entry of that name.
    fn resolve_material(&self, material: &str) -> Result<Material> {
        match lookup(&self.materials, material, "materials") {
            Ok(spec) => Ok(Material::new(
                normalize_key(material),
                spec.density * G_PER_CM3_TO_KG_PER_M3,
                spec.thickness * MILLIMETER_TO_METER,
            )),
            Err(error) => Material::preset(&normalize_key(material)).ok_or(error),
        }
    }

    /// Resolves the selected motor, material and canopy and converts the
    /// design to SI. The result is validated before it is returned.
    pub fn configuration(
        &self,
        motor: &str,
        material: &str,
        parachute_size: &str,
    ) -> Result<RocketConfiguration> {
        let motor_spec = lookup(&self.motors, motor, "motors")?;
        self.configuration_with_motor(convert_motor(motor, motor_spec), material, parachute_size)
    }

    /// Like [`configuration`](Self::configuration) with a motor supplied by
    /// the caller, e.g. from a [`MotorCatalog`](super::motor_catalog::MotorCatalog).
    pub fn configuration_with_motor(
        &self,
        motor: Motor,
        material: &str,
        parachute_size: &str,
    ) -> Result<RocketConfiguration> {
        let material = self.resolve_material(material)?;

        let shape: NoseConeShape = self.nose_cone.shape.parse()?;
        let config = RocketConfiguration::new(
            Airframe::new(
                self.air_frame.diameter * INCH_TO_METER,
                self.air_frame.length * INCH_TO_METER,
            ),
            NoseCone::new(self.nose_cone.length * INCH_TO_METER, shape),
            Fins::new(
                self.fins.root_chord * INCH_TO_METER,
                self.fins.tip_chord * INCH_TO_METER,
                self.fins.semi_span * INCH_TO_METER,
                self.fins.sweep_angle,
            )
            .with_count(self.fins.count),
            material,
            motor,
            self.resolve_parachute(parachute_size)?,
        );
        config.validate()?;
        Ok(config)
    }

    fn resolve_parachute(&self, parachute_size: &str) -> Result<Parachute> {
        match &self.parachute {
            ParachuteSpecs::Single(spec) => convert_parachute(spec, None),
            ParachuteSpecs::Sized(sizes) => {
                let nominal = parachute_size.parse::<ParachuteSize>().ok();
                let spec = match (lookup(sizes, parachute_size, "parachute"), nominal) {
                    (Ok(spec), _) => spec,
                    // "Medium (28 inch)" falls back to the `medium` entry.
                    (Err(error), Some(size)) => {
                        lookup(sizes, &size.to_string(), "parachute").map_err(|_| error)?
                    }
                    (Err(error), None) => return Err(error),
                };
                convert_parachute(spec, nominal)
            }
        }
    }
}

fn convert_motor(id: &str, spec: &MotorSpec) -> Motor {
    let thrust = match &spec.thrust_curve {
        Some(points) => ThrustCurve::Table(points.clone()),
        None => ThrustCurve::Constant(spec.thrust),
    };
    let propellant = spec.propellant_mass.unwrap_or(spec.mass);
    Motor::new(
        spec.designation.clone().unwrap_or_else(|| id.to_string()),
        thrust,
        spec.burn_time,
        spec.mass * GRAM_TO_KILOGRAM,
        propellant * GRAM_TO_KILOGRAM,
        spec.length * MILLIMETER_TO_METER,
        spec.diameter * MILLIMETER_TO_METER,
    )
}

fn convert_parachute(spec: &ParachuteSpec, nominal: Option<ParachuteSize>) -> Result<Parachute> {
    let drag_coefficient = spec
        .drag_coeff
        .or_else(|| nominal.map(|size| size.drag_coefficient()))
        .ok_or_else(|| {
            SimulationError::configuration("parachute.drag_coeff", "required without a size name")
        })?;
    let mass = match spec.mass {
        Some(grams) => grams * GRAM_TO_KILOGRAM,
        None => nominal.map(|size| size.mass()).ok_or_else(|| {
            SimulationError::configuration("parachute.mass", "required without a size name")
        })?,
    };

    let parachute = if let Some(area) = spec.area {
        Parachute::new(drag_coefficient, area * SQUARE_INCH_TO_SQUARE_METER, mass)
    } else if let Some(diameter) = spec.diameter {
        Parachute::from_diameter(drag_coefficient, diameter * INCH_TO_METER, mass)
    } else if let Some(size) = nominal {
        Parachute::from_diameter(drag_coefficient, size.nominal_diameter(), mass)
    } else {
        return Err(SimulationError::configuration(
            "parachute",
            "canopy needs an `area`, a `diameter` or a standard size name",
        ));
    };
    Ok(parachute.with_deployment_speed(spec.deploy_velocity))
}
