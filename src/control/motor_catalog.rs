use std::collections::BTreeMap;

use super::propulsion::{Motor, ThrustCurve};
use crate::errors::{Result, SimulationError};

/// Motors keyed by impulse class letter.
#[derive(Debug, Clone, Default)]
pub struct MotorCatalog {
    motors: BTreeMap<String, Motor>,
}

impl MotorCatalog {
    pub fn new() -> Self {
        MotorCatalog::default()
    }

    /// Representative single-use reloads for each class from G to L.
    /// Average thrust (N), burn time (s), loaded and propellant mass (kg),
    /// length and diameter (m).
    pub fn builtin() -> Self {
        let table = [
            ("G", "G80T", 80.0, 1.5, 0.107, 0.0625, 0.124, 0.029),
            ("H", "H128W", 128.0, 1.4, 0.206, 0.094, 0.194, 0.029),
            ("I", "I284W", 284.0, 1.4, 0.556, 0.313, 0.298, 0.038),
            ("J", "J350W", 350.0, 2.0, 0.700, 0.372, 0.337, 0.038),
            ("K", "K550W", 550.0, 3.2, 1.487, 0.919, 0.410, 0.054),
            ("L", "L850W", 850.0, 4.3, 3.360, 1.921, 0.443, 0.075),
        ];

        let mut catalog = MotorCatalog::new();
        for (class, designation, thrust, burn_time, mass, propellant, length, diameter) in table {
            catalog.insert(
                class,
                Motor::new(
                    designation,
                    ThrustCurve::Constant(thrust),
                    burn_time,
                    mass,
                    propellant,
                    length,
                    diameter,
                ),
            );
        }
        catalog
    }

    pub fn insert(&mut self, id: impl Into<String>, motor: Motor) {
        self.motors.insert(id.into().to_uppercase(), motor);
    }

    /// Looks a motor up by class letter or full designation.
    pub fn get(&self, id: &str) -> Result<&Motor> {
        let wanted = id.trim().to_uppercase();
        self.motors
            .get(&wanted)
            .or_else(|| {
                self.motors
                    .values()
                    .find(|motor| motor.designation.to_uppercase() == wanted)
            })
            .ok_or_else(|| {
                SimulationError::configuration("motors", format!("unknown motor `{id}`"))
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.motors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.motors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = MotorCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.ids().collect::<Vec<_>>(), ["G", "H", "I", "J", "K", "L"]);

        for id in catalog.ids() {
            let motor = catalog.get(id).unwrap();
            assert!(motor.validate().is_ok(), "motor {id} should be valid");
        }
    }

    #[test]
    fn test_classes_have_distinct_impulse() {
        let catalog = MotorCatalog::builtin();
        let impulses: Vec<f64> = catalog
            .ids()
            .map(|id| catalog.get(id).unwrap().total_impulse())
            .collect();

        assert!(impulses.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_lookup_by_designation_and_case() {
        let catalog = MotorCatalog::builtin();
        assert_eq!(catalog.get("k").unwrap().designation, "K550W");
        assert_eq!(catalog.get("j350w").unwrap().designation, "J350W");
        assert!(matches!(
            catalog.get("Z"),
            Err(SimulationError::ConfigurationError { .. })
        ));
    }
}
