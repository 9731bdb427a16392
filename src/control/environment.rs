use crate::constants::{
    AIR_GAS_CONSTANT, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE, STRATOSPHERE_PRESSURE_DECAY,
    STRATOSPHERE_TEMPERATURE, TROPOPAUSE_PRESSURE, TROPOSPHERE_HEIGHT,
    TROPOSPHERE_PRESSURE_EXPONENT, TROPOSPHERE_TEMP_GRADIENT,
};
use crate::errors::{Result, SimulationError};

/// Atmospheric conditions at a single altitude above the launch site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    pub temperature: f64, // K
    pub pressure: f64,    // Pa
    pub air_density: f64, // kg/m³
}

impl Atmosphere {
    /// Standard troposphere up to the tropopause, isothermal layer above it.
    ///
    /// The model is undefined below the launch point, so a negative (or
    /// non-finite) altitude is a `DomainError` rather than being clamped.
    pub fn at(altitude: f64) -> Result<Self> {
        if !altitude.is_finite() || altitude < 0.0 {
            return Err(SimulationError::domain("altitude", altitude));
        }

        let (temperature, pressure) = if altitude <= TROPOSPHERE_HEIGHT {
            let temperature = SEA_LEVEL_TEMPERATURE + TROPOSPHERE_TEMP_GRADIENT * altitude;
            let pressure = SEA_LEVEL_PRESSURE
                * (temperature / SEA_LEVEL_TEMPERATURE).powf(TROPOSPHERE_PRESSURE_EXPONENT);
            (temperature, pressure)
        } else {
            let pressure = TROPOPAUSE_PRESSURE
                * (-STRATOSPHERE_PRESSURE_DECAY * (altitude - TROPOSPHERE_HEIGHT)).exp();
            (STRATOSPHERE_TEMPERATURE, pressure)
        };

        Ok(Atmosphere {
            temperature,
            pressure,
            air_density: pressure / (AIR_GAS_CONSTANT * temperature),
        })
    }
}

/// Air density in kg/m³.
pub fn air_density(altitude: f64) -> Result<f64> {
    Atmosphere::at(altitude).map(|atmosphere| atmosphere.air_density)
}

/// Air density in g/cm³, for callers that keep geometry in centimetres.
pub fn air_density_g_cm3(altitude: f64) -> Result<f64> {
    air_density(altitude).map(|density| density / 1_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_sea_level_conditions() {
        let atmosphere = Atmosphere::at(0.0).unwrap();

        assert_abs_diff_eq!(atmosphere.temperature, 288.15, epsilon = 1e-9);
        assert_abs_diff_eq!(atmosphere.pressure, 101_325.0, epsilon = 1e-6);
        assert_abs_diff_eq!(atmosphere.air_density, 1.225, epsilon = 0.001);
    }

    #[test]
    fn test_density_at_5000_m() {
        assert_abs_diff_eq!(air_density(5_000.0).unwrap(), 0.736, epsilon = 0.001);
        assert_abs_diff_eq!(air_density_g_cm3(5_000.0).unwrap(), 0.000736, epsilon = 1e-6);
    }

    #[test]
    fn test_tropopause_conditions() {
        let atmosphere = Atmosphere::at(TROPOSPHERE_HEIGHT).unwrap();

        assert_abs_diff_eq!(atmosphere.temperature, 216.65, epsilon = 1e-9);
        assert_abs_diff_eq!(atmosphere.pressure, 22_632.0, epsilon = 5.0);
        assert_abs_diff_eq!(atmosphere.air_density, 0.3639, epsilon = 0.001);
    }

    #[test]
    fn test_stratosphere_conditions() {
        let atmosphere = Atmosphere::at(12_000.0).unwrap();
        let expected_pressure = 22_632.0 * (-0.0001577_f64 * 1_000.0).exp();

        assert_abs_diff_eq!(atmosphere.temperature, 216.65, epsilon = 1e-9);
        assert_relative_eq!(atmosphere.pressure, expected_pressure, epsilon = 1e-9);
        assert_abs_diff_eq!(atmosphere.air_density, 0.3107, epsilon = 0.001);
    }

    #[test]
    fn test_negative_altitude_is_a_domain_error() {
        let error = air_density(-500.0).unwrap_err();
        assert_eq!(error, SimulationError::domain("altitude", -500.0));
        assert!(Atmosphere::at(f64::NAN).is_err());
    }

    #[test]
    fn test_density_positive_and_strictly_decreasing() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let low: f64 = rng.gen_range(0.0..40_000.0);
            let high = low + rng.gen_range(1.0..5_000.0);
            let rho_low = air_density(low).unwrap();
            let rho_high = air_density(high).unwrap();

            assert!(rho_high > 0.0, "density at {high} m must be positive");
            assert!(
                rho_high < rho_low,
                "density must decrease: {rho_low} at {low} m, {rho_high} at {high} m"
            );
        }
    }
}
