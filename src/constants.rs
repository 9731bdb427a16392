// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²

// Atmosphere (troposphere + simplified stratosphere)
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const TROPOSPHERE_TEMP_GRADIENT: f64 = -0.0065; // K per meter
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const TROPOSPHERE_PRESSURE_EXPONENT: f64 = 5.2561;
pub const STRATOSPHERE_TEMPERATURE: f64 = 216.65; // K
pub const TROPOPAUSE_PRESSURE: f64 = 22_632.0; // Pa
pub const STRATOSPHERE_PRESSURE_DECAY: f64 = 0.0001577; // 1/m
pub const AIR_GAS_CONSTANT: f64 = 287.05; // J/(kg·K)

// Drag coefficient model
pub const NOSE_CONE_DRAG_FACTOR: f64 = 0.5;
pub const BASE_DRAG_FACTOR: f64 = 0.029;

// Recovery
pub const PARACHUTE_DAMPING_SPEED: f64 = 10.0; // m/s, parachute drag halved above this descent rate
pub const PARACHUTE_DAMPING_FACTOR: f64 = 0.5;
pub const MIN_DESCENT_SPEED: f64 = 0.5; // m/s, canopy only balances the load below this descent rate
pub const DEFAULT_DEPLOYMENT_SPEED: f64 = 1.0; // m/s
pub const DEFAULT_FIN_COUNT: u32 = 3;

// Launch
pub const DEFAULT_RAIL_LENGTH: f64 = 1.5; // m

// Simulation Parameters
pub const DEFAULT_MAX_STEP: f64 = 0.1; // s
pub const DEFAULT_MIN_STEP: f64 = 1e-6; // s
pub const DEFAULT_INITIAL_STEP: f64 = 1e-3; // s
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-8;
pub const COAST_TIME_BUDGET: f64 = 600.0; // s
pub const FREEFALL_TIME_BUDGET: f64 = 600.0; // s
pub const PARACHUTE_DESCENT_TIME_BUDGET: f64 = 3_600.0; // s
pub const EULER_TIME_STEP: f64 = 0.01; // s
pub const EVENT_TIME_TOLERANCE: f64 = 1e-9; // s

// Unit conversions into SI
pub const INCH_TO_METER: f64 = 0.0254;
pub const MILLIMETER_TO_METER: f64 = 0.001;
pub const GRAM_TO_KILOGRAM: f64 = 0.001;
pub const G_PER_CM3_TO_KG_PER_M3: f64 = 1_000.0;
pub const SQUARE_INCH_TO_SQUARE_METER: f64 = INCH_TO_METER * INCH_TO_METER;
