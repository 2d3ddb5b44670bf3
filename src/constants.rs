//! Physical and numeric constants
//!
//! The standard-atmosphere values feed the barometric formula in
//! [`crate::atmosphere`]. They are the simplified figures used by the flight
//! software, not the full ICAO table.

/// Standard sea-level pressure in hPa (equivalently mbar).
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Tropospheric temperature lapse rate in K/m.
pub const TEMPERATURE_LAPSE_RATE: f64 = 0.0065;

/// Standard sea-level temperature in K.
pub const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;

/// Gravitational acceleration in m/s².
pub const GRAVITY: f64 = 9.81;

/// Molar mass of dry air in kg/mol.
pub const AIR_MOLAR_MASS: f64 = 0.029;

/// Universal gas constant in J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314;

/// Pivot magnitude below which the least-squares system is treated as singular.
pub const SINGULAR_PIVOT_EPSILON: f64 = 1e-12;

/// Slack added before truncating `1000 / hz` so that rates built from a whole
/// millisecond interval truncate back to that interval.
pub const INTERVAL_ROUNDING_EPSILON: f64 = 1e-9;

/// Longest accepted resample window (one day).
pub const MAX_RESAMPLE_WINDOW_MS: i64 = 86_400_000;
