//! Barometric formula for the lower troposphere.
//!
//! Used to turn simulated altitude profiles into pressure samples and to
//! report the altitude matching a measured pressure. The detection pipeline
//! itself only ever works in pressure.

use crate::constants::{
    AIR_MOLAR_MASS, GAS_CONSTANT, GRAVITY, SEA_LEVEL_PRESSURE_HPA, SEA_LEVEL_TEMPERATURE_K,
    TEMPERATURE_LAPSE_RATE,
};

fn barometric_exponent() -> f64 {
    (GRAVITY * AIR_MOLAR_MASS) / (GAS_CONSTANT * TEMPERATURE_LAPSE_RATE)
}

/// Expected pressure in mbar at `altitude_m` above sea level.
pub fn pressure_at_altitude(altitude_m: f64) -> f64 {
    let base = 1.0 - TEMPERATURE_LAPSE_RATE * altitude_m / SEA_LEVEL_TEMPERATURE_K;
    SEA_LEVEL_PRESSURE_HPA * base.powf(barometric_exponent())
}

/// Altitude in metres at which the standard atmosphere reaches `pressure_mbar`.
pub fn altitude_at_pressure(pressure_mbar: f64) -> f64 {
    let ratio = pressure_mbar / SEA_LEVEL_PRESSURE_HPA;
    let scale_height = SEA_LEVEL_TEMPERATURE_K / TEMPERATURE_LAPSE_RATE;
    scale_height * (1.0 - ratio.powf(barometric_exponent().recip()))
}
