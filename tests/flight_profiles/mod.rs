#![allow(dead_code)]

use baroapogee::AnalysisConfig;
use baroapogee::simulation::{FlightProfile, FlightSimulation, generate_flight_samples};
use baroapogee::types::Sample;

pub const PEAK_ALTITUDE_M: f64 = 3000.0;
pub const APOGEE_MS: i64 = 10_000;

/// Linear climb to 3000 m over 10 s and back down, 200 samples.
pub fn triangular() -> FlightSimulation {
    FlightSimulation {
        profile: FlightProfile::Triangular {
            peak_altitude_m: PEAK_ALTITUDE_M,
            ascent_s: 10.0,
            descent_s: 10.0,
        },
        sample_count: 200,
        ..FlightSimulation::default()
    }
}

/// Boost, coast and parachute descent, logged for 20 s.
pub fn ballistic() -> FlightSimulation {
    FlightSimulation {
        profile: FlightProfile::Ballistic {
            burnout_velocity_mps: 100.0,
            burnout_s: 2.0,
            descent_rate_mps: 20.0,
        },
        sample_count: 200,
        duration_s: Some(20.0),
        ..FlightSimulation::default()
    }
}

pub fn samples(simulation: &FlightSimulation) -> Vec<Sample> {
    generate_flight_samples(simulation).expect("simulation settings are valid")
}

pub fn noiseless_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.noise.range_mbar = 0.0;
    config
}
