use log::debug;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::FlightProfile;
use crate::atmosphere::pressure_at_altitude;
use crate::error::{AnalysisError, Result};
use crate::types::Sample;

/// Gaussian barometer noise
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorNoise {
    pub std_dev_mbar: f64,
    /// Random when absent
    pub seed: Option<u64>,
}

/// A simulated barometer log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSimulation {
    pub profile: FlightProfile,
    pub sample_count: usize,
    /// Span of the log in seconds; the profile's landing time when absent
    pub duration_s: Option<f64>,
    /// Uniform timestamp jitter in seconds, less than half the sample interval
    pub timing_jitter_s: f64,
    pub noise: Option<SensorNoise>,
}

impl Default for FlightSimulation {
    fn default() -> Self {
        Self {
            profile: FlightProfile::default(),
            sample_count: 200,
            duration_s: None,
            timing_jitter_s: 0.0,
            noise: None,
        }
    }
}

impl FlightSimulation {
    pub fn with_noise(mut self, std_dev_mbar: f64, seed: u64) -> Self {
        self.noise = Some(SensorNoise {
            std_dev_mbar,
            seed: Some(seed),
        });
        self
    }

    pub fn with_jitter(mut self, timing_jitter_s: f64) -> Self {
        self.timing_jitter_s = timing_jitter_s;
        self
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s.unwrap_or_else(|| self.profile.duration_s())
    }

    /// Nominal spacing between samples
    pub fn interval_s(&self) -> f64 {
        self.duration_s() / (self.sample_count.max(2) - 1) as f64
    }

    pub fn validate(&self) -> Result<()> {
        self.profile.validate()?;
        if self.sample_count < 2 {
            return Err(AnalysisError::Config(format!(
                "sample_count must be at least 2, got {}",
                self.sample_count
            )));
        }
        let duration = self.duration_s();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "duration must be positive, got {}",
                duration
            )));
        }
        if !(0.0..self.interval_s() / 2.0).contains(&self.timing_jitter_s) {
            return Err(AnalysisError::Config(format!(
                "timing jitter {} s must be below half the {} s interval",
                self.timing_jitter_s,
                self.interval_s()
            )));
        }
        if let Some(noise) = &self.noise
            && (!noise.std_dev_mbar.is_finite() || noise.std_dev_mbar < 0.0)
        {
            return Err(AnalysisError::Config(format!(
                "noise std dev must be non-negative, got {}",
                noise.std_dev_mbar
            )));
        }
        Ok(())
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Sample the profile through the standard atmosphere.
///
/// Timestamps are evenly spaced from 0 to the duration inclusive, each moved
/// by up to `timing_jitter_s`; the first sample stays at 0. The result is
/// strictly increasing in time.
pub fn generate_flight_samples(simulation: &FlightSimulation) -> Result<Vec<Sample>> {
    simulation.validate()?;

    let interval = simulation.interval_s();
    let noise = simulation.noise.as_ref();
    let mut rng = create_rng(noise.and_then(|n| n.seed));
    let normal = match noise {
        Some(n) if n.std_dev_mbar > 0.0 => Some(
            Normal::new(0.0, n.std_dev_mbar)
                .map_err(|e| AnalysisError::Config(format!("invalid noise: {}", e)))?,
        ),
        _ => None,
    };
    let jitter = simulation.timing_jitter_s;

    let samples: Vec<Sample> = (0..simulation.sample_count)
        .map(|i| {
            let mut t = i as f64 * interval;
            if i > 0 && jitter > 0.0 {
                t += rng.random_range(-jitter..jitter);
            }
            let mut pressure = pressure_at_altitude(simulation.profile.altitude_at(t));
            if let Some(normal) = &normal {
                pressure += normal.sample(&mut rng);
            }
            Sample::new(t, pressure)
        })
        .collect();

    debug!(
        "Simulated {} samples over {:.2} s, apogee {:.0} m at {:.3} s",
        samples.len(),
        simulation.duration_s(),
        simulation.profile.peak_altitude_m(),
        simulation.profile.apogee_time_s()
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SEA_LEVEL_PRESSURE_HPA;
    use crate::types::validate_samples;
    use approx::assert_relative_eq;

    #[test]
    fn test_clean_triangular_flight() {
        let samples = generate_flight_samples(&FlightSimulation::default()).unwrap();

        assert_eq!(samples.len(), 200);
        assert_relative_eq!(samples[0].time_s, 0.0);
        assert_relative_eq!(samples[199].time_s, 20.0, epsilon = 1e-9);
        assert_relative_eq!(samples[0].pressure_mbar, SEA_LEVEL_PRESSURE_HPA);
        assert!(validate_samples(&samples).is_ok());

        let lowest = samples
            .iter()
            .map(|s| s.pressure_mbar)
            .fold(f64::INFINITY, f64::min);
        assert!(lowest > pressure_at_altitude(3000.0));
        assert!(lowest < pressure_at_altitude(2900.0));
    }

    #[test]
    fn test_noise_is_seeded() {
        let simulation = FlightSimulation::default().with_noise(0.5, 42);
        let a = generate_flight_samples(&simulation).unwrap();
        let b = generate_flight_samples(&simulation).unwrap();
        assert_eq!(a, b);

        let clean = generate_flight_samples(&FlightSimulation::default()).unwrap();
        let max_dev = a
            .iter()
            .zip(&clean)
            .map(|(n, c)| (n.pressure_mbar - c.pressure_mbar).abs())
            .fold(0.0, f64::max);
        assert!(max_dev > 0.0);
        assert!(max_dev < 5.0, "max deviation {}", max_dev);

        let other = generate_flight_samples(&FlightSimulation::default().with_noise(0.5, 43));
        assert_ne!(a, other.unwrap());
    }

    #[test]
    fn test_jitter_keeps_order() {
        let simulation = FlightSimulation::default().with_jitter(0.04).with_noise(0.0, 7);
        let samples = generate_flight_samples(&simulation).unwrap();
        assert!(validate_samples(&samples).is_ok());
        assert_relative_eq!(samples[0].time_s, 0.0);
        for (i, s) in samples.iter().enumerate() {
            assert!((s.time_s - i as f64 * simulation.interval_s()).abs() <= 0.04);
        }
    }

    #[test]
    fn test_rejects_bad_settings() {
        let too_jittery = FlightSimulation::default().with_jitter(1.0);
        assert!(matches!(
            generate_flight_samples(&too_jittery),
            Err(AnalysisError::Config(_))
        ));

        let negative_noise = FlightSimulation::default().with_noise(-1.0, 0);
        assert!(generate_flight_samples(&negative_noise).is_err());

        let single = FlightSimulation {
            sample_count: 1,
            ..FlightSimulation::default()
        };
        assert!(generate_flight_samples(&single).is_err());
    }
}
