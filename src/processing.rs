use log::debug;
use serde::Serialize;

use crate::atmosphere::altitude_at_pressure;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::signal_processing::{
    BlockAverager, EventDetector, QuadraticModel, Resampler, find_apogee, fit_quadratic,
    forward_difference,
};
use crate::types::{DerivativeSeries, FlightEvents, ResampledSeries, Sample, SmoothedSeries};

/// Everything one analysis run produced.
///
/// The intermediate series are kept so a plotter or report generator can
/// show how the events were derived.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub model: QuadraticModel,
    pub events: FlightEvents,
    pub resampled: ResampledSeries,
    pub smoothed: SmoothedSeries,
    pub derivative: DerivativeSeries,
}

impl AnalysisReport {
    /// Lowest block-averaged pressure, i.e. the pressure at apogee.
    pub fn apogee_pressure_mbar(&self) -> Option<f64> {
        find_apogee(self.smoothed.points()).map(|i| self.smoothed.points()[i].pressure_mbar)
    }

    /// Standard-atmosphere altitude matching the apogee pressure.
    pub fn apogee_altitude_m(&self) -> Option<f64> {
        self.apogee_pressure_mbar().map(altitude_at_pressure)
    }
}

/// Fit → resample → smooth → differentiate → detect, for one flight.
///
/// Built once from a validated configuration and reusable across flights;
/// it holds no per-run state, so separate threads may each own one.
pub struct FlightAnalyzer {
    resampler: Resampler,
    averager: BlockAverager,
    detector: EventDetector,
}

impl FlightAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resampler: Resampler::new(&config.resample, &config.noise)?,
            averager: BlockAverager::new(config.smoothing.block_size)?,
            detector: EventDetector::new(&config.detector)?,
        })
    }

    pub fn analyze(&self, samples: &[Sample]) -> Result<AnalysisReport> {
        debug!("Analyzing {} raw samples", samples.len());

        let model = fit_quadratic(samples)?;
        let resampled = self.resampler.resample(&model);
        let smoothed = self.averager.smooth(&resampled);
        let derivative = forward_difference(&smoothed)?;
        let events = self.detector.detect_with_resampled(&resampled, &smoothed)?;

        Ok(AnalysisReport {
            model,
            events,
            resampled,
            smoothed,
            derivative,
        })
    }

    pub fn resample_step_ms(&self) -> i64 {
        self.resampler.step_ms()
    }

    pub fn smoothing_step_ms(&self) -> i64 {
        self.resampler.step_ms() * self.averager.block_size() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn parabolic_flight(apogee_s: f64) -> Vec<Sample> {
        (0..300)
            .map(|i| {
                let t = i as f64 * 0.05;
                Sample::new(t, 850.0 + 1.2 * (t - apogee_s).powi(2))
            })
            .collect()
    }

    #[test]
    fn test_stage_lengths() {
        let mut config = AnalysisConfig::default();
        config.noise.range_mbar = 0.0;
        let analyzer = FlightAnalyzer::new(&config).unwrap();

        let report = analyzer.analyze(&parabolic_flight(9.0)).unwrap();

        assert_eq!(report.resampled.len(), 1308);
        assert_eq!(report.smoothed.len(), 1308usize.div_ceil(8));
        assert_eq!(report.derivative.len(), report.smoothed.len() - 1);
        assert_eq!(analyzer.smoothing_step_ms(), 104);
    }

    #[test]
    fn test_recovers_parabolic_apogee() {
        let mut config = AnalysisConfig::default();
        config.noise.range_mbar = 0.0;
        let report = FlightAnalyzer::new(&config)
            .unwrap()
            .analyze(&parabolic_flight(9.0))
            .unwrap();

        let events = &report.events;
        assert!((events.apogee_time_ms - 9000).abs() <= 13, "apogee {}", events.apogee_time_ms);
        assert!((events.smoothed_apogee_time_ms - 9000).abs() <= 104);
        assert!(report.events.descent_trigger_time_ms < report.events.apogee_time_ms);
        assert_eq!(report.events.reference_markers.len(), 3);
        assert!((report.apogee_pressure_mbar().unwrap() - 850.0).abs() < 0.1);
    }

    #[test]
    fn test_noise_keeps_apogee_close() {
        let config = AnalysisConfig::default();
        let report = FlightAnalyzer::new(&config)
            .unwrap()
            .analyze(&parabolic_flight(9.0))
            .unwrap();
        // ±0.05 mbar of jitter hides a 1.2 mbar/s² parabola within ~290 ms of its vertex
        assert!((report.events.apogee_time_ms - 9000).abs() <= 312);
        assert!((report.events.smoothed_apogee_time_ms - 9000).abs() <= 312);
    }

    #[test]
    fn test_propagates_stage_errors() {
        let analyzer = FlightAnalyzer::new(&AnalysisConfig::default()).unwrap();
        assert!(matches!(
            analyzer.analyze(&parabolic_flight(9.0)[..2]),
            Err(AnalysisError::InsufficientData { needed: 3, .. })
        ));

        let mut config = AnalysisConfig::default();
        config.smoothing.block_size = 0;
        assert!(matches!(
            FlightAnalyzer::new(&config),
            Err(AnalysisError::InvalidBlockSize(0))
        ));
    }

    #[test]
    fn test_rising_only_flight_has_no_trigger() {
        // Pressure still falling steeply at the end of the window
        let samples: Vec<Sample> = (0..200)
            .map(|i| {
                let t = i as f64 * 0.1;
                Sample::new(t, 1013.0 - 20.0 * t)
            })
            .collect();
        let mut config = AnalysisConfig::default();
        config.noise.range_mbar = 0.0;

        let result = FlightAnalyzer::new(&config).unwrap().analyze(&samples);
        assert!(matches!(result, Err(AnalysisError::TriggerNotFound { .. })));
    }
}
