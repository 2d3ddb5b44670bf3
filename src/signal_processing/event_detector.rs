use log::{debug, info};

use super::derivative::forward_difference;
use crate::config::DetectorConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{
    DerivativeSeries, FlightEvents, ReferenceMarker, ResampledSeries, SeriesPoint, SmoothedSeries,
};

/// Derivative-threshold event detector
///
/// Locates apogee (pressure minimum), the descent trigger (the sample before
/// the pressure derivative first rises above the threshold) and reference
/// markers at fixed offsets before apogee.
///
/// The detector holds only its fixed parameters and differentiates the
/// smoothed series itself; each call is a pure function of the series passed in.
#[derive(Debug, Clone)]
pub struct EventDetector {
    threshold: f64,
    reference_offsets_ms: Vec<i64>,
}

impl EventDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        if !config.trigger_threshold_mbar_per_ms.is_finite() {
            return Err(AnalysisError::Config(
                "trigger threshold must be finite".to_string(),
            ));
        }
        Ok(Self {
            threshold: config.trigger_threshold_mbar_per_ms,
            reference_offsets_ms: config.reference_offsets_ms.clone(),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Detect events from a smoothed series alone.
    ///
    /// Apogee and the marker anchor are the smoothed minimum.
    pub fn detect(&self, smoothed: &SmoothedSeries) -> Result<FlightEvents> {
        let apogee_time_ms = smoothed_apogee(smoothed)?;
        self.detect_anchored(smoothed, apogee_time_ms)
    }

    /// Detect events with apogee taken from the resampled grid.
    ///
    /// The resampled minimum anchors the reference markers and the trigger
    /// lead; the trigger itself still comes from the smoothed derivative.
    pub fn detect_with_resampled(
        &self,
        resampled: &ResampledSeries,
        smoothed: &SmoothedSeries,
    ) -> Result<FlightEvents> {
        let apogee_index = find_apogee(resampled.points()).ok_or(
            AnalysisError::InsufficientData {
                needed: 1,
                available: 0,
            },
        )?;
        self.detect_anchored(smoothed, resampled.points()[apogee_index].time_ms)
    }

    fn detect_anchored(
        &self,
        smoothed: &SmoothedSeries,
        apogee_time_ms: i64,
    ) -> Result<FlightEvents> {
        let derivative = forward_difference(smoothed)?;
        let points = smoothed.points();
        let smoothed_apogee_time_ms = smoothed_apogee(smoothed)?;

        let crossing = find_threshold_crossing(&derivative, self.threshold).ok_or(
            AnalysisError::TriggerNotFound {
                threshold: self.threshold,
            },
        )?;
        // The sample before the crossing; crossings at 0 or 1 clamp to the first sample
        let trigger_index = crossing.saturating_sub(1);
        let descent_trigger_time_ms = points[trigger_index].time_ms;
        debug!(
            "Derivative {:.5} mbar/ms at {}ms crossed {}",
            derivative.points()[crossing].rate_mbar_per_ms,
            derivative.points()[crossing].time_ms,
            self.threshold
        );

        let reference_markers = self
            .reference_offsets_ms
            .iter()
            .filter_map(|&offset_ms| {
                nearest_time(points, apogee_time_ms - offset_ms).map(|time_ms| ReferenceMarker {
                    offset_ms,
                    time_ms,
                })
            })
            .collect();

        let events = FlightEvents {
            descent_trigger_time_ms,
            apogee_time_ms,
            smoothed_apogee_time_ms,
            reference_markers,
        };

        info!(
            "Apogee at {}ms (smoothed {}ms), descent trigger at {}ms (lead {}ms)",
            events.apogee_time_ms,
            events.smoothed_apogee_time_ms,
            events.descent_trigger_time_ms,
            events.trigger_lead_ms()
        );

        Ok(events)
    }
}

fn smoothed_apogee(smoothed: &SmoothedSeries) -> Result<i64> {
    let points = smoothed.points();
    if points.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            available: points.len(),
        });
    }
    find_apogee(points)
        .map(|i| points[i].time_ms)
        .ok_or(AnalysisError::InsufficientData {
            needed: 2,
            available: points.len(),
        })
}

/// Index of the minimum pressure; the earliest one on ties.
pub fn find_apogee(points: &[SeriesPoint]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        match best {
            Some((_, min)) if p.pressure_mbar >= min => {}
            _ => best = Some((i, p.pressure_mbar)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first derivative value strictly above `threshold`.
pub fn find_threshold_crossing(derivative: &DerivativeSeries, threshold: f64) -> Option<usize> {
    derivative
        .points()
        .iter()
        .position(|d| d.rate_mbar_per_ms > threshold)
}

/// Series time closest to `target_ms`; the earlier one on ties.
pub fn nearest_time(points: &[SeriesPoint], target_ms: i64) -> Option<i64> {
    let mut best: Option<(i64, u64)> = None;
    for p in points {
        let distance = p.time_ms.abs_diff(target_ms);
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((p.time_ms, distance)),
        }
    }
    best.map(|(t, _)| t)
}
