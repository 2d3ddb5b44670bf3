//! Value types passed between pipeline stages.
//!
//! Every series is an owned vector produced by one stage and handed to the
//! next; nothing here is shared between runs.

use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// A raw barometer reading as delivered by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Time since power-on in seconds
    pub time_s: f64,
    /// Static pressure in millibar
    pub pressure_mbar: f64,
}

impl Sample {
    pub fn new(time_s: f64, pressure_mbar: f64) -> Self {
        Self {
            time_s,
            pressure_mbar,
        }
    }

    /// Timestamp in milliseconds, the unit every later stage works in.
    pub fn time_ms(&self) -> f64 {
        self.time_s * 1000.0
    }
}

/// Check that `samples` are finite and strictly increasing in time.
pub fn validate_samples(samples: &[Sample]) -> Result<()> {
    for (index, sample) in samples.iter().enumerate() {
        if !sample.time_s.is_finite() || !sample.pressure_mbar.is_finite() {
            return Err(AnalysisError::NonFiniteInput { index });
        }
    }

    for (index, pair) in samples.windows(2).enumerate() {
        if pair[1].time_s <= pair[0].time_s {
            return Err(AnalysisError::NonMonotonicInput {
                index: index + 1,
                previous_s: pair[0].time_s,
                current_s: pair[1].time_s,
            });
        }
    }

    Ok(())
}

/// One point of a uniformly spaced pressure series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time_ms: i64,
    pub pressure_mbar: f64,
}

impl SeriesPoint {
    pub fn new(time_ms: i64, pressure_mbar: f64) -> Self {
        Self {
            time_ms,
            pressure_mbar,
        }
    }
}

/// Model evaluated on the integer-millisecond resample grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResampledSeries(pub Vec<SeriesPoint>);

/// Block-averaged series, one point per smoothing block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SmoothedSeries(pub Vec<SeriesPoint>);

macro_rules! series_accessors {
    ($name:ident, $point:ty) => {
        impl $name {
            pub fn points(&self) -> &[$point] {
                &self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn times_ms(&self) -> impl Iterator<Item = i64> + '_ {
                self.0.iter().map(|p| p.time_ms)
            }
        }
    };
}

series_accessors!(ResampledSeries, SeriesPoint);
series_accessors!(SmoothedSeries, SeriesPoint);
series_accessors!(DerivativeSeries, DerivativePoint);

/// Forward difference of a smoothed series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivativePoint {
    /// Time of the earlier of the two smoothed points
    pub time_ms: i64,
    pub rate_mbar_per_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DerivativeSeries(pub Vec<DerivativePoint>);

/// Smoothed timestamp closest to `apogee_time_ms - offset_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceMarker {
    pub offset_ms: i64,
    pub time_ms: i64,
}

/// Timing events recovered from one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightEvents {
    pub descent_trigger_time_ms: i64,
    /// Minimum-pressure time on the resampled grid; markers and the trigger
    /// lead are measured from it
    pub apogee_time_ms: i64,
    /// Minimum-pressure time of the block-averaged series
    pub smoothed_apogee_time_ms: i64,
    pub reference_markers: Vec<ReferenceMarker>,
}

impl FlightEvents {
    /// How long before apogee the trigger fired. Negative when it fired late.
    pub fn trigger_lead_ms(&self) -> i64 {
        self.apogee_time_ms - self.descent_trigger_time_ms
    }

    pub fn marker(&self, offset_ms: i64) -> Option<&ReferenceMarker> {
        self.reference_markers
            .iter()
            .find(|m| m.offset_ms == offset_ms)
    }

    /// Whether the trigger fired at or after the given marker.
    pub fn trigger_after_marker(&self, offset_ms: i64) -> Option<bool> {
        self.marker(offset_ms)
            .map(|m| self.descent_trigger_time_ms >= m.time_ms)
    }
}
