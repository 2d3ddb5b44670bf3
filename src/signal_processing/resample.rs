use log::debug;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::polyfit::QuadraticModel;
use crate::config::{NoiseConfig, ResampleConfig};
use crate::error::Result;
use crate::types::{ResampledSeries, SeriesPoint};

/// Evaluates a pressure model on a fixed integer-millisecond grid
///
/// Grid times run from `start_ms` (inclusive) to `end_ms` (exclusive) in steps
/// of the rate's truncated millisecond interval, so a 75 Hz rate steps by
/// 13 ms rather than 13.33 ms. Optional uniform jitter emulates the
/// quantization of the flight barometer when replaying simulated data.
///
/// Jitter is drawn from a generator seeded with the configured seed at the
/// start of every call, so two calls with the same model return identical
/// series.
#[derive(Debug, Clone)]
pub struct Resampler {
    start_ms: i64,
    end_ms: i64,
    step_ms: i64,
    noise_range_mbar: f64,
    seed: u64,
}

impl Resampler {
    /// Create a resampler
    ///
    /// # Errors
    /// `InvalidWindow` if the window is empty or the interval truncates to 0 ms
    pub fn new(window: &ResampleConfig, noise: &NoiseConfig) -> Result<Self> {
        window.validate()?;

        Ok(Self {
            start_ms: window.start_ms,
            end_ms: window.end_ms,
            step_ms: window.rate.interval_ms(),
            noise_range_mbar: if noise.is_enabled() {
                noise.range_mbar
            } else {
                0.0
            },
            seed: noise.seed,
        })
    }

    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    pub fn grid_times(&self) -> impl Iterator<Item = i64> {
        (self.start_ms..self.end_ms).step_by(self.step_ms as usize)
    }

    /// Number of grid points, `ceil((end - start) / step)`.
    pub fn len(&self) -> usize {
        let span = self.end_ms.saturating_sub(self.start_ms).max(0) as u64;
        span.div_ceil(self.step_ms as u64) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resample(&self, model: &QuadraticModel) -> ResampledSeries {
        let mut points = Vec::with_capacity(self.len());

        if self.noise_range_mbar > 0.0 {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            let range = self.noise_range_mbar;
            for t in self.grid_times() {
                let jitter: f64 = rng.random_range(-range..=range);
                points.push(SeriesPoint::new(t, model.evaluate(t as f64) + jitter));
            }
        } else {
            points.extend(
                self.grid_times()
                    .map(|t| SeriesPoint::new(t, model.evaluate(t as f64))),
            );
        }

        debug!(
            "Resampled {}..{}ms every {}ms: {} points (noise ±{} mbar)",
            self.start_ms,
            self.end_ms,
            self.step_ms,
            points.len(),
            self.noise_range_mbar
        );

        ResampledSeries(points)
    }
}
