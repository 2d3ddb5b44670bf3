use log::debug;

use crate::error::{AnalysisError, Result};
use crate::types::{ResampledSeries, SeriesPoint, SmoothedSeries};

/// Non-overlapping block mean
///
/// Collapses every `block_size` consecutive points into one, stamped with the
/// time of the block's first point. This trades time resolution for noise
/// rejection ahead of differentiation; at 75 Hz and a block of 8 the output
/// rate roughly matches the flight barometer's effective update rate.
///
/// Unlike a moving average, no state carries over between blocks, and the
/// final block may hold fewer points than the rest.
#[derive(Debug, Clone)]
pub struct BlockAverager {
    block_size: usize,
}

impl BlockAverager {
    /// Create a block averager
    ///
    /// # Errors
    /// `InvalidBlockSize` if `block_size` is 0
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size < 1 {
            return Err(AnalysisError::InvalidBlockSize(block_size));
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn smooth(&self, series: &ResampledSeries) -> SmoothedSeries {
        let points: Vec<SeriesPoint> = series
            .points()
            .chunks(self.block_size)
            .map(|block| {
                let sum: f64 = block.iter().map(|p| p.pressure_mbar).sum();
                SeriesPoint::new(block[0].time_ms, sum / block.len() as f64)
            })
            .collect();

        debug!(
            "Smoothed {} points into {} blocks of {}",
            series.len(),
            points.len(),
            self.block_size
        );

        SmoothedSeries(points)
    }
}
