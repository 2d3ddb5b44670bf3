//! Configuration for the barometer analysis pipeline.
//!
//! Every section has a `Default` matching the settings the recovery
//! controller was tuned with. A TOML file may override any subset:
//!
//! ```toml
//! [resample]
//! end_ms = 20000
//! rate = "75hz"
//!
//! [noise]
//! range_mbar = 0.0
//!
//! [detector]
//! trigger_threshold_mbar_per_ms = -0.002
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::constants::{INTERVAL_ROUNDING_EPSILON, MAX_RESAMPLE_WINDOW_MS};
use crate::error::{AnalysisError, Result};

/// Resample rate specification
///
/// Can be specified as either a frequency in Hz or an interval in milliseconds.
/// The grid step is always the interval truncated to whole milliseconds.
///
/// # Parsing formats
/// - `75` - frequency in Hz (no suffix)
/// - `75hz` or `75Hz` - frequency in Hz (explicit)
/// - `13ms` - interval in milliseconds
///
/// # Example
/// ```
/// use baroapogee::config::SampleRate;
///
/// let rate: SampleRate = "75hz".parse().unwrap();
/// assert_eq!(rate.interval_ms(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawSampleRate")]
pub struct SampleRate(f64);

impl SampleRate {
    /// Create from frequency in Hz
    pub fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    /// Create from interval in milliseconds
    pub fn from_interval_ms(ms: f64) -> Self {
        Self(1000.0 / ms)
    }

    /// Get frequency in Hz
    pub fn as_hz(&self) -> f64 {
        self.0
    }

    /// Grid step in whole milliseconds (`1000 / hz`, truncated).
    ///
    /// Returns 0 for rates above 1 kHz and for invalid rates; the resampler
    /// rejects both.
    pub fn interval_ms(&self) -> i64 {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return 0;
        }
        (1000.0 / self.0 + INTERVAL_ROUNDING_EPSILON).trunc() as i64
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::from_hz(75.0)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}hz", self.0)
    }
}

impl FromStr for SampleRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid interval: {}", s))?;
            if !ms.is_finite() || ms <= 0.0 {
                return Err("interval must be positive".to_string());
            }
            return Ok(Self::from_interval_ms(ms));
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid rate: {}", s))?;
        if !hz.is_finite() || hz <= 0.0 {
            return Err("rate must be positive".to_string());
        }
        Ok(Self::from_hz(hz))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSampleRate {
    Hz(f64),
    Text(String),
}

impl TryFrom<RawSampleRate> for SampleRate {
    type Error = String;

    fn try_from(raw: RawSampleRate) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawSampleRate::Hz(hz) if hz > 0.0 && hz.is_finite() => Ok(Self::from_hz(hz)),
            RawSampleRate::Hz(hz) => Err(format!("rate must be positive, got {}", hz)),
            RawSampleRate::Text(text) => text.parse(),
        }
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use baroapogee::config::AnalysisConfig;
///
/// let mut config = AnalysisConfig::default();
/// config.noise.range_mbar = 0.0;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Curve fit applied to the raw samples
    pub fit: FitConfig,
    /// Uniform resampling grid
    pub resample: ResampleConfig,
    /// Synthetic jitter added while resampling
    pub noise: NoiseConfig,
    /// Block averaging before differentiation
    pub smoothing: SmoothingConfig,
    /// Trigger threshold and reference markers
    pub detector: DetectorConfig,
}

/// Model fit configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    /// Polynomial degree. Only 2 is supported; the field exists so the value
    /// shows up in dumped configurations.
    pub degree: usize,
}

/// Resample window and rate
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResampleConfig {
    /// First grid time in milliseconds (inclusive)
    pub start_ms: i64,
    /// End of the window in milliseconds (exclusive)
    pub end_ms: i64,
    /// Grid rate; the step is the truncated millisecond interval
    pub rate: SampleRate,
}

/// Uniform noise injected into resampled values
///
/// Emulates sensor quantization when validating against simulated data.
/// Set `range_mbar` to 0 for real recordings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseConfig {
    /// Half-width of the symmetric noise range in mbar
    pub range_mbar: f64,
    /// Seed for the noise generator
    pub seed: u64,
}

/// Smoothing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Samples per averaging block
    pub block_size: usize,
}

/// Event detector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Derivative value (mbar/ms) that must be exceeded to fire the trigger
    pub trigger_threshold_mbar_per_ms: f64,
    /// Offsets before apogee at which reference markers are placed
    pub reference_offsets_ms: Vec<i64>,
}

impl NoiseConfig {
    pub fn is_enabled(&self) -> bool {
        self.range_mbar > 0.0
    }

    pub fn disabled() -> Self {
        Self {
            range_mbar: 0.0,
            ..Self::default()
        }
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self { degree: 2 }
    }
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            start_ms: 0,
            end_ms: 17_000,
            rate: SampleRate::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            range_mbar: 0.05,
            seed: 0,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { block_size: 8 }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            trigger_threshold_mbar_per_ms: -0.0015,
            reference_offsets_ms: vec![1500, 2000, 2500],
        }
    }
}

impl ResampleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.end_ms <= self.start_ms {
            return Err(AnalysisError::InvalidWindow(format!(
                "end {}ms is not after start {}ms",
                self.end_ms, self.start_ms
            )));
        }
        match self.end_ms.checked_sub(self.start_ms) {
            Some(span) if span <= MAX_RESAMPLE_WINDOW_MS => {}
            _ => {
                return Err(AnalysisError::InvalidWindow(format!(
                    "window {}ms..{}ms is longer than {}ms",
                    self.start_ms, self.end_ms, MAX_RESAMPLE_WINDOW_MS
                )));
            }
        }
        if self.rate.interval_ms() <= 0 {
            return Err(AnalysisError::InvalidWindow(format!(
                "rate {} gives a sub-millisecond interval",
                self.rate
            )));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Check every section, reporting the same error kind the stage would.
    pub fn validate(&self) -> Result<()> {
        if self.fit.degree != 2 {
            return Err(AnalysisError::Config(format!(
                "fit degree is fixed at 2, got {}",
                self.fit.degree
            )));
        }

        self.resample.validate()?;

        if !self.noise.range_mbar.is_finite() || self.noise.range_mbar < 0.0 {
            return Err(AnalysisError::Config(format!(
                "noise range must be a non-negative number, got {}",
                self.noise.range_mbar
            )));
        }

        if self.smoothing.block_size < 1 {
            return Err(AnalysisError::InvalidBlockSize(self.smoothing.block_size));
        }

        if !self.detector.trigger_threshold_mbar_per_ms.is_finite() {
            return Err(AnalysisError::Config(
                "trigger threshold must be finite".to_string(),
            ));
        }

        Ok(())
    }
}
