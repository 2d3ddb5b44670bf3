use serde::{Deserialize, Serialize};

use crate::constants::GRAVITY;
use crate::error::{AnalysisError, Result};

/// Altitude over time of a simulated flight, starting on the ground at t = 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlightProfile {
    /// Linear climb to the peak, then linear fall back to the ground
    Triangular {
        peak_altitude_m: f64,
        ascent_s: f64,
        descent_s: f64,
    },
    /// Constant-acceleration boost, gravity coast to apogee, then a
    /// constant-rate descent under parachute
    Ballistic {
        burnout_velocity_mps: f64,
        burnout_s: f64,
        descent_rate_mps: f64,
    },
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self::Triangular {
            peak_altitude_m: 3000.0,
            ascent_s: 10.0,
            descent_s: 10.0,
        }
    }
}

impl FlightProfile {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(AnalysisError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };

        match *self {
            Self::Triangular {
                peak_altitude_m,
                ascent_s,
                descent_s,
            } => {
                positive("peak_altitude_m", peak_altitude_m)?;
                positive("ascent_s", ascent_s)?;
                positive("descent_s", descent_s)
            }
            Self::Ballistic {
                burnout_velocity_mps,
                burnout_s,
                descent_rate_mps,
            } => {
                positive("burnout_velocity_mps", burnout_velocity_mps)?;
                positive("burnout_s", burnout_s)?;
                positive("descent_rate_mps", descent_rate_mps)
            }
        }
    }

    /// Altitude in metres at `t` seconds, clamped to the ground.
    pub fn altitude_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }

        let altitude = match *self {
            Self::Triangular {
                peak_altitude_m,
                ascent_s,
                descent_s,
            } => {
                if t <= ascent_s {
                    peak_altitude_m * t / ascent_s
                } else {
                    peak_altitude_m * (1.0 - (t - ascent_s) / descent_s)
                }
            }
            Self::Ballistic {
                burnout_velocity_mps: v,
                burnout_s,
                descent_rate_mps,
            } => {
                let burnout_altitude = 0.5 * v * burnout_s;
                let apogee_s = self.apogee_time_s();
                if t <= burnout_s {
                    0.5 * (v / burnout_s) * t * t
                } else if t <= apogee_s {
                    let dt = t - burnout_s;
                    burnout_altitude + v * dt - 0.5 * GRAVITY * dt * dt
                } else {
                    self.peak_altitude_m() - descent_rate_mps * (t - apogee_s)
                }
            }
        };

        altitude.max(0.0)
    }

    pub fn apogee_time_s(&self) -> f64 {
        match *self {
            Self::Triangular { ascent_s, .. } => ascent_s,
            Self::Ballistic {
                burnout_velocity_mps,
                burnout_s,
                ..
            } => burnout_s + burnout_velocity_mps / GRAVITY,
        }
    }

    pub fn peak_altitude_m(&self) -> f64 {
        match *self {
            Self::Triangular {
                peak_altitude_m, ..
            } => peak_altitude_m,
            Self::Ballistic {
                burnout_velocity_mps: v,
                burnout_s,
                ..
            } => 0.5 * v * burnout_s + v * v / (2.0 * GRAVITY),
        }
    }

    /// Time until landing
    pub fn duration_s(&self) -> f64 {
        match *self {
            Self::Triangular {
                ascent_s,
                descent_s,
                ..
            } => ascent_s + descent_s,
            Self::Ballistic {
                descent_rate_mps, ..
            } => self.apogee_time_s() + self.peak_altitude_m() / descent_rate_mps,
        }
    }
}
