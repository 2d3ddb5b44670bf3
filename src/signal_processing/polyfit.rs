use log::{debug, warn};
use serde::Serialize;

use crate::constants::SINGULAR_PIVOT_EPSILON;
use crate::error::{AnalysisError, Result};
use crate::types::{Sample, validate_samples};

/// Degree of the fitted pressure model
pub const FIT_DEGREE: usize = 2;

/// Fewest samples that determine a quadratic
pub const MIN_FIT_SAMPLES: usize = FIT_DEGREE + 1;

/// Pressure model `p(t) = a·t² + b·t + c` with `t` in milliseconds.
///
/// Atmospheric pressure over the coast phase is close to quadratic in time,
/// so a single parabola through the whole recording is a good denoised
/// stand-in for the raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadraticModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticModel {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Pressure in mbar at `t_ms`.
    pub fn evaluate(&self, t_ms: f64) -> f64 {
        (self.a * t_ms + self.b) * t_ms + self.c
    }

    /// Rate of change in mbar/ms at `t_ms`.
    pub fn slope(&self, t_ms: f64) -> f64 {
        2.0 * self.a * t_ms + self.b
    }

    /// Time of the analytic extremum, `None` for a straight line.
    ///
    /// With `a > 0` this is the pressure minimum, i.e. the model's apogee.
    pub fn vertex_time_ms(&self) -> Option<f64> {
        if self.a == 0.0 {
            None
        } else {
            Some(-self.b / (2.0 * self.a))
        }
    }

    pub fn sum_squared_residuals(&self, samples: &[Sample]) -> f64 {
        samples
            .iter()
            .map(|s| {
                let r = s.pressure_mbar - self.evaluate(s.time_ms());
                r * r
            })
            .sum()
    }
}

/// Least-squares quadratic through the raw samples.
///
/// Solves the normal equations on a centered and scaled time axis, then
/// expands the result back to coefficients of raw milliseconds. Recording
/// timestamps reach 10⁴ ms, where the unscaled `Σt⁴` terms would swamp the
/// system.
///
/// # Errors
/// - `InsufficientData` for fewer than three samples
/// - `NonMonotonicInput` / `NonFiniteInput` from input validation
pub fn fit_quadratic(samples: &[Sample]) -> Result<QuadraticModel> {
    if samples.len() < MIN_FIT_SAMPLES {
        return Err(AnalysisError::InsufficientData {
            needed: MIN_FIT_SAMPLES,
            available: samples.len(),
        });
    }
    validate_samples(samples)?;

    let n = samples.len() as f64;
    let center = samples.iter().map(Sample::time_ms).sum::<f64>() / n;
    let scale = samples
        .iter()
        .map(|s| (s.time_ms() - center).abs())
        .fold(0.0, f64::max);

    // power_sums[k] = Σ u^k, moments[k] = Σ u^k·p
    let mut power_sums = [0.0f64; 2 * FIT_DEGREE + 1];
    let mut moments = [0.0f64; FIT_DEGREE + 1];
    for sample in samples {
        let u = (sample.time_ms() - center) / scale;
        let mut u_k = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += u_k;
            if k <= FIT_DEGREE {
                moments[k] += u_k * sample.pressure_mbar;
            }
            u_k *= u;
        }
    }

    let mut normal = [[0.0f64; FIT_DEGREE + 1]; FIT_DEGREE + 1];
    for (i, row) in normal.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = power_sums[i + j];
        }
    }

    let [gamma, beta, alpha] =
        solve_3x3(normal, moments).ok_or(AnalysisError::InsufficientData {
            needed: MIN_FIT_SAMPLES,
            available: samples.len(),
        })?;

    // p = α·u² + β·u + γ with u = (t - center) / scale
    let a = alpha / (scale * scale);
    let b = beta / scale - 2.0 * a * center;
    let c = a * center * center - beta * center / scale + gamma;
    let model = QuadraticModel::new(a, b, c);

    debug!(
        "Fitted {} samples: a={:.6e} b={:.6e} c={:.4}",
        samples.len(),
        a,
        b,
        c
    );
    if a <= 0.0 {
        warn!(
            "Fitted pressure curve has no minimum (a={:.3e}); apogee will sit on a window edge",
            a
        );
    }

    Ok(model)
}

/// Gaussian elimination with partial pivoting.
fn solve_3x3(mut m: [[f64; 3]; 3], mut r: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < SINGULAR_PIVOT_EPSILON {
            return None;
        }
        m.swap(col, pivot);
        r.swap(col, pivot);

        for row in col + 1..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..3 {
                m[row][k] -= factor * m[col][k];
            }
            r[row] -= factor * r[col];
        }
    }

    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| m[row][k] * x[k]).sum();
        x[row] = (r[row] - tail) / m[row][row];
    }
    Some(x)
}
