use crate::error::{AnalysisError, Result};
use crate::types::{DerivativePoint, DerivativeSeries, SmoothedSeries};

/// Forward difference of a smoothed series in mbar/ms.
///
/// Entry `i` is `(p[i+1] - p[i]) / (t[i+1] - t[i])`, stamped with `t[i]`, so
/// the result is one point shorter than the input.
///
/// # Errors
/// `InsufficientData` for fewer than two points, `NonMonotonicInput` when a
/// timestamp does not increase
pub fn forward_difference(series: &SmoothedSeries) -> Result<DerivativeSeries> {
    let points = series.points();
    if points.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            available: points.len(),
        });
    }

    points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (t0, t1) = (pair[0].time_ms, pair[1].time_ms);
            if t1 <= t0 {
                return Err(AnalysisError::NonMonotonicInput {
                    index: i + 1,
                    previous_s: t0 as f64 / 1000.0,
                    current_s: t1 as f64 / 1000.0,
                });
            }
            Ok(DerivativePoint {
                time_ms: t0,
                rate_mbar_per_ms: (pair[1].pressure_mbar - pair[0].pressure_mbar)
                    / (t1 - t0) as f64,
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(DerivativeSeries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeriesPoint;

    #[test]
    fn test_forward_difference() {
        let series = SmoothedSeries(vec![
            SeriesPoint::new(0, 1000.0),
            SeriesPoint::new(100, 999.0),
            SeriesPoint::new(200, 998.5),
            SeriesPoint::new(250, 998.5),
        ]);

        let derivative = forward_difference(&series).unwrap();

        assert_eq!(derivative.len(), series.len() - 1);
        assert_eq!(
            derivative.points(),
            &[
                DerivativePoint {
                    time_ms: 0,
                    rate_mbar_per_ms: -0.01,
                },
                DerivativePoint {
                    time_ms: 100,
                    rate_mbar_per_ms: -0.005,
                },
                DerivativePoint {
                    time_ms: 200,
                    rate_mbar_per_ms: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_matches_formula_for_every_index() {
        let series = SmoothedSeries(
            (0..40)
                .map(|i| {
                    let t = i * 104;
                    SeriesPoint::new(t, 900.0 + 1e-6 * ((t - 2000) as f64).powi(2))
                })
                .collect(),
        );
        let derivative = forward_difference(&series).unwrap();
        let p = series.points();

        for (i, d) in derivative.points().iter().enumerate() {
            let expected = (p[i + 1].pressure_mbar - p[i].pressure_mbar)
                / (p[i + 1].time_ms - p[i].time_ms) as f64;
            assert_eq!(d.rate_mbar_per_ms, expected);
            assert_eq!(d.time_ms, p[i].time_ms);
        }
    }

    #[test]
    fn test_insufficient_data() {
        let single = SmoothedSeries(vec![SeriesPoint::new(0, 1000.0)]);
        assert_eq!(
            forward_difference(&single),
            Err(AnalysisError::InsufficientData {
                needed: 2,
                available: 1,
            })
        );
    }

    #[test]
    fn test_repeated_time_is_rejected() {
        let series = SmoothedSeries(vec![
            SeriesPoint::new(0, 1000.0),
            SeriesPoint::new(104, 999.0),
            SeriesPoint::new(104, 998.0),
        ]);
        assert_eq!(
            forward_difference(&series),
            Err(AnalysisError::NonMonotonicInput {
                index: 2,
                previous_s: 0.104,
                current_s: 0.104,
            })
        );

        let backwards =
            SmoothedSeries(vec![SeriesPoint::new(208, 1000.0), SeriesPoint::new(0, 999.0)]);
        assert!(matches!(
            forward_difference(&backwards),
            Err(AnalysisError::NonMonotonicInput { index: 1, .. })
        ));
    }
}
