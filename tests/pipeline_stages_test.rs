mod flight_profiles;

use approx::assert_relative_eq;
use baroapogee::config::{DetectorConfig, NoiseConfig, ResampleConfig, SampleRate};
use baroapogee::signal_processing::{
    BlockAverager, EventDetector, QuadraticModel, Resampler, find_apogee, fit_quadratic,
    forward_difference,
};
use baroapogee::types::{SeriesPoint, SmoothedSeries};
use flight_profiles::{samples, triangular};

fn window(end_ms: i64, rate: &str) -> ResampleConfig {
    ResampleConfig {
        start_ms: 0,
        end_ms,
        rate: rate.parse::<SampleRate>().unwrap(),
    }
}

#[test]
fn test_fit_beats_perturbed_models_on_simulated_flight() {
    let flight = samples(&triangular());
    let model = fit_quadratic(&flight).unwrap();
    let best = model.sum_squared_residuals(&flight);

    for (da, db, dc) in [
        (1e-9, 0.0, 0.0),
        (-1e-9, 0.0, 0.0),
        (0.0, 1e-5, 0.0),
        (0.0, -1e-5, 0.0),
        (0.0, 0.0, 0.01),
        (0.0, 0.0, -0.01),
    ] {
        let other = QuadraticModel::new(model.a + da, model.b + db, model.c + dc);
        assert!(other.sum_squared_residuals(&flight) >= best);
    }
}

#[test]
fn test_resample_grid_for_several_rates() {
    let model = QuadraticModel::new(1e-6, -0.02, 1013.0);

    for (rate, step, len) in [("75hz", 13, 1308), ("50", 20, 850), ("10ms", 10, 1700)] {
        let resampler = Resampler::new(&window(17_000, rate), &NoiseConfig::disabled()).unwrap();
        let series = resampler.resample(&model);

        assert_eq!(resampler.step_ms(), step, "{}", rate);
        assert_eq!(series.len(), len, "{}", rate);
        assert!(series.points().windows(2).all(|w| w[1].time_ms - w[0].time_ms == step));
        for p in series.points() {
            assert_relative_eq!(p.pressure_mbar, model.evaluate(p.time_ms as f64));
        }
    }
}

#[test]
fn test_smoothed_values_are_block_means() {
    let model = QuadraticModel::new(1e-6, -0.02, 1013.0);
    let noise = NoiseConfig {
        range_mbar: 0.05,
        seed: 11,
    };
    let resampled = Resampler::new(&window(17_000, "75"), &noise)
        .unwrap()
        .resample(&model);
    let smoothed = BlockAverager::new(8).unwrap().smooth(&resampled);

    assert_eq!(smoothed.len(), resampled.len().div_ceil(8));
    for (block, point) in resampled.points().chunks(8).zip(smoothed.points()) {
        let mean = block.iter().map(|p| p.pressure_mbar).sum::<f64>() / block.len() as f64;
        assert_relative_eq!(point.pressure_mbar, mean);
        assert_eq!(point.time_ms, block[0].time_ms);
    }
}

#[test]
fn test_v_curve_events_within_one_interval() {
    // Sharp V with its minimum between grid points
    let step = 104;
    let true_min = 6_050.0;
    let series = SmoothedSeries(
        (0..120)
            .map(|i| {
                let t = i * step;
                SeriesPoint::new(t, 900.0 + 0.004 * (t as f64 - true_min).abs())
            })
            .collect(),
    );

    let detector = EventDetector::new(&DetectorConfig {
        trigger_threshold_mbar_per_ms: -0.001,
        ..DetectorConfig::default()
    })
    .unwrap();
    let events = detector.detect(&series).unwrap();

    assert!((events.apogee_time_ms as f64 - true_min).abs() <= step as f64);
    // The derivative jumps from -0.004 to above -0.001 at the vertex
    assert!((events.descent_trigger_time_ms as f64 - true_min).abs() <= 2.0 * step as f64);
    assert!(events.descent_trigger_time_ms < events.apogee_time_ms);
}

#[test]
fn test_derivative_sign_change_brackets_apogee() {
    let flight = samples(&triangular());
    let model = fit_quadratic(&flight).unwrap();
    let resampled = Resampler::new(&window(17_000, "75"), &NoiseConfig::disabled())
        .unwrap()
        .resample(&model);
    let smoothed = BlockAverager::new(8).unwrap().smooth(&resampled);
    let derivative = forward_difference(&smoothed).unwrap();

    let apogee = find_apogee(smoothed.points()).unwrap();
    let rates = derivative.points();
    assert!(rates[apogee - 1].rate_mbar_per_ms < 0.0);
    assert!(rates[apogee].rate_mbar_per_ms >= 0.0);
}

#[test]
fn test_markers_follow_grid_apogee_off_block_boundary() {
    // Vertex on the 13 ms grid, 91 ms into its smoothing block
    let vertex = 10_075.0;
    let a = 1e-6;
    let model = QuadraticModel::new(a, -2.0 * a * vertex, 900.0);
    let resampled = Resampler::new(&window(17_000, "75"), &NoiseConfig::disabled())
        .unwrap()
        .resample(&model);
    let smoothed = BlockAverager::new(8).unwrap().smooth(&resampled);

    let events = EventDetector::new(&DetectorConfig::default())
        .unwrap()
        .detect_with_resampled(&resampled, &smoothed)
        .unwrap();

    assert_eq!(events.apogee_time_ms, 10_075);
    assert_eq!(events.smoothed_apogee_time_ms, 9_984);
    let markers: Vec<i64> = events.reference_markers.iter().map(|m| m.time_ms).collect();
    assert_eq!(markers, vec![8528, 8112, 7592]);
    assert_eq!(events.descent_trigger_time_ms, 9_152);
    assert_eq!(events.trigger_lead_ms(), 10_075 - 9_152);
}
