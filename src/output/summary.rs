use rolling_stats::Stats;
use serde::Serialize;

use super::FlightReport;

/// Trigger lead statistics over several flights
#[derive(Debug, Clone, Serialize)]
pub struct LeadSummary {
    pub count: usize,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Flights whose trigger fired after each reference marker, by offset
    pub after_marker: Vec<(i64, usize)>,
}

impl LeadSummary {
    /// Summarize the successful reports; `None` if there are none.
    pub fn from_reports(reports: &[FlightReport], reference_offsets_ms: &[i64]) -> Option<Self> {
        let mut stats: Stats<f64> = Stats::new();
        let mut after_marker: Vec<(i64, usize)> =
            reference_offsets_ms.iter().map(|&o| (o, 0)).collect();

        for events in reports.iter().filter_map(|r| r.events.as_ref()) {
            stats.update(events.trigger_lead_ms() as f64);
            for (offset, count) in after_marker.iter_mut() {
                if events.trigger_after_marker(*offset) == Some(true) {
                    *count += 1;
                }
            }
        }

        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean_ms: stats.mean,
            std_dev_ms: stats.std_dev,
            min_ms: stats.min,
            max_ms: stats.max,
            after_marker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_over_flights() {
        let mut second = sample_report();
        if let Some(events) = second.events.as_mut() {
            events.descent_trigger_time_ms = events.apogee_time_ms - 2000;
        }
        let reports = vec![
            sample_report(),
            second,
            FlightReport::failed("bad.txt", 0, "boom"),
        ];

        let summary = LeadSummary::from_reports(&reports, &[1500, 2000, 2500]).unwrap();
        assert_eq!(summary.count, 2);
        assert_relative_eq!(summary.mean_ms, 1630.5);
        assert_relative_eq!(summary.min_ms, 1261.0);
        assert_relative_eq!(summary.max_ms, 2000.0);
        // Second trigger at 7997: before 8528, after 7904 and 7488
        assert_eq!(summary.after_marker, vec![(1500, 1), (2000, 2), (2500, 2)]);
    }

    #[test]
    fn test_no_successful_flights() {
        let reports = vec![FlightReport::failed("bad.txt", 0, "boom")];
        assert!(LeadSummary::from_reports(&reports, &[1500]).is_none());
    }
}
