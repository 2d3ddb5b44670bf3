use super::{FlightReport, Formatter};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &FlightReport) -> String {
        let Some(events) = report.events.as_ref() else {
            return format!(
                "{}: ERROR: {}",
                report.filename,
                report.error.as_deref().unwrap_or("unknown failure")
            );
        };

        let altitude = report
            .apogee_altitude_m
            .map_or("-".to_string(), |a| format!("{:.0} m", a));
        let mut line = format!(
            "{}: apogee {:>6} ms, trigger {:>6} ms (lead {:>5} ms), altitude {}",
            report.filename,
            events.apogee_time_ms,
            events.descent_trigger_time_ms,
            events.trigger_lead_ms(),
            altitude
        );

        if self.verbose {
            let pressure = report
                .apogee_pressure_mbar
                .map_or("-".to_string(), |p| format!("{:.2} mbar", p));
            let markers: Vec<String> = events
                .reference_markers
                .iter()
                .map(|m| {
                    let order = match events.trigger_after_marker(m.offset_ms) {
                        Some(true) => "after",
                        _ => "before",
                    };
                    format!("-{}ms@{} ({})", m.offset_ms, m.time_ms, order)
                })
                .collect();
            line.push_str(&format!(
                " [smoothed apogee: {} ms, pressure: {}, samples: {}, markers: {}]",
                events.smoothed_apogee_time_ms,
                pressure,
                report.sample_count,
                markers.join(" ")
            ));
        }

        line
    }
}
