use serde::Serialize;

use super::{FlightReport, Formatter, iso8601_timestamp};

/// One JSON object per flight, newline delimited.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    #[serde(flatten)]
    report: &'a FlightReport,
}

impl Formatter for JsonFormatter {
    fn format(&self, report: &FlightReport) -> String {
        let line = JsonLine {
            ts: iso8601_timestamp(),
            report,
        };
        serde_json::to_string(&line).unwrap_or_else(|e| {
            format!(
                r#"{{"filename":{:?},"error":"serialization failed: {}"}}"#,
                report.filename, e
            )
        })
    }
}
