mod csv;
mod json;
mod summary;
mod text;

use chrono::Utc;
use serde::Serialize;

use crate::processing::AnalysisReport;
use crate::signal_processing::QuadraticModel;
use crate::types::{DerivativeSeries, FlightEvents, ResampledSeries, SmoothedSeries};

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::summary::LeadSummary;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Intermediate series carried along for a downstream plotter
#[derive(Debug, Clone, Serialize)]
pub struct SeriesDump {
    pub resampled: ResampledSeries,
    pub smoothed: SmoothedSeries,
    pub derivative: DerivativeSeries,
}

/// One analyzed (or failed) flight, as rendered by a [`Formatter`].
#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub filename: String,
    pub sample_count: usize,
    pub events: Option<FlightEvents>,
    pub trigger_lead_ms: Option<i64>,
    pub apogee_pressure_mbar: Option<f64>,
    pub apogee_altitude_m: Option<f64>,
    pub model: Option<QuadraticModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlightReport {
    pub fn from_analysis(
        filename: impl Into<String>,
        sample_count: usize,
        report: AnalysisReport,
        include_series: bool,
    ) -> Self {
        let apogee_pressure_mbar = report.apogee_pressure_mbar();
        let apogee_altitude_m = report.apogee_altitude_m();
        let trigger_lead_ms = Some(report.events.trigger_lead_ms());
        let series = include_series.then(|| SeriesDump {
            resampled: report.resampled,
            smoothed: report.smoothed,
            derivative: report.derivative,
        });

        Self {
            filename: filename.into(),
            sample_count,
            events: Some(report.events),
            trigger_lead_ms,
            apogee_pressure_mbar,
            apogee_altitude_m,
            model: Some(report.model),
            series,
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, sample_count: usize, error: impl ToString) -> Self {
        Self {
            filename: filename.into(),
            sample_count,
            events: None,
            trigger_lead_ms: None,
            apogee_pressure_mbar: None,
            apogee_altitude_m: None,
            model: None,
            series: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub trait Formatter: Send {
    fn format(&self, report: &FlightReport) -> String;

    fn header(&self) -> Option<String> {
        None
    }
}

pub fn create_formatter(
    format: OutputFormat,
    verbose: bool,
    reference_offsets_ms: &[i64],
) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter::new(reference_offsets_ms.to_vec())),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::ReferenceMarker;

    pub fn sample_report() -> FlightReport {
        FlightReport {
            filename: "flight_01.txt".to_string(),
            sample_count: 200,
            events: Some(FlightEvents {
                descent_trigger_time_ms: 8736,
                apogee_time_ms: 9997,
                smoothed_apogee_time_ms: 9984,
                reference_markers: vec![
                    ReferenceMarker {
                        offset_ms: 1500,
                        time_ms: 8528,
                    },
                    ReferenceMarker {
                        offset_ms: 2000,
                        time_ms: 7904,
                    },
                    ReferenceMarker {
                        offset_ms: 2500,
                        time_ms: 7488,
                    },
                ],
            }),
            trigger_lead_ms: Some(1261),
            apogee_pressure_mbar: Some(701.25),
            apogee_altitude_m: Some(2994.1),
            model: Some(QuadraticModel::new(1.0e-6, -0.02, 1013.0)),
            series: None,
            error: None,
        }
    }
}
