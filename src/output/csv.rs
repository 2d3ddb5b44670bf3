use anyhow::Context;
use log::warn;

use super::{FlightReport, Formatter, iso8601_timestamp};

/// One CSV row per flight with a column per reference marker.
pub struct CsvFormatter {
    reference_offsets_ms: Vec<i64>,
}

impl CsvFormatter {
    pub fn new(reference_offsets_ms: Vec<i64>) -> Self {
        Self {
            reference_offsets_ms,
        }
    }
}

/// Encodes one record, quoting fields that hold delimiters, quotes or newlines.
fn encode_record<I, S>(fields: I) -> anyhow::Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields).context("Failed to encode CSV record")?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV record: {}", e.error()))?;
    let mut line = String::from_utf8(bytes).context("CSV record is not UTF-8")?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

fn encode_or_warn(fields: Vec<String>) -> String {
    encode_record(&fields).unwrap_or_else(|e| {
        warn!("{:#}", e);
        String::new()
    })
}

impl Formatter for CsvFormatter {
    fn format(&self, report: &FlightReport) -> String {
        let events = report.events.as_ref();
        let int = |v: Option<i64>| v.map_or(String::new(), |v| v.to_string());

        let mut fields = vec![
            iso8601_timestamp(),
            report.filename.clone(),
            report.sample_count.to_string(),
            int(events.map(|e| e.apogee_time_ms)),
            int(events.map(|e| e.smoothed_apogee_time_ms)),
            int(events.map(|e| e.descent_trigger_time_ms)),
            int(report.trigger_lead_ms),
            report
                .apogee_pressure_mbar
                .map_or(String::new(), |p| format!("{:.3}", p)),
            report
                .apogee_altitude_m
                .map_or(String::new(), |a| format!("{:.1}", a)),
        ];
        for &offset in &self.reference_offsets_ms {
            fields.push(int(events.and_then(|e| e.marker(offset)).map(|m| m.time_ms)));
        }
        fields.push(report.error.clone().unwrap_or_default());

        encode_or_warn(fields)
    }

    fn header(&self) -> Option<String> {
        let mut columns: Vec<String> = [
            "ts",
            "filename",
            "samples",
            "apogee_ms",
            "smoothed_apogee_ms",
            "trigger_ms",
            "lead_ms",
            "apogee_mbar",
            "apogee_altitude_m",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        for offset in &self.reference_offsets_ms {
            columns.push(format!("marker_{}_ms", offset));
        }
        columns.push("error".to_string());
        Some(encode_or_warn(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_report;

    fn read_back(header: &str, row: &str) -> (csv::StringRecord, csv::StringRecord) {
        let text = format!("{}\n{}\n", header, row);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let record = reader.records().next().unwrap().unwrap();
        (headers, record)
    }

    #[test]
    fn test_row_matches_header() {
        let formatter = CsvFormatter::new(vec![1500, 2000, 2500]);
        let header = formatter.header().unwrap();
        let row = formatter.format(&sample_report());

        assert!(header.ends_with("marker_1500_ms,marker_2000_ms,marker_2500_ms,error"));

        let (headers, fields) = read_back(&header, &row);
        assert_eq!(headers.len(), fields.len());
        assert_eq!(&fields[1], "flight_01.txt");
        assert_eq!(&fields[3], "9997");
        assert_eq!(&fields[4], "9984");
        assert_eq!(&fields[5], "8736");
        assert_eq!(&fields[6], "1261");
        assert_eq!(&fields[7], "701.250");
        assert_eq!(
            fields.iter().skip(9).take(3).collect::<Vec<_>>(),
            vec!["8528", "7904", "7488"]
        );
        assert_eq!(&fields[12], "");
    }

    #[test]
    fn test_unknown_marker_is_blank() {
        let formatter = CsvFormatter::new(vec![3000]);
        let row = formatter.format(&sample_report());
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[9], "");
    }

    #[test]
    fn test_delimiters_in_fields_are_quoted() {
        let formatter = CsvFormatter::new(vec![1500]);
        let filename = "run,2 \"final\".txt";
        let error = "line 3: expected \"time;pressure\", got 1 field";
        let row = formatter.format(&FlightReport::failed(filename, 0, error));

        let (headers, fields) = read_back(&formatter.header().unwrap(), &row);
        assert_eq!(fields.len(), headers.len());
        assert_eq!(&fields[1], filename);
        assert_eq!(&fields[headers.len() - 1], error);
    }
}
