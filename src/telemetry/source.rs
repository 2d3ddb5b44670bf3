use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, warn};

use crate::types::Sample;

/// Supplies the raw samples of one flight.
pub trait SampleSource: Send {
    fn load(&mut self) -> anyhow::Result<Vec<Sample>>;
    fn name(&self) -> String;
}

/// Column layout of a delimited telemetry log
///
/// The default matches the simulator and barometer dumps: `time_s;pressure`
/// with no header.
#[derive(Debug, Clone)]
pub struct DelimitedFormat {
    pub delimiter: u8,
    pub has_header: bool,
    pub time_column: usize,
    pub pressure_column: usize,
    /// Multiplier converting the time column to seconds
    pub time_scale: f64,
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_header: false,
            time_column: 0,
            pressure_column: 1,
            time_scale: 1.0,
        }
    }
}

pub struct DelimitedFileSource {
    path: PathBuf,
    format: DelimitedFormat,
}

impl DelimitedFileSource {
    pub fn new<P: AsRef<Path>>(path: P, format: DelimitedFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }
}

impl SampleSource for DelimitedFileSource {
    fn load(&mut self) -> anyhow::Result<Vec<Sample>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        read_delimited(file, &self.format)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Samples already in memory, e.g. from a simulation.
pub struct VecSource {
    name: String,
    samples: Vec<Sample>,
}

impl VecSource {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }
}

impl SampleSource for VecSource {
    fn load(&mut self) -> anyhow::Result<Vec<Sample>> {
        Ok(dedup_timestamps(std::mem::take(&mut self.samples)))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Parse delimited records into samples.
///
/// Blank lines and `#` comments are skipped. Records repeating the previous
/// timestamp are dropped, keeping the first.
pub fn read_delimited<R: Read>(
    reader: R,
    format: &DelimitedFormat,
) -> anyhow::Result<Vec<Sample>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_header)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let field = |column: usize, what: &str| -> anyhow::Result<f64> {
            let text = record
                .get(column)
                .with_context(|| format!("line {}: missing {} column {}", line, what, column))?;
            text.parse::<f64>()
                .with_context(|| format!("line {}: invalid {} '{}'", line, what, text))
        };

        let time = field(format.time_column, "time")? * format.time_scale;
        let pressure = field(format.pressure_column, "pressure")?;
        samples.push(Sample::new(time, pressure));
    }

    let total = samples.len();
    let samples = dedup_timestamps(samples);
    debug!(
        "Read {} records, {} after removing repeated timestamps",
        total,
        samples.len()
    );

    Ok(samples)
}

/// Write samples as `time_s<delim>pressure` records, readable by [`read_delimited`].
pub fn write_delimited<W: Write>(
    writer: W,
    samples: &[Sample],
    delimiter: u8,
) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);

    for sample in samples {
        csv_writer.write_record([
            format!("{:.6}", sample.time_s),
            format!("{:.4}", sample.pressure_mbar),
        ])?;
    }
    csv_writer.flush().context("Failed to flush samples")?;
    Ok(())
}

/// Drop samples whose timestamp equals the previous kept one.
pub fn dedup_timestamps(mut samples: Vec<Sample>) -> Vec<Sample> {
    let before = samples.len();
    samples.dedup_by(|current, kept| current.time_s == kept.time_s);
    if samples.len() < before {
        warn!(
            "Dropped {} samples with repeated timestamps",
            before - samples.len()
        );
    }
    samples
}
