use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, bounded, unbounded};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use baroapogee::config::SampleRate;
use baroapogee::output::{FlightReport, Formatter, LeadSummary, OutputFormat, create_formatter};
use baroapogee::telemetry::{DelimitedFileSource, DelimitedFormat, SampleSource};
use baroapogee::{AnalysisConfig, AnalysisError, FlightAnalyzer};

#[derive(Parser, Debug)]
#[command(name = "baroapogee")]
#[command(about = "Find apogee and descent-trigger timing in barometer logs", long_about = None)]
struct Args {
    /// Delimited telemetry logs (time in seconds, pressure in mbar)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML analysis configuration; flags below override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Resample window start in ms
    #[arg(long)]
    start_ms: Option<i64>,

    /// Resample window end in ms (exclusive)
    #[arg(long)]
    end_ms: Option<i64>,

    /// Resample rate (e.g., "75", "75hz", "13ms")
    #[arg(short = 'r', long)]
    rate: Option<SampleRate>,

    /// Half-width of the uniform resample noise in mbar, 0 disables
    #[arg(long)]
    noise_range: Option<f64>,

    /// Seed for the resample noise
    #[arg(long)]
    seed: Option<u64>,

    /// Points per smoothing block
    #[arg(short = 'b', long)]
    block_size: Option<usize>,

    /// Descent trigger threshold in mbar/ms
    #[arg(short = 't', long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Field delimiter of the input files
    #[arg(short = 'd', long, default_value = ";")]
    delimiter: char,

    /// Input files start with a header row
    #[arg(long)]
    header: bool,

    /// Zero-based column holding the timestamp
    #[arg(long, default_value_t = 0)]
    time_column: usize,

    /// Zero-based column holding the pressure
    #[arg(long, default_value_t = 1)]
    pressure_column: usize,

    /// Multiplier converting the time column to seconds (0.001 for ms logs)
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,

    /// Worker threads (defaults to the available parallelism)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Include resampled, smoothed and derivative series in json output
    #[arg(long)]
    include_series: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Analyzed,
    NoTrigger,
    Failed,
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match args.config {
        Some(ref path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(start_ms) = args.start_ms {
        config.resample.start_ms = start_ms;
    }
    if let Some(end_ms) = args.end_ms {
        config.resample.end_ms = end_ms;
    }
    if let Some(rate) = args.rate {
        config.resample.rate = rate;
    }
    if let Some(range) = args.noise_range {
        config.noise.range_mbar = range;
    }
    if let Some(seed) = args.seed {
        config.noise.seed = seed;
    }
    if let Some(block_size) = args.block_size {
        config.smoothing.block_size = block_size;
    }
    if let Some(threshold) = args.threshold {
        config.detector.trigger_threshold_mbar_per_ms = threshold;
    }

    config.validate().context("Invalid analysis configuration")?;
    Ok(config)
}

fn delimited_format(args: &Args) -> Result<DelimitedFormat> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("Delimiter must be a single ASCII character");
    }
    if !args.time_scale.is_finite() || args.time_scale <= 0.0 {
        anyhow::bail!("Time scale must be positive");
    }
    Ok(DelimitedFormat {
        delimiter: args.delimiter as u8,
        has_header: args.header,
        time_column: args.time_column,
        pressure_column: args.pressure_column,
        time_scale: args.time_scale,
    })
}

/// Workers to start: the requested or available parallelism, capped by the file count.
fn worker_count(jobs: Option<usize>, files: usize) -> usize {
    let wanted = jobs.unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()));
    wanted.min(files).max(1)
}

fn analyze_file(
    path: &Path,
    format: DelimitedFormat,
    analyzer: &FlightAnalyzer,
    include_series: bool,
) -> (FlightReport, FileOutcome) {
    let filename = path.display().to_string();
    let mut source = DelimitedFileSource::new(path, format);

    let samples = match source.load() {
        Ok(samples) => samples,
        Err(e) => {
            warn!("{}: {:#}", filename, e);
            return (
                FlightReport::failed(filename, 0, format!("{:#}", e)),
                FileOutcome::Failed,
            );
        }
    };
    info!("{}: {} samples", filename, samples.len());

    match analyzer.analyze(&samples) {
        Ok(report) => (
            FlightReport::from_analysis(filename, samples.len(), report, include_series),
            FileOutcome::Analyzed,
        ),
        Err(e) => {
            warn!("{}: {}", filename, e);
            let outcome = match e {
                AnalysisError::TriggerNotFound { .. } => FileOutcome::NoTrigger,
                _ => FileOutcome::Failed,
            };
            (FlightReport::failed(filename, samples.len(), e), outcome)
        }
    }
}

fn run_report_loop(
    report_rx: Receiver<(FlightReport, FileOutcome)>,
    formatter: &dyn Formatter,
) -> Vec<(FlightReport, FileOutcome)> {
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let mut results = Vec::new();
    for (report, outcome) in report_rx {
        println!("{}", formatter.format(&report));
        results.push((report, outcome));
    }
    results
}

fn print_summary(summary: &LeadSummary) {
    eprintln!();
    eprintln!("Trigger lead over {} flights:", summary.count);
    eprintln!("  Mean: {:.0} ms", summary.mean_ms);
    eprintln!("  Std dev: {:.0} ms", summary.std_dev_ms);
    eprintln!("  Min: {:.0} ms", summary.min_ms);
    eprintln!("  Max: {:.0} ms", summary.max_ms);
    for (offset, after) in &summary.after_marker {
        eprintln!(
            "  Fired after the -{} ms marker: {} of {}",
            offset, after, summary.count
        );
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;
    let format = delimited_format(&args)?;
    let analyzer = FlightAnalyzer::new(&config)?;
    info!(
        "Resampling every {} ms, smoothing step {} ms",
        analyzer.resample_step_ms(),
        analyzer.smoothing_step_ms()
    );

    let formatter = create_formatter(
        args.format,
        args.verbose > 0,
        &config.detector.reference_offsets_ms,
    );

    let workers = worker_count(args.jobs, args.files.len());
    info!("Analyzing {} files on {} workers", args.files.len(), workers);

    let (path_tx, path_rx) = unbounded();
    for path in &args.files {
        if path_tx.send(path.as_path()).is_err() {
            break;
        }
    }
    drop(path_tx);

    let (report_tx, report_rx) = bounded(4);
    let results = thread::scope(|scope| {
        for _ in 0..workers {
            let path_rx = path_rx.clone();
            let report_tx = report_tx.clone();
            let format = format.clone();
            let analyzer = &analyzer;
            let include_series = args.include_series;
            scope.spawn(move || {
                for path in path_rx.iter() {
                    let result = analyze_file(path, format.clone(), analyzer, include_series);
                    if report_tx.send(result).is_err() {
                        warn!("Reporter stopped before {}", path.display());
                        break;
                    }
                }
            });
        }
        drop(report_tx);

        run_report_loop(report_rx, formatter.as_ref())
    });

    let reports: Vec<FlightReport> = results.iter().map(|(r, _)| r.clone()).collect();
    if reports.len() > 1
        && let Some(summary) =
            LeadSummary::from_reports(&reports, &config.detector.reference_offsets_ms)
    {
        print_summary(&summary);
    }

    let exit = if results.iter().any(|(_, o)| *o == FileOutcome::Failed) {
        ExitCode::FAILURE
    } else if results.iter().any(|(_, o)| *o == FileOutcome::NoTrigger) {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };
    Ok(exit)
}
