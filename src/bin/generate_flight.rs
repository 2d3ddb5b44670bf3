use anyhow::{Context, Result};
use baroapogee::simulation::{
    FlightProfile, FlightSimulation, SensorNoise, generate_flight_samples,
};
use baroapogee::telemetry::write_delimited;
use clap::Parser;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "generate_flight")]
#[command(about = "Generate synthetic barometer logs for apogee detection testing")]
struct Args {
    /// TOML simulation file (profile, sample_count, timing_jitter_s, noise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Number of flights to generate
    #[arg(short, long, default_value_t = 10)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Peak altitude in metres of a triangular profile (CLI override)
    #[arg(long)]
    peak_altitude: Option<f64>,

    /// Climb time in seconds of a triangular profile (CLI override)
    #[arg(long)]
    ascent: Option<f64>,

    /// Fall time in seconds of a triangular profile (CLI override)
    #[arg(long)]
    descent: Option<f64>,

    /// Samples per flight (CLI override)
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Gaussian sensor noise in mbar (CLI override)
    #[arg(long)]
    noise: Option<f64>,

    /// Timestamp jitter in seconds (CLI override)
    #[arg(long)]
    jitter: Option<f64>,

    /// Field delimiter
    #[arg(short, long, default_value = ";")]
    delimiter: char,

    /// Output filename prefix
    #[arg(long, default_value = "flight")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    trial: u32,
    seed: u64,
    apogee_time_ms: f64,
    peak_altitude_m: f64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    simulation: FlightSimulation,
    files: Vec<ManifestEntry>,
}

fn load_toml_config(path: &Path) -> Result<FlightSimulation> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_simulation(base: FlightSimulation, args: &Args) -> Result<FlightSimulation> {
    let mut simulation = base;

    if args.peak_altitude.is_some() || args.ascent.is_some() || args.descent.is_some() {
        let (peak, up, down) = match simulation.profile {
            FlightProfile::Triangular {
                peak_altitude_m,
                ascent_s,
                descent_s,
            } => (peak_altitude_m, ascent_s, descent_s),
            FlightProfile::Ballistic { .. } => {
                anyhow::bail!("--peak-altitude/--ascent/--descent apply to triangular profiles")
            }
        };
        simulation.profile = FlightProfile::Triangular {
            peak_altitude_m: args.peak_altitude.unwrap_or(peak),
            ascent_s: args.ascent.unwrap_or(up),
            descent_s: args.descent.unwrap_or(down),
        };
    }

    if let Some(samples) = args.samples {
        simulation.sample_count = samples;
    }
    if let Some(jitter) = args.jitter {
        simulation.timing_jitter_s = jitter;
    }
    if let Some(std_dev) = args.noise {
        simulation.noise = Some(SensorNoise {
            std_dev_mbar: std_dev,
            seed: None,
        });
    }

    simulation
        .validate()
        .context("Invalid simulation settings")?;
    Ok(simulation)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !args.delimiter.is_ascii() {
        anyhow::bail!("Delimiter must be a single ASCII character");
    }

    let base = match args.config {
        Some(ref path) => load_toml_config(path)?,
        None => FlightSimulation::default(),
    };
    let simulation = build_simulation(base, &args)?;
    let base_seed = args.seed.unwrap_or(0);

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let mut manifest_entries = Vec::new();
    for trial in 0..args.trials {
        let seed = base_seed + trial as u64;
        let mut flight = simulation.clone();
        if let Some(noise) = flight.noise.as_mut() {
            noise.seed = Some(seed);
        }

        let samples = generate_flight_samples(&flight)?;

        let filename = format!("{}_t{:03}.txt", args.prefix, trial);
        let filepath = args.output_dir.join(&filename);
        let file = File::create(&filepath)
            .with_context(|| format!("Failed to create {}", filepath.display()))?;
        write_delimited(BufWriter::new(file), &samples, args.delimiter as u8)
            .with_context(|| format!("Failed to write {}", filepath.display()))?;

        manifest_entries.push(ManifestEntry {
            file: filename,
            trial,
            seed,
            apogee_time_ms: flight.profile.apogee_time_s() * 1000.0,
            peak_altitude_m: flight.profile.peak_altitude_m(),
        });

        eprint!("\rGenerating: {}/{}", trial + 1, args.trials);
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            simulation,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        args.trials,
        args.output_dir.display()
    );
    Ok(())
}
