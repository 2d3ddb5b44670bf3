pub mod atmosphere;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod telemetry;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use processing::{AnalysisReport, FlightAnalyzer};
pub use types::{FlightEvents, Sample};
