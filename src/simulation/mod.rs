mod flight;
mod profile;

pub use flight::{FlightSimulation, SensorNoise, generate_flight_samples};
pub use profile::FlightProfile;
