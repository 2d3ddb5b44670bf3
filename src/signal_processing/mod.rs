pub mod block_average;
pub mod derivative;
pub mod event_detector;
pub mod polyfit;
pub mod resample;

pub use block_average::BlockAverager;
pub use derivative::forward_difference;
pub use event_detector::{EventDetector, find_apogee, find_threshold_crossing, nearest_time};
pub use polyfit::{FIT_DEGREE, MIN_FIT_SAMPLES, QuadraticModel, fit_quadratic};
pub use resample::Resampler;
