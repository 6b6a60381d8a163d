// Core modules
pub mod align;
pub mod compare;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod landmarks;
pub mod processing;
pub mod report;
pub mod sweep;

// Re-export commonly used types
pub use compare::{similarity_percent, Comparison, FaceComparator};
pub use config::Config;
pub use detector::{FaceBox, FaceDetector};
pub use encoder::{euclidean_distance, Embedding, FaceEncoder};
pub use error::{FaceSweepError, Result};
pub use landmarks::{LandmarkPredictor, Landmarks, LANDMARK_COUNT};
pub use sweep::{run_sweep, run_sweep_with, FlagSet, RowOutcome, SweepRow};
