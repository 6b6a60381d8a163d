use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FaceSweepError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub landmarks: LandmarkConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_detector_path")]
    pub detector_path: PathBuf,
    #[serde(default = "default_landmark_path")]
    pub landmark_path: PathBuf,
    #[serde(default = "default_encoder_path")]
    pub encoder_path: PathBuf,
}

fn default_detector_path() -> PathBuf {
    PathBuf::from("models/face_detector.onnx")
}
fn default_landmark_path() -> PathBuf {
    PathBuf::from("models/landmarks_68.onnx")
}
fn default_encoder_path() -> PathBuf {
    PathBuf::from("models/face_encoder.onnx")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            detector_path: default_detector_path(),
            landmark_path: default_landmark_path(),
            encoder_path: default_encoder_path(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectorConfig {
    #[serde(default = "default_detector_input")]
    pub input_width: u32,
    #[serde(default = "default_detector_input")]
    pub input_height: u32,
    #[serde(default = "default_detection_confidence")]
    pub detection_confidence: f32,
}

fn default_detector_input() -> u32 {
    640
}
fn default_detection_confidence() -> f32 {
    0.5
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_width: default_detector_input(),
            input_height: default_detector_input(),
            detection_confidence: default_detection_confidence(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LandmarkConfig {
    #[serde(default = "default_landmark_input")]
    pub input_size: u32,
}

fn default_landmark_input() -> u32 {
    112
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            input_size: default_landmark_input(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EncoderConfig {
    #[serde(default = "default_encoder_input")]
    pub input_size: u32,
    #[serde(default = "default_normalization_value")]
    pub normalization_value: f32,
}

fn default_encoder_input() -> u32 {
    112
}
fn default_normalization_value() -> f32 {
    127.5
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            input_size: default_encoder_input(),
            normalization_value: default_normalization_value(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PerformanceConfig {
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u32,
}

fn default_optimization_level() -> u32 {
    3
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            optimization_level: default_optimization_level(),
        }
    }
}

impl Config {
    pub fn load_from_path(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Err(FaceSweepError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| FaceSweepError::Config(format!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.detector.input_width == 0 || self.detector.input_width > 4096 {
            return Err(FaceSweepError::Config(format!(
                "Detector input width must be between 1 and 4096, got {}",
                self.detector.input_width
            )));
        }
        if self.detector.input_height == 0 || self.detector.input_height > 4096 {
            return Err(FaceSweepError::Config(format!(
                "Detector input height must be between 1 and 4096, got {}",
                self.detector.input_height
            )));
        }

        if self.detector.detection_confidence < 0.0 || self.detector.detection_confidence > 1.0 {
            return Err(FaceSweepError::Config(format!(
                "Detection confidence must be between 0.0 and 1.0, got {}",
                self.detector.detection_confidence
            )));
        }

        if self.landmarks.input_size == 0 || self.landmarks.input_size > 1024 {
            return Err(FaceSweepError::Config(format!(
                "Landmark input size must be between 1 and 1024, got {}",
                self.landmarks.input_size
            )));
        }

        if self.encoder.input_size == 0 || self.encoder.input_size > 1024 {
            return Err(FaceSweepError::Config(format!(
                "Encoder input size must be between 1 and 1024, got {}",
                self.encoder.input_size
            )));
        }
        if self.encoder.normalization_value <= 0.0 {
            return Err(FaceSweepError::Config(format!(
                "Encoder normalization value must be positive, got {}",
                self.encoder.normalization_value
            )));
        }

        Ok(())
    }
}
