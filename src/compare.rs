use std::path::Path;

use image::DynamicImage;

use crate::align;
use crate::config::Config;
use crate::detector::FaceDetector;
use crate::encoder::{euclidean_distance, FaceEncoder};
use crate::error::{FaceSweepError, Result};
use crate::landmarks::LandmarkPredictor;
use crate::processing;
use crate::sweep::FlagSet;

/// Outcome of comparing one image pair under one flag combination.
///
/// Detection and extraction failures are in-band outcomes, not errors:
/// only faults like unreadable files or missing models surface as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Similarity percentage in [0, 100].
    Similarity(f32),
    /// No face found in at least one of the processed images.
    FacesNotDetected,
    /// Re-detection on a final image found no face to encode.
    EncodingFailed,
}

pub struct FaceComparator {
    detector: FaceDetector,
    encoder: FaceEncoder,
    // Loaded lazily: the model file is only required once a comparison
    // actually requests landmark alignment.
    predictor: Option<LandmarkPredictor>,
    config: Config,
}

impl FaceComparator {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            detector: FaceDetector::new(config)?,
            encoder: FaceEncoder::new(config)?,
            predictor: None,
            config: config.clone(),
        })
    }

    fn predictor(&mut self) -> Result<&LandmarkPredictor> {
        if self.predictor.is_none() {
            self.predictor = Some(LandmarkPredictor::new(&self.config)?);
        }
        match self.predictor.as_ref() {
            Some(predictor) => Ok(predictor),
            None => Err(FaceSweepError::Model(
                "Landmark predictor unavailable".to_string(),
            )),
        }
    }

    /// Compare the two images under the given flags, single-shot.
    pub fn compare(&mut self, path1: &Path, path2: &Path, flags: &FlagSet) -> Result<Comparison> {
        let (original1, processed1) =
            processing::load_and_process(path1, flags.grayscale, flags.bilateral)?;
        let (original2, processed2) =
            processing::load_and_process(path2, flags.grayscale, flags.bilateral)?;

        // Detection always runs on three channels, whatever preprocessing did.
        let detect1 = DynamicImage::ImageRgb8(processed1.to_rgb8());
        let detect2 = DynamicImage::ImageRgb8(processed2.to_rgb8());

        let faces1 = self.detector.detect(&detect1)?;
        let faces2 = self.detector.detect(&detect2)?;
        let (Some(face1), Some(face2)) = (faces1.first(), faces2.first()) else {
            return Ok(Comparison::FacesNotDetected);
        };

        // Alignment works on the untouched originals; the landmark points
        // come from the processed images the faces were detected in.
        let (final1, final2) = if flags.landmarks {
            let predictor = self.predictor()?;
            let shape1 = predictor.predict(&detect1, face1)?;
            let shape2 = predictor.predict(&detect2, face2)?;
            (
                align::aligned_by_eyes(&original1, &shape1),
                align::aligned_by_eyes(&original2, &shape2),
            )
        } else {
            (original1, original2)
        };

        let final1 = DynamicImage::ImageRgb8(final1.to_rgb8());
        let final2 = DynamicImage::ImageRgb8(final2.to_rgb8());

        // Encoding redetects in the final image; rotation can lose the face.
        let refound1 = self.detector.detect(&final1)?;
        let refound2 = self.detector.detect(&final2)?;
        let (Some(encode1), Some(encode2)) = (refound1.first(), refound2.first()) else {
            return Ok(Comparison::EncodingFailed);
        };

        let embedding1 = self.encoder.embed(&final1, encode1)?;
        let embedding2 = self.encoder.embed(&final2, encode2)?;

        let distance = euclidean_distance(&embedding1, &embedding2);
        Ok(Comparison::Similarity(similarity_percent(distance)))
    }
}

/// Convert an embedding distance into a similarity percentage.
/// Distances of 1.0 or more clamp to zero similarity.
pub fn similarity_percent(distance: f32) -> f32 {
    (1.0 - distance.min(1.0)) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_distance_is_full_similarity() {
        assert_relative_eq!(similarity_percent(0.0), 100.0);
    }

    #[test]
    fn unit_distance_is_zero_similarity() {
        assert_relative_eq!(similarity_percent(1.0), 0.0);
    }

    #[test]
    fn distances_beyond_one_clamp_to_zero() {
        assert_relative_eq!(similarity_percent(1.7), 0.0);
    }

    #[test]
    fn intermediate_distance_scales_linearly() {
        assert_relative_eq!(similarity_percent(0.4), 60.0, epsilon = 1e-4);
    }

    #[test]
    fn similarity_stays_in_range_for_any_distance() {
        for i in 0..200 {
            let s = similarity_percent(i as f32 * 0.05);
            assert!((0.0..=100.0).contains(&s));
        }
    }
}
