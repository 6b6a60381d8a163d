use std::ops::Range;
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array4, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};

use crate::config::Config;
use crate::detector::FaceBox;
use crate::error::{FaceSweepError, Result};

pub const LANDMARK_COUNT: usize = 68;

// 68-point model convention: indices 36-41 are the left eye, 42-47 the right.
const LEFT_EYE: Range<usize> = 36..42;
const RIGHT_EYE: Range<usize> = 42..48;

// Symmetric margin around the detector box before landmark regression.
const CROP_MARGIN: f32 = 0.15;

/// Exactly 68 ordered facial points in source-image pixel coordinates.
///
/// Construction validates the count, so downstream eye indexing can never
/// run out of range.
#[derive(Debug, Clone)]
pub struct Landmarks {
    points: Vec<(f32, f32)>,
}

impl Landmarks {
    pub fn new(points: Vec<(f32, f32)>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(FaceSweepError::InvalidLandmarks {
                expected: LANDMARK_COUNT,
                got: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn left_eye_center(&self) -> (f32, f32) {
        self.mean_of(LEFT_EYE)
    }

    pub fn right_eye_center(&self) -> (f32, f32) {
        self.mean_of(RIGHT_EYE)
    }

    fn mean_of(&self, range: Range<usize>) -> (f32, f32) {
        let count = range.len() as f32;
        let (sum_x, sum_y) = self.points[range]
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        (sum_x / count, sum_y / count)
    }
}

pub struct LandmarkPredictor {
    session: Session,
    _environment: Arc<Environment>,
    config: Config,
}

impl LandmarkPredictor {
    pub fn new(config: &Config) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("landmark_predictor")
                .build()
                .map_err(|e| FaceSweepError::Model(format!("Failed to create environment: {}", e)))?,
        );

        let model_path = &config.models.landmark_path;
        if !model_path.exists() {
            return Err(FaceSweepError::Model(format!(
                "Landmark model not found at: {:?}",
                model_path
            )));
        }

        let mut session_builder = SessionBuilder::new(&environment)?;

        let opt_level = match config.performance.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        };
        session_builder = session_builder.with_optimization_level(opt_level)?;

        let session = session_builder.with_model_from_file(model_path)?;

        Ok(Self {
            session,
            _environment: environment,
            config: config.clone(),
        })
    }

    /// Regress 68 points for the given face, mapped back to the coordinate
    /// space of `image`.
    pub fn predict(&self, image: &DynamicImage, face: &FaceBox) -> Result<Landmarks> {
        let (crop, crop_x, crop_y, crop_w, crop_h) = crop_with_margin(image, face);

        let input_size = self.config.landmarks.input_size;
        let resized = crop.resize_exact(input_size, input_size, FilterType::Triangle);
        let input_array = preprocess_crop(&resized);

        let cow_array = CowArray::from(input_array.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let raw = outputs[0].try_extract::<f32>()?.view().to_owned().into_raw_vec();
        if raw.len() < 2 * LANDMARK_COUNT {
            return Err(FaceSweepError::Model(format!(
                "Landmark model returned {} values, expected at least {}",
                raw.len(),
                2 * LANDMARK_COUNT
            )));
        }

        // Model output is normalized to the crop; map back to image space.
        let points = (0..LANDMARK_COUNT)
            .map(|i| {
                (
                    crop_x + raw[2 * i] * crop_w,
                    crop_y + raw[2 * i + 1] * crop_h,
                )
            })
            .collect();

        Landmarks::new(points)
    }
}

/// Crop the face box expanded by `CROP_MARGIN`, clamped to the image bounds.
/// Returns the crop plus its offset and size in source coordinates.
fn crop_with_margin(image: &DynamicImage, face: &FaceBox) -> (DynamicImage, f32, f32, f32, f32) {
    let margin_x = face.width() * CROP_MARGIN;
    let margin_y = face.height() * CROP_MARGIN;

    let x1 = (face.x1 - margin_x).max(0.0);
    let y1 = (face.y1 - margin_y).max(0.0);
    let x2 = (face.x2 + margin_x).min(image.width() as f32);
    let y2 = (face.y2 + margin_y).min(image.height() as f32);

    let w = (x2 - x1).max(1.0);
    let h = (y2 - y1).max(1.0);

    let crop = image.crop_imm(x1 as u32, y1 as u32, w as u32, h as u32);
    (crop, x1, y1, w, h)
}

fn preprocess_crop(img: &DynamicImage) -> Array4<f32> {
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    let mut array = Array4::<f32>::zeros((1, 3, height, width));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        array[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        array[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        array[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    array
}
