use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array4, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};

use crate::config::Config;
use crate::detector::FaceBox;
use crate::error::{FaceSweepError, Result};

pub type Embedding = Vec<f32>;

pub struct FaceEncoder {
    session: Session,
    _environment: Arc<Environment>,
    config: Config,
}

impl FaceEncoder {
    pub fn new(config: &Config) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_encoder")
                .build()
                .map_err(|e| FaceSweepError::Model(format!("Failed to create environment: {}", e)))?,
        );

        let model_path = &config.models.encoder_path;
        if !model_path.exists() {
            return Err(FaceSweepError::Model(format!(
                "Encoder model not found at: {:?}",
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

    /// Extract a unit-length embedding for the given face region.
    pub fn embed(&self, image: &DynamicImage, face: &FaceBox) -> Result<Embedding> {
        let face_img = crop_face(image, face);

        let input_size = self.config.encoder.input_size;
        let resized = face_img.resize_exact(input_size, input_size, FilterType::Triangle);

        let input_array = self.preprocess_face(&resized);
        let cow_array = CowArray::from(input_array.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let embedding = outputs[0].try_extract::<f32>()?.view().to_owned().into_raw_vec();
        Ok(l2_normalize(embedding))
    }

    fn preprocess_face(&self, img: &DynamicImage) -> Array4<f32> {
        let rgb = img.to_rgb8();
        let size = self.config.encoder.input_size as usize;
        let mut array = Array4::<f32>::zeros((1, 3, size, size));

        // ArcFace normalization around the configured midpoint.
        let norm = self.config.encoder.normalization_value;
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            array[[0, 0, y, x]] = (pixel[0] as f32 - norm) / norm;
            array[[0, 1, y, x]] = (pixel[1] as f32 - norm) / norm;
            array[[0, 2, y, x]] = (pixel[2] as f32 - norm) / norm;
        }

        array
    }
}

fn crop_face(image: &DynamicImage, face: &FaceBox) -> DynamicImage {
    let x = face.x1.max(0.0) as u32;
    let y = face.y1.max(0.0) as u32;
    let width = face.width().max(1.0) as u32;
    let height = face.height().max(1.0) as u32;

    image.crop_imm(x, y, width, height)
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
