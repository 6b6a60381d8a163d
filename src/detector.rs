use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array4, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};

use crate::config::Config;
use crate::error::{FaceSweepError, Result};

const NMS_IOU_THRESHOLD: f32 = 0.45;
const MIN_BOX_SIDE: f32 = 10.0;

/// Rectangular face region in source-image pixel coordinates.
#[derive(Debug, Clone)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl FaceBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

pub struct FaceDetector {
    session: Session,
    _environment: Arc<Environment>,
    config: Config,
}

impl FaceDetector {
    pub fn new(config: &Config) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .build()
                .map_err(|e| FaceSweepError::Model(format!("Failed to create environment: {}", e)))?,
        );

        let model_path = &config.models.detector_path;
        if !model_path.exists() {
            return Err(FaceSweepError::Model(format!(
                "Detector model not found at: {:?}",
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

    /// Detect faces, returning boxes in the source image's coordinate space,
    /// ordered by descending confidence. The first box defines "first face"
    /// for the rest of the pipeline.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBox>> {
        let orig_width = image.width() as f32;
        let orig_height = image.height() as f32;

        let input_width = self.config.detector.input_width;
        let input_height = self.config.detector.input_height;

        let img_array = if image.width() == input_width && image.height() == input_height {
            image_to_tensor(image)
        } else {
            let resized = image.resize_exact(input_width, input_height, FilterType::Triangle);
            image_to_tensor(&resized)
        };

        let cow_array = CowArray::from(img_array.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let mut faces = self.parse_detections(&outputs)?;

        // Map detections back to the original image's coordinate space.
        let scale_x = orig_width / input_width as f32;
        let scale_y = orig_height / input_height as f32;
        for face in &mut faces {
            face.x1 *= scale_x;
            face.x2 *= scale_x;
            face.y1 *= scale_y;
            face.y2 *= scale_y;
        }

        Ok(faces)
    }

    fn parse_detections(&self, outputs: &Vec<Value>) -> Result<Vec<FaceBox>> {
        let mut faces = Vec::new();

        if outputs.is_empty() {
            return Ok(faces);
        }

        // YOLOv8-style output: [1, 8400, 5] or transposed [1, 5, 8400],
        // each prediction [x_center, y_center, width, height, confidence].
        let output = outputs[0].try_extract::<f32>()?.view().to_owned();
        let shape = output.shape().to_vec();
        let values = match output.as_slice() {
            Some(values) => values,
            None => return Ok(faces),
        };

        let (num_predictions, prediction_length, is_transposed) = if shape.len() >= 3 {
            if shape[2] > shape[1] && shape[1] <= 10 {
                (shape[2], shape[1], true)
            } else {
                (shape[1], shape[2], false)
            }
        } else if shape.len() == 2 {
            (shape[0], shape[1], false)
        } else {
            tracing::warn!("Unexpected detector output shape: {:?}", shape);
            return Ok(faces);
        };

        let input_width = self.config.detector.input_width as f32;
        let input_height = self.config.detector.input_height as f32;

        for i in 0..num_predictions {
            let (x_center_raw, y_center_raw, width_raw, height_raw, confidence) = if is_transposed {
                let stride = num_predictions;
                (
                    values[i],
                    values[stride + i],
                    values[2 * stride + i],
                    values[3 * stride + i],
                    if prediction_length > 4 {
                        values[4 * stride + i]
                    } else {
                        0.0
                    },
                )
            } else {
                let base = i * prediction_length;
                (
                    values[base],
                    values[base + 1],
                    values[base + 2],
                    values[base + 3],
                    if prediction_length > 4 {
                        values[base + 4]
                    } else {
                        0.0
                    },
                )
            };

            if confidence <= 0.001 {
                continue;
            }

            // Some exports emit normalized coordinates, others pixel space.
            let scale = if x_center_raw > 1.0 || y_center_raw > 1.0 || width_raw > 1.0 {
                1.0
            } else {
                input_width
            };

            let x_center = x_center_raw * scale;
            let y_center = y_center_raw * scale;
            let width = width_raw * scale;
            let height = height_raw * scale;

            let x1 = (x_center - width / 2.0).max(0.0);
            let y1 = (y_center - height / 2.0).max(0.0);
            let x2 = (x_center + width / 2.0).min(input_width);
            let y2 = (y_center + height / 2.0).min(input_height);

            if x2 > x1 + MIN_BOX_SIDE && y2 > y1 + MIN_BOX_SIDE {
                faces.push(FaceBox {
                    x1,
                    y1,
                    x2,
                    y2,
                    confidence,
                });
            }
        }

        let mut faces = apply_nms(faces, NMS_IOU_THRESHOLD);
        faces.retain(|face| face.confidence >= self.config.detector.detection_confidence);
        faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(faces)
    }
}

/// Normalized 3-channel NCHW tensor, whatever the source channel count.
fn image_to_tensor(img: &DynamicImage) -> Array4<f32> {
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

fn apply_nms(mut boxes: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    if boxes.is_empty() {
        return boxes;
    }

    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep = Vec::new();
    let mut indices: Vec<usize> = (0..boxes.len()).collect();

    while let Some(&i) = indices.first() {
        keep.push(boxes[i].clone());
        indices = indices[1..]
            .iter()
            .filter(|&&j| iou(&boxes[i], &boxes[j]) < iou_threshold)
            .copied()
            .collect();
    }

    keep
}

fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width() * a.height() + b.width() * b.height() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
