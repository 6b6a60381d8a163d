use image::{DynamicImage, Rgb};
use imageproc::geometric_transformations::{rotate, Interpolation};

use crate::landmarks::Landmarks;

/// Rotation angle of the inter-eye line, in degrees. Zero means the eyes
/// are already horizontal.
pub fn eye_angle_degrees(landmarks: &Landmarks) -> f32 {
    let (lx, ly) = landmarks.left_eye_center();
    let (rx, ry) = landmarks.right_eye_center();
    (ry - ly).atan2(rx - lx).to_degrees()
}

/// Midpoint between the two eye centers, used as the rotation pivot.
pub fn eye_midpoint(landmarks: &Landmarks) -> (f32, f32) {
    let (lx, ly) = landmarks.left_eye_center();
    let (rx, ry) = landmarks.right_eye_center();
    ((lx + rx) / 2.0, (ly + ry) / 2.0)
}

/// Rigidly rotate the full image about the eye midpoint so the eyes end up
/// horizontal. Scale is fixed at 1.0 and the output keeps the input
/// dimensions; uncovered corners fill with black.
pub fn aligned_by_eyes(image: &DynamicImage, landmarks: &Landmarks) -> DynamicImage {
    let angle = eye_angle_degrees(landmarks);
    let pivot = eye_midpoint(landmarks);

    let rgb = image.to_rgb8();
    let rotated = rotate(
        &rgb,
        pivot,
        -angle.to_radians(),
        Interpolation::Bilinear,
        Rgb([0u8, 0, 0]),
    );
    DynamicImage::ImageRgb8(rotated)
}
