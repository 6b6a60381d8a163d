use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::bilateral_filter;

use crate::error::Result;

// Fixed smoothing window, not configurable.
const BILATERAL_WINDOW: u32 = 5;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPATIAL: f32 = 75.0;

/// Load an image and produce its preprocessed variant.
///
/// Returns `(original, processed)`. The original is kept untouched for the
/// alignment and encoding stages; only the processed variant feeds detection.
pub fn load_and_process(
    path: &Path,
    grayscale: bool,
    bilateral: bool,
) -> Result<(DynamicImage, DynamicImage)> {
    let original = image::open(path)?;
    let processed = process_image(&original, grayscale, bilateral);
    Ok((original, processed))
}

/// Apply the preprocessing toggles to an already-decoded image.
pub fn process_image(img: &DynamicImage, grayscale: bool, bilateral: bool) -> DynamicImage {
    let processed = if grayscale {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else if matches!(
        img,
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_)
    ) {
        // Single-channel sources go back to three channels so detection
        // always sees a consistent channel count.
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img.clone()
    };

    if !bilateral {
        return processed;
    }

    match processed {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(bilateral_filter(
            &gray,
            BILATERAL_WINDOW,
            BILATERAL_SIGMA_COLOR,
            BILATERAL_SIGMA_SPATIAL,
        )),
        other => DynamicImage::ImageRgb8(bilateral_rgb(&other.to_rgb8())),
    }
}

/// Edge-preserving smoothing for color images, one channel at a time.
fn bilateral_rgb(img: &RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();

    let mut channels = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];
    for (x, y, pixel) in img.enumerate_pixels() {
        for (c, channel) in channels.iter_mut().enumerate() {
            channel.put_pixel(x, y, Luma([pixel[c]]));
        }
    }

    let filtered: Vec<GrayImage> = channels
        .iter()
        .map(|channel| {
            bilateral_filter(
                channel,
                BILATERAL_WINDOW,
                BILATERAL_SIGMA_COLOR,
                BILATERAL_SIGMA_SPATIAL,
            )
        })
        .collect();

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        *pixel = Rgb([
            filtered[0].get_pixel(x, y)[0],
            filtered[1].get_pixel(x, y)[0],
            filtered[2].get_pixel(x, y)[0],
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn grayscale_flag_produces_single_channel() {
        let processed = process_image(&gradient_rgb(32, 32), true, false);
        assert!(matches!(processed, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn gray_source_without_grayscale_flag_becomes_three_channel() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_fn(16, 16, |x, y| {
            Luma([((x * 16 + y) % 256) as u8])
        }));
        let processed = process_image(&gray, false, false);

        let rgb = match &processed {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => panic!("expected 3-channel output, got {:?}", other.color()),
        };

        // Visual content is unchanged: every channel carries the gray value.
        let source = gray.to_luma8();
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let v = source.get_pixel(x, y)[0];
            assert_eq!(pixel[0], v);
            assert_eq!(pixel[1], v);
            assert_eq!(pixel[2], v);
        }
    }

    #[test]
    fn color_source_without_flags_is_untouched() {
        let img = gradient_rgb(24, 24);
        let processed = process_image(&img, false, false);
        assert_eq!(processed.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn bilateral_preserves_dimensions_and_channels() {
        let processed = process_image(&gradient_rgb(20, 30), false, true);
        assert!(matches!(processed, DynamicImage::ImageRgb8(_)));
        assert_eq!((processed.width(), processed.height()), (20, 30));

        let gray_processed = process_image(&gradient_rgb(20, 30), true, true);
        assert!(matches!(gray_processed, DynamicImage::ImageLuma8(_)));
        assert_eq!((gray_processed.width(), gray_processed.height()), (20, 30));
    }

    #[test]
    fn bilateral_leaves_flat_image_flat() {
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([120, 80, 40])));
        let processed = process_image(&flat, false, true);
        let rgb = processed.to_rgb8();
        for pixel in rgb.pixels() {
            assert_eq!(pixel, &Rgb([120, 80, 40]));
        }
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let result = load_and_process(Path::new("/nonexistent/photo.jpg"), false, false);
        assert!(result.is_err());
    }
}
