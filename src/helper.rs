use crate::error::{check_request, Result};
use crate::matrix::{BitMatrix, QrCodeEncoder, QrEncoder};
use crate::options::{RenderOptions, TRANSPARENT};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// An RGBA raster owned by the caller.
pub type Bitmap = RgbaImage;

/*---- Utilities ----*/

/// Maps a module matrix to a row-major pixel buffer, one pixel per cell.
pub fn matrix_to_pixels(matrix: &BitMatrix, dark: Rgba<u8>, light: Rgba<u8>) -> Vec<Rgba<u8>> {
    let width = matrix.width() as usize;
    (0..width * matrix.height() as usize)
        .map(|index| {
            let x = (index % width) as u32;
            let y = (index / width) as u32;
            if matrix.get(x, y) { dark } else { light }
        })
        .collect()
}

/// Builds a bitmap the size of `matrix`, dark cells in `dark`, the rest in `light`.
pub fn matrix_to_bitmap(matrix: &BitMatrix, dark: Rgba<u8>, light: Rgba<u8>) -> Bitmap {
    let pixels = matrix_to_pixels(matrix, dark, light);
    let mut img = Bitmap::new(matrix.width(), matrix.height());
    for (pixel, color) in img.pixels_mut().zip(pixels) {
        *pixel = color;
    }
    img
}

/// Creates a fully transparent `size_px` x `size_px` bitmap.
///
/// Used in place of a QR code that could not be generated. Negative sizes
/// yield an empty bitmap.
pub fn create_default_bitmap(size_px: i32) -> Bitmap {
    let size = size_px.max(0) as u32;
    Bitmap::from_pixel(size, size, TRANSPARENT)
}

/// Draws `logo` over the center of `qr`, shrunk by `logo_scale`.
///
/// The logo is skipped when shrinking leaves nothing to draw.
pub fn overlay_logo(qr: &mut Bitmap, logo: &Bitmap, logo_scale: u32) {
    let scale = logo_scale.max(1);
    let scaled_width = logo.width() / scale;
    let scaled_height = logo.height() / scale;
    if scaled_width == 0 || scaled_height == 0 {
        debug!("logo {}x{} vanishes at 1/{}, skipping overlay", logo.width(), logo.height(), scale);
        return;
    }

    let scaled = if scale == 1 {
        logo.clone()
    } else {
        imageops::resize(logo, scaled_width, scaled_height, FilterType::Triangle)
    };
    let x = (i64::from(qr.width()) - i64::from(scaled_width)) / 2;
    let y = (i64::from(qr.height()) - i64::from(scaled_height)) / 2;
    imageops::overlay(qr, &scaled, x, y);
}

/// Generates a QR code bitmap for `content` using the default encoder.
///
/// # Arguments
///
/// * `content` - The text to encode. Must not be empty.
/// * `size_px` - The requested width and height in pixels. Must be non-negative.
/// * `padding_px` - The quiet zone around the code. Must be non-negative.
///
/// # Returns
///
/// `Ok(None)` when the encoder cannot represent `content` (for example it is
/// too long). Callers usually show [`create_default_bitmap`] instead.
///
/// # Errors
///
/// Returns a [`crate::QrPaintError`] if a precondition does not hold.
///
/// # Example
///
/// ```
/// use qrpaint::helper::{create_default_bitmap, generate_qr_bitmap};
///
/// let bitmap = generate_qr_bitmap("Hello, World!", 300, 4)
///     .unwrap()
///     .unwrap_or_else(|| create_default_bitmap(300));
/// assert_eq!(bitmap.dimensions(), (300, 300));
/// ```
pub fn generate_qr_bitmap(content: &str, size_px: i32, padding_px: i32) -> Result<Option<Bitmap>> {
    generate_qr_bitmap_with(&QrCodeEncoder, content, size_px, padding_px, &RenderOptions::default())
}

/// Like [`generate_qr_bitmap`], with an explicit encoder and options.
pub fn generate_qr_bitmap_with(
    encoder: &dyn QrEncoder,
    content: &str,
    size_px: i32,
    padding_px: i32,
    options: &RenderOptions,
) -> Result<Option<Bitmap>> {
    check_request(content, size_px, padding_px)?;

    match encoder.encode(content, size_px, size_px, padding_px, options.ec_level) {
        Ok(matrix) => Ok(Some(matrix_to_bitmap(&matrix, options.dark, options.light))),
        Err(err) => {
            warn!("could not encode {} bytes as a QR code: {}", content.len(), err);
            Ok(None)
        }
    }
}

/// Generates a QR code bitmap with `logo` drawn over its center.
///
/// The logo is shrunk to an eighth of its size by default. The
/// error-correction level is left at `Low` unless raised through
/// [`generate_qr_bitmap_with_overlay_with`].
///
/// # Example
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use qrpaint::helper::generate_qr_bitmap_with_overlay;
///
/// let logo = RgbaImage::from_pixel(160, 160, Rgba([255, 0, 0, 255]));
/// let bitmap = generate_qr_bitmap_with_overlay("Hello, World!", &logo, 600, 0)
///     .unwrap()
///     .unwrap();
/// assert_eq!(bitmap.get_pixel(300, 300), &Rgba([255, 0, 0, 255]));
/// ```
pub fn generate_qr_bitmap_with_overlay(
    content: &str,
    logo: &Bitmap,
    size_px: i32,
    padding_px: i32,
) -> Result<Option<Bitmap>> {
    generate_qr_bitmap_with_overlay_with(
        &QrCodeEncoder,
        content,
        logo,
        size_px,
        padding_px,
        &RenderOptions::default(),
    )
}

/// Like [`generate_qr_bitmap_with_overlay`], with an explicit encoder and options.
pub fn generate_qr_bitmap_with_overlay_with(
    encoder: &dyn QrEncoder,
    content: &str,
    logo: &Bitmap,
    size_px: i32,
    padding_px: i32,
    options: &RenderOptions,
) -> Result<Option<Bitmap>> {
    let Some(mut qr) = generate_qr_bitmap_with(encoder, content, size_px, padding_px, options)? else {
        return Ok(None);
    };
    overlay_logo(&mut qr, logo, options.logo_scale);
    Ok(Some(qr))
}

/// Saves a bitmap as a PNG file.
///
/// # Arguments
///
/// * `bitmap` - The image to write.
/// * `directory_path` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The name of the image file, without extension. If not provided, a timestamp-based filename will be used.
///
/// # Errors
///
/// Returns a [`crate::QrPaintError`] if the directory cannot be created or the image cannot be encoded.
pub fn save_png(bitmap: &Bitmap, directory_path: Option<&str>, filename: Option<&str>) -> Result<PathBuf> {
    let directory_path = directory_path.unwrap_or("generated");
    let filename = match filename {
        Some(name) => name.to_string(),
        None => {
            let since_the_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            since_the_epoch.as_millis().to_string()
        }
    };

    // Check if the directory exists, create it if it doesn't
    if !Path::new(directory_path).exists() {
        fs::create_dir_all(directory_path)?;
    }

    let file_path = Path::new(directory_path).join(format!("{}.png", filename));
    bitmap.save(&file_path)?;
    Ok(file_path)
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QrPaintError;
    use crate::matrix::EncodeError;
    use crate::options::{QrCodeEcc, BLACK, WHITE};
    use std::sync::Mutex;

    struct FailingEncoder;

    impl QrEncoder for FailingEncoder {
        fn encode(&self, _: &str, _: i32, _: i32, _: i32, _: QrCodeEcc) -> std::result::Result<BitMatrix, EncodeError> {
            Err(EncodeError::Encoding(qrcode::types::QrError::DataTooLong))
        }
    }

    #[derive(Default)]
    struct RecordingEncoder {
        calls: Mutex<Vec<(i32, i32, i32, QrCodeEcc)>>,
    }

    impl QrEncoder for RecordingEncoder {
        fn encode(
            &self,
            content: &str,
            width: i32,
            height: i32,
            margin: i32,
            ec_level: QrCodeEcc,
        ) -> std::result::Result<BitMatrix, EncodeError> {
            self.calls.lock().unwrap().push((width, height, margin, ec_level));
            QrCodeEncoder.encode(content, width, height, margin, ec_level)
        }
    }

    #[test]
    fn test_matrix_to_pixels_is_row_major() {
        let mut matrix = BitMatrix::new(3, 2);
        matrix.set(2, 0);
        matrix.set(0, 1);
        let pixels = matrix_to_pixels(&matrix, BLACK, WHITE);
        assert_eq!(pixels, vec![WHITE, WHITE, BLACK, BLACK, WHITE, WHITE]);
    }

    #[test]
    fn test_generate_qr_bitmap() {
        let img = generate_qr_bitmap("Hello, world!", 150, 0).unwrap().unwrap();
        assert_eq!(img.dimensions(), (150, 150));
        assert!(img.pixels().all(|p| *p == BLACK || *p == WHITE));
        assert!(img.pixels().any(|p| *p == BLACK));
    }

    #[test]
    fn test_small_request_yields_natural_size() {
        // The code for "Hello, world!" at level Low is 21 modules wide;
        // with a padding of 4 the natural size is 29 pixels.
        let img = generate_qr_bitmap("Hello, world!", 0, 4).unwrap().unwrap();
        assert_eq!(img.dimensions(), (29, 29));
    }

    #[test]
    fn test_preconditions() {
        assert!(matches!(generate_qr_bitmap("", 100, 0), Err(QrPaintError::EmptyContent)));
        assert!(matches!(generate_qr_bitmap("a", -1, 0), Err(QrPaintError::NegativeSize(-1))));
        assert!(matches!(generate_qr_bitmap("a", 100, -1), Err(QrPaintError::NegativePadding(-1))));

        let logo = Bitmap::new(8, 8);
        assert!(matches!(
            generate_qr_bitmap_with_overlay("", &logo, 100, 0),
            Err(QrPaintError::EmptyContent)
        ));
    }

    #[test]
    fn test_precondition_failure_skips_encoder() {
        let encoder = RecordingEncoder::default();
        let result = generate_qr_bitmap_with(&encoder, "", 100, 0, &RenderOptions::default());
        assert!(result.is_err());
        assert!(encoder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_encoder_receives_request() {
        let encoder = RecordingEncoder::default();
        let options = RenderOptions::default().with_ec_level(QrCodeEcc::High);
        generate_qr_bitmap_with(&encoder, "abc", 120, 2, &options).unwrap();
        assert_eq!(*encoder.calls.lock().unwrap(), vec![(120, 120, 2, QrCodeEcc::High)]);
    }

    #[test]
    fn test_encoder_failure_yields_none() {
        let options = RenderOptions::default();
        assert!(generate_qr_bitmap_with(&FailingEncoder, "abc", 100, 0, &options).unwrap().is_none());
        let logo = Bitmap::new(80, 80);
        assert!(generate_qr_bitmap_with_overlay_with(&FailingEncoder, "abc", &logo, 100, 0, &options)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_too_long_content_yields_none() {
        let content = "x".repeat(4000);
        assert!(generate_qr_bitmap(&content, 100, 0).unwrap().is_none());
    }

    #[test]
    fn test_oversized_padding_yields_none() {
        assert!(generate_qr_bitmap("a", 10, i32::MAX).unwrap().is_none());
        let logo = Bitmap::new(80, 80);
        assert!(generate_qr_bitmap_with_overlay("a", &logo, 10, i32::MAX).unwrap().is_none());
        assert!(generate_qr_bitmap("a", i32::MAX, 0).unwrap().is_none());
    }

    #[test]
    fn test_create_default_bitmap() {
        let img = create_default_bitmap(42);
        assert_eq!(img.dimensions(), (42, 42));
        assert!(img.pixels().all(|p| *p == TRANSPARENT));
        assert_eq!(create_default_bitmap(-5).dimensions(), (0, 0));
    }

    #[test]
    fn test_overlay_centers_logo() {
        let red = Rgba([255, 0, 0, 255]);
        let logo = Bitmap::from_pixel(160, 160, red);
        let img = generate_qr_bitmap_with_overlay("Hello, world!", &logo, 600, 0).unwrap().unwrap();
        assert_eq!(img.dimensions(), (600, 600));
        // 160 / 8 = 20 px, placed at (600 - 20) / 2 = 290.
        assert_eq!(img.get_pixel(290, 290), &red);
        assert_eq!(img.get_pixel(309, 309), &red);
        assert_ne!(img.get_pixel(289, 300), &red);
        assert_ne!(img.get_pixel(310, 300), &red);
    }

    #[test]
    fn test_overlay_respects_logo_scale() {
        let blue = Rgba([0, 0, 255, 255]);
        let logo = Bitmap::from_pixel(40, 40, blue);
        let options = RenderOptions::default().with_logo_scale(2);
        let img = generate_qr_bitmap_with_overlay_with(&QrCodeEncoder, "Hello, world!", &logo, 200, 0, &options)
            .unwrap()
            .unwrap();
        let blue_pixels = img.pixels().filter(|p| **p == blue).count();
        assert_eq!(blue_pixels, 20 * 20);
    }

    #[test]
    fn test_tiny_logo_is_skipped() {
        let logo = Bitmap::from_pixel(7, 7, Rgba([255, 0, 0, 255]));
        let plain = generate_qr_bitmap("Hello, world!", 100, 0).unwrap().unwrap();
        let overlaid = generate_qr_bitmap_with_overlay("Hello, world!", &logo, 100, 0).unwrap().unwrap();
        assert_eq!(plain, overlaid);
    }

    #[test]
    fn test_transparent_logo_keeps_modules() {
        let logo = Bitmap::from_pixel(160, 160, TRANSPARENT);
        let plain = generate_qr_bitmap("Hello, world!", 600, 0).unwrap().unwrap();
        let overlaid = generate_qr_bitmap_with_overlay("Hello, world!", &logo, 600, 0).unwrap().unwrap();
        assert_eq!(plain, overlaid);
    }

    #[test]
    fn test_save_png() {
        let dir = std::env::temp_dir().join(format!("qrpaint-save-{}", std::process::id()));
        let dir = dir.to_str().unwrap().to_string();
        let img = generate_qr_bitmap("Hello, world!", 64, 1).unwrap().unwrap();
        let path = save_png(&img, Some(&dir), Some("qr")).unwrap();
        assert!(path.ends_with("qr.png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, img);
        fs::remove_dir_all(&dir).unwrap();
    }
}
