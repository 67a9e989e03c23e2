//! Shared test utilities.
//!
//! Synthetic images are generated in memory so codec tests need no fixture
//! files. Pixel content is a deterministic gradient; only the dimensions and
//! color type matter to the tests.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let jpeg = synthetic_jpeg(200, 150);
//! let meta = RustCodec::new().inspect(&jpeg).unwrap();
//! assert_eq!(meta.width, Some(200));
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Synthetic images
// =========================================================================

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Opaque RGB gradient encoded as JPEG.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// RGBA gradient with varying alpha, encoded as PNG.
pub fn synthetic_png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(y % 256) as u8, (x % 256) as u8, 128, ((x * 7 + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

#[test]
fn synthetic_images_decode_to_requested_size() {
    let jpeg = image::load_from_memory(&synthetic_jpeg(33, 17)).unwrap();
    assert_eq!((jpeg.width(), jpeg.height()), (33, 17));

    let png = image::load_from_memory(&synthetic_png_rgba(5, 9)).unwrap();
    assert_eq!((png.width(), png.height()), (5, 9));
    assert!(png.color().has_alpha());
}
