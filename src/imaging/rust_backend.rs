//! Pure Rust codec built on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect format | `image::guess_format`, SVG via [`sniff_svg`](super::svg::sniff_svg) |
//! | Read dimensions | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline, 1x1 sampling on every component) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (defaults) |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |

use super::backend::{CodecError, DetectedFormat, ImageCodec, SourceMetadata};
use super::calculations::scaled_height;
use super::params::{ChromaSubsampling, EncodeOptions, EncodeParams};
use super::svg::sniff_svg;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Codec using the `image` crate for decoding and JPEG/PNG output, and the
/// `webp` crate for lossy WebP output.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the full source image.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, CodecError> {
    let format = image::guess_format(bytes)
        .map_err(|e| CodecError::Decode(format!("Unrecognized image data: {}", e)))?;
    if !is_supported_raster(format) {
        return Err(CodecError::UnsupportedFormat(format!("{:?}", format)));
    }
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CodecError::Decode(format!("Failed to decode {:?}: {}", format, e)))
}

/// Normalize to 8-bit RGB, or RGBA when the source carries alpha.
fn to_8bit(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

fn encode_error(format: &str, e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        format: format.to_string(),
        message: e.to_string(),
    }
}

fn encode_jpeg(
    img: &DynamicImage,
    quality: u32,
    chroma: ChromaSubsampling,
) -> Result<Vec<u8>, CodecError> {
    if chroma != ChromaSubsampling::Cs444 {
        return Err(CodecError::UnsupportedFormat(
            "JPEG chroma subsampling other than 4:4:4".into(),
        ));
    }
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| encode_error("jpeg", e))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    img.write_with_encoder(encoder)
        .map_err(|e| encode_error("png", e))?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, CodecError> {
    let encoder = webp::Encoder::from_image(img).map_err(|e| encode_error("webp", e))?;
    Ok(encoder.encode(quality as f32).to_vec())
}

impl ImageCodec for RustCodec {
    fn inspect(&self, bytes: &[u8]) -> Result<SourceMetadata, CodecError> {
        if let Some(svg) = sniff_svg(bytes) {
            return Ok(SourceMetadata {
                width: svg.width,
                height: svg.height,
                format: DetectedFormat::Svg,
            });
        }

        let format = match image::guess_format(bytes) {
            Ok(format) if is_supported_raster(format) => format,
            _ => return Ok(SourceMetadata::unknown()),
        };

        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| CodecError::Decode(format!("Failed to read dimensions: {}", e)))?;

        Ok(SourceMetadata::raster(format, width, height))
    }

    fn reencode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let img = load_image(bytes)?;
        let (src_w, src_h) = (img.width(), img.height());

        let resized = if params.width == src_w {
            img
        } else {
            let height = scaled_height((src_w, src_h), params.width);
            img.resize_exact(params.width, height, FilterType::Lanczos3)
        };
        let resized = to_8bit(resized);

        match params.options {
            EncodeOptions::Jpeg { quality, chroma } => {
                encode_jpeg(&resized, quality.value(), chroma)
            }
            EncodeOptions::Webp { quality } => encode_webp(&resized, quality.value()),
            EncodeOptions::Png => encode_png(&resized),
        }
    }
}

/// Returns `true` when `format` is one of the raster formats this codec decodes.
pub fn is_supported_raster(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::Tiff
            | ImageFormat::WebP
    ) && format.reading_enabled()
}
