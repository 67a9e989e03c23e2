//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations the loader needs from
//! a codec: inspect and reencode. Both work on in-memory bytes; the loader
//! never touches the filesystem itself.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` and
//! `webp` crates.

use super::params::EncodeParams;
use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode {format}: {message}")]
    Encode { format: String, message: String },
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Format detected by inspecting the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Svg,
    /// A raster format with a decoder compiled in.
    Raster(ImageFormat),
    Unknown,
}

/// Result of an inspect operation.
///
/// Dimensions are optional because vector and unrecognized inputs may not
/// carry them. Raster inputs always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: DetectedFormat,
}

impl SourceMetadata {
    pub fn raster(format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            format: DetectedFormat::Raster(format),
        }
    }

    pub fn unknown() -> Self {
        Self {
            width: None,
            height: None,
            format: DetectedFormat::Unknown,
        }
    }

    /// Whether this input takes the resizing path.
    pub fn is_raster(&self) -> bool {
        matches!(self.format, DetectedFormat::Raster(_))
    }

    /// Marker used as the descriptor `type` for pass-through inputs.
    pub fn passthrough_type(&self) -> &'static str {
        match self.format {
            DetectedFormat::Svg => "svg",
            DetectedFormat::Raster(_) | DetectedFormat::Unknown => "undefined",
        }
    }
}

/// Trait for image codecs.
///
/// Implementations must be `Sync`: the loader calls [`reencode`](Self::reencode)
/// concurrently from rayon workers over the same immutable source bytes.
pub trait ImageCodec: Sync {
    /// Report intrinsic dimensions and detected format.
    ///
    /// Bytes in a format the codec does not recognize are not an error; they
    /// come back as [`DetectedFormat::Unknown`].
    fn inspect(&self, bytes: &[u8]) -> Result<SourceMetadata, CodecError>;

    /// Re-encode the full source to `params`. Deterministic for equal input.
    fn reencode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}
